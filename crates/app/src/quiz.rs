//! Terminal front end for a quiz session.
//!
//! Answers are typed line by line; lines starting with `:` are commands.

use std::io::Write as _;

use kanji_core::model::{AnswerBuffer, Correctness, KanjiRecord, ReadingField, SkipFields};
use services::{QuizError, QuizLoopService, QuizSession, QuizView};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

type Input = Lines<BufReader<Stdin>>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum QuizCommand {
    Next,
    Previous,
    Mark,
    Skip(ReadingField),
    Romaji(ReadingField),
    Quit,
    Help,
}

fn parse_field(raw: &str) -> Option<ReadingField> {
    match raw.trim() {
        "hanviet" | "hv" => Some(ReadingField::Hanviet),
        "kun" => Some(ReadingField::Kun),
        "on" => Some(ReadingField::On),
        _ => None,
    }
}

fn parse_command(line: &str) -> Option<QuizCommand> {
    let line = line.trim();
    let line = line.strip_prefix(':').unwrap_or(line);
    let (head, rest) = line.split_once(' ').unwrap_or((line, ""));
    match head {
        "" | "n" | "next" => Some(QuizCommand::Next),
        "p" | "prev" | "previous" => Some(QuizCommand::Previous),
        "m" | "mark" => Some(QuizCommand::Mark),
        "s" | "skip" => parse_field(rest).map(QuizCommand::Skip),
        "r" | "romaji" => parse_field(rest).map(QuizCommand::Romaji),
        "q" | "quit" => Some(QuizCommand::Quit),
        "h" | "help" | "?" => Some(QuizCommand::Help),
        _ => None,
    }
}

fn normalize(answer: &str) -> String {
    answer.trim().to_lowercase()
}

/// Every expected reading must be answered once; order does not matter.
fn readings_match(expected: &[String], answers: &[String]) -> bool {
    let mut remaining: Vec<String> = expected.iter().map(|r| normalize(r)).collect();
    for answer in answers {
        let answer = normalize(answer);
        match remaining.iter().position(|r| *r == answer) {
            Some(pos) => {
                remaining.swap_remove(pos);
            }
            None => return false,
        }
    }
    remaining.is_empty()
}

/// Compare typed answers with the record. Skipped fields count as correct.
pub(crate) fn evaluate(record: &KanjiRecord, answers: &AnswerBuffer, skip: SkipFields) -> Correctness {
    let hanviet = skip.hanviet
        || !record.has_hanviet()
        || record
            .hanviet
            .iter()
            .any(|hv| normalize(hv) == normalize(&answers.hanviet));
    Correctness {
        hanviet,
        kun: skip.kun || readings_match(&record.kun, &answers.kun),
        on: skip.on || readings_match(&record.on, &answers.on),
    }
}

fn prompt(text: &str) {
    print!("{text}");
    let _ = std::io::stdout().flush();
}

fn print_help() {
    println!("commands: :n next, :p previous, :m mark, :s <hanviet|kun|on> skip, :r <kun|on> romaji, :q quit");
}

fn print_header(view: &QuizView) {
    println!();
    let position = view
        .position
        .map_or_else(String::new, |pos| format!(" {pos}/{}", view.plan_len));
    println!(
        "{}{}{}",
        if view.is_marked { "★ " } else { "" },
        view.record.kanji,
        position
    );
    for example in view.record.visible_examples() {
        match &example.phonetic {
            Some(ruby) => println!("  {} ({ruby})", example.text),
            None => println!("  {}", example.text),
        }
    }
}

fn print_result(view: &QuizView) {
    let verdict = |ok: bool| if ok { "✓" } else { "✗" };
    let record = &view.record;
    if !view.skip.hanviet {
        println!("  hanviet {} {}", verdict(view.correctness.hanviet), record.hanviet.join("、"));
    }
    if !view.skip.kun {
        println!("  kun     {} {}", verdict(view.correctness.kun), record.kun.join("、"));
    }
    if !view.skip.on {
        println!("  on      {} {}", verdict(view.correctness.on), record.on.join("、"));
    }
}

enum Step {
    Answered,
    Command(QuizCommand),
    Eof,
}

/// Collect answers for every field that is not skipped. A command typed instead of an
/// answer abandons the collection.
async fn collect_answers(
    session: &mut QuizSession,
    input: &mut Input,
) -> Result<Step, Box<dyn std::error::Error>> {
    let Some(view) = session.view() else {
        return Ok(Step::Eof);
    };

    let mut slots = Vec::new();
    if !view.skip.hanviet && view.record.has_hanviet() {
        slots.push((ReadingField::Hanviet, 0, 1));
    }
    for field in [ReadingField::Kun, ReadingField::On] {
        if view.skip.is_skipped(field) {
            continue;
        }
        let count = view.answers.slots(field);
        slots.extend((0..count).map(|index| (field, index, count)));
    }

    for (field, index, count) in slots {
        let romaji = if view.romaji.is_romaji(field) { " (romaji)" } else { "" };
        if count > 1 {
            prompt(&format!("{field}{romaji} [{}/{count}]> ", index + 1));
        } else {
            prompt(&format!("{field}{romaji}> "));
        }
        let Some(line) = input.next_line().await? else {
            return Ok(Step::Eof);
        };
        if line.trim_start().starts_with(':') {
            return Ok(match parse_command(&line) {
                Some(command) => Step::Command(command),
                None => Step::Command(QuizCommand::Help),
            });
        }
        session.set_reading_answer(field, index, line.trim())?;
    }
    Ok(Step::Answered)
}

/// Apply one command. Returns false when the loop should stop.
async fn apply(
    service: &QuizLoopService,
    session: &mut QuizSession,
    command: QuizCommand,
) -> Result<bool, Box<dyn std::error::Error>> {
    match command {
        QuizCommand::Next => {
            session.next()?;
        }
        QuizCommand::Previous => match session.previous() {
            Ok(_) => {}
            Err(QuizError::NoPrevious) => println!("no previous kanji"),
            Err(err) => return Err(err.into()),
        },
        QuizCommand::Mark => {
            let marked = service.toggle_mark(session).await?;
            println!("{}", if marked { "marked" } else { "unmarked" });
        }
        QuizCommand::Skip(field) => {
            let skipped = !session.skip_fields().is_skipped(field);
            service.set_skip(session, field, skipped).await?;
            println!("{field}: {}", if skipped { "skipped" } else { "asked" });
        }
        QuizCommand::Romaji(field) => {
            let romaji = !session.romaji_mode().is_romaji(field);
            if service.set_romaji(session, field, romaji).await? {
                println!("{field}: {}", if romaji { "romaji" } else { "kana" });
            } else {
                println!("{field} has no romaji mode");
            }
        }
        QuizCommand::Help => print_help(),
        QuizCommand::Quit => return Ok(false),
    }
    Ok(true)
}

/// Run the session until the user quits or stdin closes.
///
/// # Errors
///
/// Returns storage and I/O errors; an empty selection is reported and ends the quiz.
pub async fn run(
    service: &QuizLoopService,
    mut session: QuizSession,
) -> Result<(), Box<dyn std::error::Error>> {
    match session.start() {
        Ok(_) => {}
        Err(QuizError::EmptySelection) => {
            println!("No kanji match the selected quiz types.");
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    }
    if let Some(plan) = session.plan() {
        println!("{} kanji selected.", plan.len());
    }
    print_help();

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let Some(view) = session.view() else {
            break;
        };
        print_header(&view);

        if !view.show_result {
            match collect_answers(&mut session, &mut input).await? {
                Step::Eof => break,
                Step::Command(command) => {
                    if !apply(service, &mut session, command).await? {
                        break;
                    }
                    continue;
                }
                Step::Answered => {}
            }
            let correctness = session
                .current()
                .zip(session.answers())
                .map(|(record, answers)| evaluate(record, answers, session.skip_fields()));
            if let Some(correctness) = correctness {
                session.record_evaluation(correctness)?;
            }
            if let Some(view) = session.view() {
                print_result(&view);
            }
        }

        prompt("> ");
        let Some(line) = input.next_line().await? else {
            break;
        };
        let Some(command) = parse_command(&line) else {
            print_help();
            continue;
        };
        if !apply(service, &mut session, command).await? {
            break;
        }
    }

    session.configure();
    Ok(())
}
