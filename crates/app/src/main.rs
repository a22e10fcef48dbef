use std::fmt;
use std::path::PathBuf;

use kanji_core::model::{DisplayMode, KanjiRecord, KanjiStatus, QuizType, QuizTypeFilter};
use services::{AppServices, SheetSource};
use storage::repository::{CorpusRepository, PreferencesRepository};
use tracing_subscriber::EnvFilter;

mod quiz;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidQuizType { raw: String },
    InvalidStatus { raw: String },
    InvalidSeed { raw: String },
    MissingKanji,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidQuizType { raw } => write!(f, "invalid quiz type: {raw}"),
            ArgsError::InvalidStatus { raw } => write!(f, "invalid --status value: {raw}"),
            ArgsError::InvalidSeed { raw } => write!(f, "invalid --seed value: {raw}"),
            ArgsError::MissingKanji => write!(f, "mark requires a kanji"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- import [<file.xlsx|file.json>] [--db <sqlite_url>] [--default-sheet <url-or-path>]");
    eprintln!("  cargo run -p app -- list   [--db <sqlite_url>] [--status new|updated|existing]");
    eprintln!("  cargo run -p app -- stats  [--db <sqlite_url>]");
    eprintln!("  cargo run -p app -- mark   <kanji> [--db <sqlite_url>]");
    eprintln!("  cargo run -p app -- quiz   [--db <sqlite_url>] [--order] [--types existing,updated,new,learned,marked] [--seed <n>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://kanji.sqlite3");
    eprintln!("  --default-sheet {}", services::DEFAULT_SHEET);
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  KANJI_DB_URL, KANJI_DEFAULT_SHEET, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Import,
    List,
    Stats,
    Mark,
    Quiz,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "import" => Some(Self::Import),
            "list" => Some(Self::List),
            "stats" => Some(Self::Stats),
            "mark" => Some(Self::Mark),
            "quiz" => Some(Self::Quiz),
            _ => None,
        }
    }
}

struct Args {
    db_url: String,
    default_sheet: SheetSource,
    positional: Option<String>,
    status: Option<KanjiStatus>,
    mode: DisplayMode,
    types: QuizTypeFilter,
    seed: Option<u64>,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("KANJI_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://kanji.sqlite3".into(), normalize_sqlite_url);
        let mut default_sheet = std::env::var("KANJI_DEFAULT_SHEET")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map_or_else(SheetSource::default, |value| SheetSource::parse(&value));
        let mut positional = None;
        let mut status = None;
        let mut mode = DisplayMode::Random;
        let mut types = QuizTypeFilter::default();
        let mut seed = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--default-sheet" => {
                    let value = require_value(args, "--default-sheet")?;
                    default_sheet = SheetSource::parse(&value);
                }
                "--status" => {
                    let value = require_value(args, "--status")?;
                    let parsed = value
                        .parse::<KanjiStatus>()
                        .map_err(|_| ArgsError::InvalidStatus { raw: value.clone() })?;
                    status = Some(parsed);
                }
                "--order" => mode = DisplayMode::Order,
                "--types" => {
                    let value = require_value(args, "--types")?;
                    types = parse_types(&value)?;
                }
                "--seed" => {
                    let value = require_value(args, "--seed")?;
                    let parsed: u64 = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidSeed { raw: value.clone() })?;
                    seed = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ if !arg.starts_with("--") && positional.is_none() => positional = Some(arg),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            default_sheet,
            positional,
            status,
            mode,
            types,
            seed,
        })
    }
}

fn parse_types(raw: &str) -> Result<QuizTypeFilter, ArgsError> {
    let mut selected = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|name| !name.is_empty()) {
        let ty = QuizType::parse(name).ok_or_else(|| ArgsError::InvalidQuizType {
            raw: name.to_string(),
        })?;
        selected.push(ty);
    }
    Ok(QuizTypeFilter::only(&selected))
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn format_record(record: &KanjiRecord, marked: bool) -> String {
    format!(
        "{}{}  {}  kun: {}  on: {}  [{}]",
        if marked { "★ " } else { "" },
        record.kanji,
        record.hanviet.join("、"),
        record.kun.join("、"),
        record.on.join("、"),
        record.status
    )
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Default behavior: start a quiz when no subcommand is provided.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Quiz,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Quiz,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let parsed = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    init_tracing();

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&parsed.db_url)?;
    let app = AppServices::new_sqlite(&parsed.db_url, parsed.default_sheet.clone()).await?;
    tracing::debug!(db = %parsed.db_url, sheet = %parsed.default_sheet, ?cmd, "storage ready");

    match cmd {
        Command::Import => {
            let importer = app.import();
            let report = match parsed.positional.as_deref() {
                Some(file) => importer.import_file(&PathBuf::from(file)).await?,
                None => importer.import_default().await?,
            };
            println!("Imported {report}");
            Ok(())
        }
        Command::List => {
            let corpus = app.storage().corpus.load_corpus().await?;
            let marked = app.storage().preferences.marked_words().await?;
            for record in corpus
                .iter()
                .filter(|r| parsed.status.is_none_or(|status| r.status == status))
            {
                println!("{}", format_record(record, marked.contains(&record.kanji)));
            }
            Ok(())
        }
        Command::Stats => {
            let session = app.quiz_loop().open_session().await?;
            let counts = session.counts();
            println!("total:    {}", counts.total);
            println!("new:      {}", counts.new);
            println!("updated:  {}", counts.updated);
            println!("existing: {}", counts.existing);
            println!("learned:  {}", counts.learned);
            println!("marked:   {}", counts.marked);
            Ok(())
        }
        Command::Mark => {
            let kanji = parsed
                .positional
                .as_deref()
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .ok_or(ArgsError::MissingKanji)?;
            let marked = app.quiz_loop().toggle_marked_word(kanji).await?;
            println!("{kanji}: {}", if marked { "marked" } else { "unmarked" });
            Ok(())
        }
        Command::Quiz => {
            let quiz_loop = app.quiz_loop();
            let quiz_loop = match parsed.seed {
                Some(seed) => quiz_loop.as_ref().clone().with_seed(seed),
                None => quiz_loop.as_ref().clone(),
            };
            let mut session = quiz_loop.open_session().await?;
            session.set_mode(parsed.mode);
            session.set_types(parsed.types);
            quiz::run(&quiz_loop, session).await
        }
    }
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
