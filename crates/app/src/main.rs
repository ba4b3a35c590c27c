use std::fmt;
use std::sync::Arc;

use quiz_core::model::{AnswerId, Quiz};
use quiz_core::share_link::ShareLink;
use services::{QuizOutcome, QuizService};
use storage::repository::Storage;
use tracing::info;
use url::Url;

mod bank;

const DEFAULT_BASE_URL: &str = "https://example.com/quiz";

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidBaseUrl { raw: String },
    InvalidPicks { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidBaseUrl { raw } => write!(f, "invalid --base-url value: {raw}"),
            ArgsError::InvalidPicks { raw } => {
                write!(f, "invalid picks (expected comma-separated option numbers): {raw}")
            }
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
    eprintln!("  cargo run -p app -- solo [--db <sqlite_url>] [--picks <n,n,..>]");
    eprintln!(
        "  cargo run -p app -- duo  [--db <sqlite_url>] [--base-url <url>] [--picks <n,..>] [--guest-picks <n,..>]"
    );
    eprintln!();
    eprintln!("Picks are 1-based option numbers, repeated when shorter than the quiz.");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db         (in-memory)");
    eprintln!("  --base-url   {DEFAULT_BASE_URL}");
    eprintln!("  --picks      1,2");
    eprintln!("  --guest-picks 4,3");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_BASE_URL, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Solo,
    Duo,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "solo" => Some(Self::Solo),
            "duo" => Some(Self::Duo),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Args {
    db_url: Option<String>,
    base_url: Url,
    picks: Vec<usize>,
    guest_picks: Vec<usize>,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("QUIZ_DB_URL")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(normalize_sqlite_url);
        let mut base_url = match std::env::var("QUIZ_BASE_URL") {
            Ok(raw) => parse_base_url(raw)?,
            Err(_) => parse_base_url(DEFAULT_BASE_URL.to_string())?,
        };
        let mut picks = vec![0, 1];
        let mut guest_picks = vec![3, 2];

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = Some(normalize_sqlite_url(value));
                }
                "--base-url" => {
                    base_url = parse_base_url(require_value(args, "--base-url")?)?;
                }
                "--picks" => picks = parse_picks(&require_value(args, "--picks")?)?,
                "--guest-picks" => {
                    guest_picks = parse_picks(&require_value(args, "--guest-picks")?)?;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            base_url,
            picks,
            guest_picks,
        })
    }
}

fn parse_base_url(raw: String) -> Result<Url, ArgsError> {
    Url::parse(raw.trim()).map_err(|_| ArgsError::InvalidBaseUrl { raw })
}

/// `"1,3,2"` -> zero-based option indices `[0, 2, 1]`.
fn parse_picks(raw: &str) -> Result<Vec<usize>, ArgsError> {
    let invalid = || ArgsError::InvalidPicks {
        raw: raw.to_string(),
    };
    let picks = raw
        .split(',')
        .map(|part| match part.trim().parse::<usize>() {
            Ok(n) if n >= 1 => Ok(n - 1),
            _ => Err(invalid()),
        })
        .collect::<Result<Vec<_>, _>>()?;
    if picks.is_empty() {
        return Err(invalid());
    }
    Ok(picks)
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
    format!("sqlite://{}?mode=rwc", absolute.display())
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

async fn open_storage(db_url: Option<&str>) -> Result<Storage, Box<dyn std::error::Error>> {
    let Some(db_url) = db_url else {
        return Ok(Storage::in_memory());
    };
    prepare_sqlite_file(db_url)?;
    let storage = Storage::sqlite(db_url).await?;
    info!(db_url, "sqlite session store ready");
    Ok(storage)
}

/// Answer id for question `index`, cycling through `picks`.
fn pick(quiz: &Quiz, index: usize, picks: &[usize]) -> Result<AnswerId, ArgsError> {
    let invalid = || ArgsError::InvalidPicks {
        raw: picks
            .iter()
            .map(|p| (p + 1).to_string())
            .collect::<Vec<_>>()
            .join(","),
    };
    let choice = picks.get(index % picks.len().max(1)).ok_or_else(invalid)?;
    quiz.question(index)
        .and_then(|q| q.options.get(*choice))
        .map(|o| o.id)
        .ok_or_else(invalid)
}

fn print_outcome(label: &str, outcome: &QuizOutcome) {
    let own = &outcome.own;
    println!(
        "[{label}] {} (discipline {}, security {}, horizon {})",
        own.archetype.title(),
        own.axes.discipline,
        own.axes.security,
        own.axes.horizon
    );
    if let Some(insight) = outcome.insight {
        println!(
            "[{label}] together: {} ({}% compatible)",
            insight.title, insight.compatibility_score
        );
        println!("[{label}]   {}", insight.description);
        for tip in insight.tips {
            println!("[{label}]   - {tip}");
        }
    }
}

async fn run_solo(
    storage: &Storage,
    quiz: Arc<Quiz>,
    args: &Args,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut service = QuizService::new(Arc::clone(&quiz), storage);
    service.on_result(|outcome| print_outcome("solo", outcome));
    service.start_solo()?;

    for index in 0..quiz.len() {
        service.submit_answer(pick(&quiz, index, &args.picks)?).await?;
    }
    Ok(())
}

async fn run_duo(
    storage: &Storage,
    quiz: Arc<Quiz>,
    args: &Args,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut host = QuizService::new(Arc::clone(&quiz), storage);
    let mut guest = QuizService::new(Arc::clone(&quiz), storage);
    host.on_result(|outcome| print_outcome("host", outcome));
    guest.on_result(|outcome| print_outcome("guest", outcome));

    host.start_multiplayer_as_host().await?;
    let link = host.share_link(&args.base_url)?;
    println!("share link: {link}");

    let received = ShareLink::parse(link.as_str())?;
    let report = guest
        .join_multiplayer_as_guest(received.session_id())
        .await?;
    info!(session_id = %report.session_id, "guest joined");
    host.drain_remote()?;

    for index in 0..quiz.len() {
        host.submit_answer(pick(&quiz, index, &args.picks)?).await?;
        guest.drain_remote()?;
        guest
            .submit_answer(pick(&quiz, index, &args.guest_picks)?)
            .await?;
        host.drain_remote()?;
    }

    host.leave();
    guest.leave();
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Default behavior: solo quiz when no subcommand is provided.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Solo,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Solo,
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

    let quiz = Arc::new(bank::demo_quiz()?);
    let storage = open_storage(parsed.db_url.as_deref()).await?;

    match cmd {
        Command::Solo => run_solo(&storage, quiz, &parsed).await,
        Command::Duo => run_duo(&storage, quiz, &parsed).await,
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_are_one_based() {
        assert_eq!(parse_picks("1, 3,2").unwrap(), vec![0, 2, 1]);
        assert!(parse_picks("0").is_err());
        assert!(parse_picks("a,b").is_err());
        assert!(parse_picks("").is_err());
    }

    #[test]
    fn picks_cycle_over_questions() {
        let quiz = bank::demo_quiz().unwrap();
        let first = pick(&quiz, 0, &[1]).unwrap();
        assert_eq!(first, quiz.questions()[0].options[1].id);
        let later = pick(&quiz, 3, &[0, 2]).unwrap();
        assert_eq!(later, quiz.questions()[3].options[2].id);
        assert!(pick(&quiz, 0, &[9]).is_err());
    }

    #[test]
    fn sqlite_urls_are_normalized() {
        assert_eq!(normalize_sqlite_url("sqlite::memory:".into()), "sqlite::memory:");
        assert_eq!(
            normalize_sqlite_url("sqlite:///tmp/quiz.db".into()),
            "sqlite:///tmp/quiz.db"
        );
        assert_eq!(
            normalize_sqlite_url("/tmp/quiz.db".into()),
            "sqlite:///tmp/quiz.db?mode=rwc"
        );
    }

    #[tokio::test]
    async fn duo_runs_against_in_memory_storage() {
        let args = Args {
            db_url: None,
            base_url: Url::parse(DEFAULT_BASE_URL).unwrap(),
            picks: vec![0],
            guest_picks: vec![1],
        };
        let quiz = Arc::new(bank::demo_quiz().unwrap());
        run_duo(&Storage::in_memory(), quiz, &args).await.unwrap();
    }
}
