use std::fmt;
use std::path::PathBuf;

use log::{info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};

use quiz_core::countdown::TimeUrgency;
use quiz_core::model::{QuizSettings, QuizSettingsDraft, ResultRecord};
use services::quiz::export_text;
use services::{Clock, QuizServices, QuizSession};
use storage::bank::load_bank_file;

mod command;

use command::Command;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidNumber { flag: &'static str, raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
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

fn parse_number<T: std::str::FromStr>(flag: &'static str, raw: String) -> Result<T, ArgsError> {
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidNumber { flag, raw })
}

struct Args {
    db_url: String,
    bank_path: PathBuf,
    settings: QuizSettingsDraft,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [--db <sqlite_url>] [--bank <questions.json>]");
    eprintln!("                      [--sample-size <n>] [--total-seconds <n>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:quiz.sqlite3");
    eprintln!("  --bank questions.json");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_BANK_PATH, QUIZ_SAMPLE_SIZE, QUIZ_TOTAL_SECONDS, RUST_LOG");
}

impl Args {
    /// Parse CLI arguments on top of the `QUIZ_*` variables returned by `env`.
    fn parse(
        args: &mut impl Iterator<Item = String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ArgsError> {
        let mut db_url = env("QUIZ_DB_URL").map_or_else(
            || normalize_sqlite_url("sqlite:quiz.sqlite3".into()),
            normalize_sqlite_url,
        );
        let mut bank_path =
            env("QUIZ_BANK_PATH").map_or_else(|| PathBuf::from("questions.json"), PathBuf::from);
        let mut settings = QuizSettingsDraft {
            sample_size: env("QUIZ_SAMPLE_SIZE")
                .map(|raw| parse_number("QUIZ_SAMPLE_SIZE", raw))
                .transpose()?,
            total_seconds: env("QUIZ_TOTAL_SECONDS")
                .map(|raw| parse_number("QUIZ_TOTAL_SECONDS", raw))
                .transpose()?,
            ..QuizSettingsDraft::default()
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--bank" => {
                    bank_path = PathBuf::from(require_value(args, "--bank")?);
                }
                "--sample-size" => {
                    let value = require_value(args, "--sample-size")?;
                    settings.sample_size = Some(parse_number("--sample-size", value)?);
                }
                "--total-seconds" => {
                    let value = require_value(args, "--total-seconds")?;
                    settings.total_seconds = Some(parse_number("--total-seconds", value)?);
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
            bank_path,
            settings,
        })
    }
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
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
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

//
// ─── RENDERING ─────────────────────────────────────────────────────────────────
//

fn print_help() {
    println!("Commands:");
    println!("  answer <n> <value>   record the answer for question n");
    println!("  status               show the timer and the questions");
    println!("  submit               finish and score the quiz");
    println!("  review               show correct answers after submitting");
    println!("  retry                same questions, fresh attempt");
    println!("  new                  new random questions, fresh attempt");
    println!("  shuffle              redraw questions, keep the clock running");
    println!("  history              recent scores");
    println!("  quit");
}

fn print_clock(session: &QuizSession) {
    let reading = session.reading();
    let marker = match reading.urgency {
        TimeUrgency::Calm => "",
        TimeUrgency::Low => " (hurry)",
        TimeUrgency::Critical => " (almost out of time!)",
    };
    println!(
        "time left {}{marker} | unanswered {} of {}",
        reading.clock_face(),
        session.unanswered_count(),
        session.selected().len()
    );
    if reading.warning {
        println!("less than {} minutes remain", session.settings().warning_minutes());
    }
}

fn print_status(session: &QuizSession) {
    print_clock(session);
    for (position, entry) in session.selected().iter().enumerate() {
        let answer = session
            .answers()
            .get(&position)
            .map_or(String::new(), |value| format!(" -> {value}"));
        println!("{:>3}. {}{answer}", position + 1, entry.question().prompt());
        println!("     [{}]", entry.displayed_options().join(" | "));
    }
}

fn print_result(record: &ResultRecord) {
    println!(
        "score {}% ({} of {} correct) in {}s",
        record.score_percent, record.correct_count, record.total_questions, record.elapsed_seconds
    );
}

fn print_review(session: &QuizSession) {
    if !session.state().is_submitted() {
        println!("submit first to see the review");
        return;
    }
    let items = session.review();
    let correct = items.iter().filter(|item| item.is_correct).count();
    print!("{}", export_text(&items));
    println!("{correct} of {} correct", items.len());
}

//
// ─── LOOP ──────────────────────────────────────────────────────────────────────
//

async fn handle(
    services: &QuizServices,
    session: &mut QuizSession,
    command: Command,
) -> Result<bool, Box<dyn std::error::Error>> {
    match command {
        Command::Answer { number, value } => match session.record_answer(number - 1, value).await
        {
            Ok(()) => print_clock(session),
            Err(err) => println!("{err}"),
        },
        Command::Submit => print_result(&session.submit().await?),
        Command::Retry => {
            session.retry_same().await?;
            print_status(session);
        }
        Command::New => {
            session.new_test().await?;
            print_status(session);
        }
        Command::Shuffle => match session.shuffle_questions().await {
            Ok(()) => print_status(session),
            Err(err) => println!("{err}"),
        },
        Command::Status => {
            print_status(session);
            if let Some(record) = session.result() {
                print_result(record);
            }
        }
        Command::Review => print_review(session),
        Command::History => {
            for record in services.history().recent().await? {
                print!("{} ", record.timestamp.format("%Y-%m-%d %H:%M"));
                print_result(&record);
            }
        }
        Command::Help => print_help(),
        Command::Quit => return Ok(false),
    }
    Ok(true)
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let parsed = Args::parse(&mut argv, |key| std::env::var(key).ok()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    let settings: QuizSettings = parsed.settings.validate()?;

    let bank = load_bank_file(&parsed.bank_path)?;
    prepare_sqlite_file(&parsed.db_url)?;
    let services = QuizServices::new_sqlite(&parsed.db_url, bank, settings, Clock::system()).await?;
    info!("using database {}", parsed.db_url);

    let mut session = services.open_session().await?;
    if session.bank().is_empty() {
        warn!("the question bank is empty");
    }
    session.start_timer()?;
    print_help();
    print_status(&session);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match Command::parse(&line) {
                    Ok(command) => {
                        if !handle(&services, &mut session, command).await? {
                            break;
                        }
                    }
                    Err(err) => println!("{err}"),
                }
            }
            Some(_) = session.next_tick(), if session.has_active_timer() => {
                let report = session.tick().await?;
                if let Some(record) = report.auto_submitted {
                    println!("time is up");
                    print_result(&record);
                } else if report.reading.seconds == 0 {
                    print_clock(&session);
                }
            }
        }
    }

    session.cancel_timer();
    Ok(())
}

#[tokio::main]
async fn main() {
    pretty_env_logger::init();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn parse_with(args: &[&str], vars: &[(&str, &str)]) -> Result<Args, ArgsError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        let mut args = args.iter().map(|arg| (*arg).to_string());
        Args::parse(&mut args, |key| vars.get(key).cloned())
    }

    #[test]
    fn unparsable_env_numbers_are_argument_errors() {
        let err = parse_with(&[], &[("QUIZ_SAMPLE_SIZE", "fifty")]).err().unwrap();
        assert!(matches!(
            err,
            ArgsError::InvalidNumber {
                flag: "QUIZ_SAMPLE_SIZE",
                ..
            }
        ));

        let err = parse_with(&[], &[("QUIZ_TOTAL_SECONDS", "-1")]).err().unwrap();
        assert!(matches!(
            err,
            ArgsError::InvalidNumber {
                flag: "QUIZ_TOTAL_SECONDS",
                ..
            }
        ));
    }

    #[test]
    fn env_numbers_apply_and_flags_override_them() {
        let parsed = parse_with(
            &["--total-seconds", "90", "--bank", "bank.json", "--db", "sqlite::memory:"],
            &[("QUIZ_SAMPLE_SIZE", " 20 "), ("QUIZ_TOTAL_SECONDS", "600")],
        )
        .unwrap();
        assert_eq!(parsed.settings.sample_size, Some(20));
        assert_eq!(parsed.settings.total_seconds, Some(90));
        assert_eq!(parsed.bank_path, PathBuf::from("bank.json"));
        assert_eq!(parsed.db_url, "sqlite::memory:");
    }

    #[test]
    fn bad_flag_values_are_rejected() {
        assert!(matches!(
            parse_with(&["--sample-size", "x"], &[]).err().unwrap(),
            ArgsError::InvalidNumber { flag: "--sample-size", .. }
        ));
        assert!(matches!(
            parse_with(&["--db"], &[]).err().unwrap(),
            ArgsError::MissingValue { flag: "--db" }
        ));
        assert!(matches!(
            parse_with(&["--verbose"], &[]).err().unwrap(),
            ArgsError::UnknownArg(_)
        ));
    }
}
