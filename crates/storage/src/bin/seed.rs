use std::fmt;

use log::info;
use quiz_core::model::{CourseCode, OptionLabel, Question, QuestionId};
use storage::repository::Storage;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    copies: u32,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidCopies { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidCopies { raw } => write!(f, "invalid --copies value: {raw}"),
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

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("QUIZ_DB_URL").unwrap_or_else(|_| "sqlite:dev.sqlite3?mode=rwc".into());
        let mut copies = std::env::var("QUIZ_SEED_COPIES")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(6);

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--copies" => {
                    let value = require_value(&mut args, "--copies")?;
                    copies = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidCopies { raw: value.clone() })?;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self { db_url, copies })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>   SQLite URL (default: sqlite:dev.sqlite3?mode=rwc)");
    eprintln!("  --copies <n>        Numbered variants per sample question (default: 6)");
    eprintln!("  -h, --help          Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  QUIZ_DB_URL, QUIZ_SEED_COPIES");
}

struct Sample {
    course: &'static str,
    topic: &'static str,
    difficulty: &'static str,
    text: &'static str,
    options: [&'static str; 4],
    correct: OptionLabel,
}

const SAMPLES: &[Sample] = &[
    Sample {
        course: "IFT212.2",
        topic: "Flip-Flops (SR, D, JK, T)",
        difficulty: "easy",
        text: "Which flip-flop has an invalid state when both inputs are 1?",
        options: ["SR", "D", "JK", "T"],
        correct: OptionLabel::A,
    },
    Sample {
        course: "IFT212.2",
        topic: "Flip-Flops (SR, D, JK, T)",
        difficulty: "medium",
        text: "A JK flip-flop with J = K = 1 behaves like which flip-flop?",
        options: ["SR", "D", "T", "Latch"],
        correct: OptionLabel::C,
    },
    Sample {
        course: "IFT212.2",
        topic: "Modulation & Demodulation",
        difficulty: "easy",
        text: "Which modulation varies the carrier amplitude?",
        options: ["FM", "PM", "AM", "PCM"],
        correct: OptionLabel::C,
    },
    Sample {
        course: "IFT212.2",
        topic: "Computer Systems",
        difficulty: "medium",
        text: "Which component holds the address of the next instruction?",
        options: ["Accumulator", "Program counter", "Stack pointer", "MAR"],
        correct: OptionLabel::B,
    },
    Sample {
        course: "IFT235.2",
        topic: "KPIs & Metrics",
        difficulty: "easy",
        text: "Which KPI measures time from launch to first usable frame?",
        options: ["Crash rate", "Cold start time", "Retention", "ANR rate"],
        correct: OptionLabel::B,
    },
    Sample {
        course: "IFT235.2",
        topic: "Network Optimization",
        difficulty: "medium",
        text: "Which technique reduces repeated downloads of unchanged resources?",
        options: ["HTTP caching", "Polling", "Larger payloads", "Disabling gzip"],
        correct: OptionLabel::A,
    },
    Sample {
        course: "IFT235.2",
        topic: "Data Processing",
        difficulty: "hard",
        text: "Where should heavy JSON parsing run in a mobile app?",
        options: ["UI thread", "Background worker", "Layout pass", "Draw call"],
        correct: OptionLabel::B,
    },
];

/// Stable ids so reseeding updates rows instead of duplicating them.
fn seed_id(sample: usize, copy: u32) -> QuestionId {
    let raw = (0x5eed_u128 << 64) | ((sample as u128) << 32) | u128::from(copy);
    QuestionId::new(Uuid::from_u128(raw))
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;

    let mut written = 0_u32;
    for (index, sample) in SAMPLES.iter().enumerate() {
        for copy in 0..args.copies {
            let text = if copy == 0 {
                sample.text.to_owned()
            } else {
                format!("{} (variant {})", sample.text, copy + 1)
            };
            let question = Question::new(
                seed_id(index, copy),
                CourseCode::new(sample.course)?,
                text,
                sample.options.map(str::to_owned),
                sample.correct,
                Some(sample.topic.to_owned()),
                Some(sample.difficulty.to_owned()),
            )?;
            storage.questions.upsert_question(&question).await?;
            written += 1;
        }
    }

    info!("seeded {written} questions into {}", args.db_url);
    println!("Seeded {written} questions into {}", args.db_url);

    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::init();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
