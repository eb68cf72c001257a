use std::io::BufReader;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{Level, error, info};

use gallows_ipc::ShutdownFlag;
use gallows_protocol::{MAX_ERRORS, MAX_WORD_LENGTH, ResourceNames, names::DEFAULT_PREFIX};
use gallows_server::Server;
use gallows_words::WordList;

#[derive(Parser)]
#[command(
    name = "gallows-server",
    about = "Shared-memory hangman server",
    version,
    long_about = "Serves multi-round word-guessing games to local clients over a \
                  shared-memory mailbox. Reads the dictionary from a file, or from \
                  standard input when no file is given."
)]
struct Cli {
    /// Word list file, one word per line (standard input if omitted)
    wordlist: Option<PathBuf>,

    /// Wrong guesses tolerated before a game is lost
    #[arg(long, default_value_t = MAX_ERRORS)]
    max_errors: u32,

    /// Prefix for the shared memory and semaphore names
    #[arg(long, default_value = DEFAULT_PREFIX)]
    name_prefix: String,

    /// Set the logging level
    #[arg(short, long, value_enum, default_value = "info")]
    log_level: LogLevel,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

fn load_words(cli: &Cli) -> anyhow::Result<WordList> {
    match &cli.wordlist {
        Some(path) => WordList::from_path(path, MAX_WORD_LENGTH)
            .with_context(|| format!("reading word list {}", path.display())),
        None => {
            println!("Enter the game dictionary, one word per line, finish with EOF.");
            let words = WordList::from_reader(BufReader::new(std::io::stdin().lock()), MAX_WORD_LENGTH)
                .context("reading word list from standard input")?;
            println!("Dictionary of {} words read. Ready.", words.len());
            Ok(words)
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(Level::from(cli.log_level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cancel = ShutdownFlag::new();
    cancel.install_signal_hooks().context("installing signal handlers")?;

    let names = ResourceNames::with_prefix(&cli.name_prefix)?;
    let words = load_words(&cli)?;

    let mut server = Server::bootstrap(&names, words, cli.max_errors)?;

    let outcome = server.serve(&cancel);
    if let Err(err) = &outcome {
        error!(%err, "dispatch loop failed");
    }
    server.shutdown();

    outcome?;
    info!("bye");
    Ok(())
}
