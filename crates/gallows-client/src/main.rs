use std::io::{BufRead, Write};

use anyhow::Context;
use clap::Parser;
use tracing::Level;

use gallows_client::{ClientError, ClientSession, Connection, gallows};
use gallows_ipc::{IpcError, ShutdownFlag};
use gallows_protocol::{GameState, Request, ResourceNames, names::DEFAULT_PREFIX};

#[derive(Parser)]
#[command(
    name = "gallows-client",
    about = "Interactive client for the shared-memory hangman server",
    version
)]
struct Cli {
    /// Prefix for the shared memory and semaphore names
    #[arg(long, default_value = DEFAULT_PREFIX)]
    name_prefix: String,

    /// Set the logging level
    #[arg(short, long, value_enum, default_value = "warn")]
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

fn prompt(text: &str) -> anyhow::Result<Option<String>> {
    print!("{text}");
    std::io::stdout().flush()?;
    let mut line = String::new();
    let read = std::io::stdin().lock().read_line(&mut line)?;
    if read == 0 {
        return Ok(None); // EOF
    }
    Ok(Some(line))
}

fn play(conn: &mut Connection, cancel: &ShutdownFlag) -> anyhow::Result<()> {
    let mut session = ClientSession::new();

    while !cancel.is_set() {
        let request = if session.status() == GameState::Open {
            let Some(line) = prompt("Your guess? ")? else {
                break;
            };
            match session.validate_guess(&line) {
                Ok(letter) => {
                    session.record_guess(letter);
                    Request::Guess {
                        client_id: session.client_id(),
                        letter,
                    }
                }
                Err(rejection) => {
                    println!("{rejection}.");
                    continue;
                }
            }
        } else {
            Request::NewGame {
                client_id: session.client_id(),
            }
        };

        let reply = match conn.transact(&request, cancel) {
            Ok(reply) => reply,
            Err(ClientError::Ipc(IpcError::Cancelled)) => break,
            Err(err) => return Err(err.into()),
        };
        session.adopt(&reply);

        match reply.status {
            GameState::Impossible => {
                println!("You have played every available word. Well done!");
                break;
            }
            GameState::Open | GameState::New => {
                print!("{}", gallows::render(session.error_count()));
                println!(
                    "\n Secret word: {}\n You guessed: {}\n",
                    session.word(),
                    session.tried()
                );
            }
            GameState::Won | GameState::Lost => {
                print!("{}", gallows::render(session.error_count()));
                println!("The word was {}.", session.word());
                if reply.status == GameState::Won {
                    println!("Congratulations! You figured it out.");
                } else {
                    println!("Game over!");
                }
                println!(
                    "You have now won {} games and lost {}.",
                    session.wins(),
                    session.losses()
                );
                let answer = prompt("Play again? [y/n] ")?;
                match answer.as_deref().map(str::trim) {
                    Some("y" | "Y") => session.begin_round(),
                    _ => break,
                }
            }
        }
    }

    println!(
        "You have won {} games and lost {}. Bye bye!",
        session.wins(),
        session.losses()
    );

    if session.client_id() != gallows_protocol::UNREGISTERED {
        conn.disconnect(session.client_id(), cancel)?;
    }
    Ok(())
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
    let mut conn = Connection::open(&names)?;

    play(&mut conn, &cancel)?;
    Ok(())
}
