//! Mailbox record layout and direction-tagged views.
//!
//! The mailbox is a single fixed-size record with an explicit
//! little-endian layout:
//!
//! - Offset 0x00: client id (i32, LE, `-1` = unregistered)
//! - Offset 0x04: game state (u32, LE)
//! - Offset 0x08: error count (u32, LE)
//! - Offset 0x0C: guessed character (u8, ASCII uppercase)
//! - Offset 0x0D: terminate flag (u8, 0 or 1)
//! - Offset 0x0E: reserved (2 bytes)
//! - Offset 0x10: word length (u32, LE)
//! - Offset 0x14: word bytes (`MAX_WORD_LENGTH` bytes)
//!
//! Both directions share these bytes; which fields are meaningful
//! depends on who wrote last. [`Request`] is the client-written view,
//! [`Reply`] the server-written view. The terminate flag is the one
//! bidirectional field: a client sets it to disconnect, the server
//! sets it to broadcast shutdown.

use crate::{ProtocolError, Result, MAX_WORD_LENGTH, UNREGISTERED};

const CLIENT_ID_OFFSET: usize = 0x00;
const STATUS_OFFSET: usize = 0x04;
const ERROR_COUNT_OFFSET: usize = 0x08;
const GUESSED_CHAR_OFFSET: usize = 0x0C;
const TERMINATE_OFFSET: usize = 0x0D;
const WORD_LEN_OFFSET: usize = 0x10;
const WORD_OFFSET: usize = 0x14;

/// Total size of one mailbox record in bytes.
pub const MAILBOX_SIZE: usize = WORD_OFFSET + MAX_WORD_LENGTH;

/// State of a game as carried in the mailbox status field.
///
/// `New` is the only value a client may write; all other values are
/// server-written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum GameState {
    /// A new game is requested (client-written).
    New = 0,
    /// A word has been drawn and the game accepts guesses.
    Open = 1,
    /// The session's word pool is exhausted.
    Impossible = 2,
    /// The error budget was exceeded.
    Lost = 3,
    /// Every letter of the word was guessed.
    Won = 4,
}

impl GameState {
    /// Whether this state ends the current game.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Impossible | Self::Lost | Self::Won)
    }
}

impl TryFrom<u32> for GameState {
    type Error = ProtocolError;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            0 => Ok(Self::New),
            1 => Ok(Self::Open),
            2 => Ok(Self::Impossible),
            3 => Ok(Self::Lost),
            4 => Ok(Self::Won),
            other => Err(ProtocolError::InvalidState(other)),
        }
    }
}

impl std::fmt::Display for GameState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::New => "new",
            Self::Open => "open",
            Self::Impossible => "impossible",
            Self::Lost => "lost",
            Self::Won => "won",
        };
        f.write_str(name)
    }
}

/// Helpers over raw mailbox bytes shared by both directions.
pub struct Mailbox;

impl Mailbox {
    /// Read the terminate flag.
    pub fn terminate_set(buf: &[u8]) -> Result<bool> {
        check_len(buf)?;
        Ok(buf[TERMINATE_OFFSET] != 0)
    }

    /// Set the terminate flag without touching any other field.
    ///
    /// Used by the server to broadcast shutdown to all clients.
    pub fn set_terminate(buf: &mut [u8]) -> Result<()> {
        check_len(buf)?;
        buf[TERMINATE_OFFSET] = 1;
        Ok(())
    }

    /// Clear the terminate flag without touching any other field.
    pub fn clear_terminate(buf: &mut [u8]) -> Result<()> {
        check_len(buf)?;
        buf[TERMINATE_OFFSET] = 0;
        Ok(())
    }
}

/// Client-written view of the mailbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Register (id `-1`) or start the next game for an existing id.
    NewGame {
        /// `UNREGISTERED` on first contact, the assigned id afterwards.
        client_id: i32,
    },
    /// Submit one guessed letter for the current game.
    Guess {
        /// The session this guess belongs to.
        client_id: i32,
        /// ASCII uppercase letter.
        letter: u8,
    },
    /// Announce disconnection; the server tears the session down.
    Disconnect {
        /// The departing session.
        client_id: i32,
    },
}

impl Request {
    /// The client id carried by this request.
    pub const fn client_id(&self) -> i32 {
        match self {
            Self::NewGame { client_id }
            | Self::Guess { client_id, .. }
            | Self::Disconnect { client_id } => *client_id,
        }
    }

    /// Encode this request into a mailbox buffer.
    ///
    /// Only the fields the request direction owns are written; the
    /// word field is left as-is since the server never reads it from
    /// a request.
    pub fn encode(&self, buf: &mut [u8]) -> Result<()> {
        check_len(buf)?;
        buf[CLIENT_ID_OFFSET..CLIENT_ID_OFFSET + 4]
            .copy_from_slice(&self.client_id().to_le_bytes());
        match self {
            Self::NewGame { .. } => {
                buf[STATUS_OFFSET..STATUS_OFFSET + 4]
                    .copy_from_slice(&(GameState::New as u32).to_le_bytes());
                buf[GUESSED_CHAR_OFFSET] = 0;
                buf[TERMINATE_OFFSET] = 0;
            }
            Self::Guess { letter, .. } => {
                buf[STATUS_OFFSET..STATUS_OFFSET + 4]
                    .copy_from_slice(&(GameState::Open as u32).to_le_bytes());
                buf[GUESSED_CHAR_OFFSET] = *letter;
                buf[TERMINATE_OFFSET] = 0;
            }
            Self::Disconnect { .. } => {
                buf[TERMINATE_OFFSET] = 1;
            }
        }
        Ok(())
    }

    /// Decode the request view from a mailbox buffer.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        check_len(buf)?;
        let client_id = read_i32(buf, CLIENT_ID_OFFSET);
        if buf[TERMINATE_OFFSET] != 0 {
            return Ok(Self::Disconnect { client_id });
        }
        let status = GameState::try_from(read_u32(buf, STATUS_OFFSET))?;
        if status == GameState::New {
            Ok(Self::NewGame { client_id })
        } else {
            Ok(Self::Guess {
                client_id,
                letter: buf[GUESSED_CHAR_OFFSET],
            })
        }
    }
}

/// Server-written view of the mailbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// The session the reply belongs to; clients adopt this id after
    /// registration.
    pub client_id: i32,
    /// Game state after applying the request.
    pub status: GameState,
    /// Cumulative wrong guesses for the current game.
    pub error_count: u32,
    /// Obscured word bytes (the full secret once the game is lost).
    pub word: Vec<u8>,
}

impl Reply {
    /// Encode this reply into a mailbox buffer.
    ///
    /// Always clears the terminate flag: a reply is only written for
    /// a live transaction, never during shutdown.
    pub fn encode(&self, buf: &mut [u8]) -> Result<()> {
        check_len(buf)?;
        if self.word.len() > MAX_WORD_LENGTH {
            return Err(ProtocolError::WordTooLong(self.word.len()));
        }
        buf[CLIENT_ID_OFFSET..CLIENT_ID_OFFSET + 4]
            .copy_from_slice(&self.client_id.to_le_bytes());
        buf[STATUS_OFFSET..STATUS_OFFSET + 4]
            .copy_from_slice(&(self.status as u32).to_le_bytes());
        buf[ERROR_COUNT_OFFSET..ERROR_COUNT_OFFSET + 4]
            .copy_from_slice(&self.error_count.to_le_bytes());
        buf[TERMINATE_OFFSET] = 0;
        buf[WORD_LEN_OFFSET..WORD_LEN_OFFSET + 4]
            .copy_from_slice(&(self.word.len() as u32).to_le_bytes());
        buf[WORD_OFFSET..WORD_OFFSET + self.word.len()].copy_from_slice(&self.word);
        buf[WORD_OFFSET + self.word.len()..WORD_OFFSET + MAX_WORD_LENGTH].fill(0);
        Ok(())
    }

    /// Decode the reply view from a mailbox buffer.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        check_len(buf)?;
        let word_len = read_u32(buf, WORD_LEN_OFFSET) as usize;
        if word_len > MAX_WORD_LENGTH {
            return Err(ProtocolError::WordTooLong(word_len));
        }
        Ok(Self {
            client_id: read_i32(buf, CLIENT_ID_OFFSET),
            status: GameState::try_from(read_u32(buf, STATUS_OFFSET))?,
            error_count: read_u32(buf, ERROR_COUNT_OFFSET),
            word: buf[WORD_OFFSET..WORD_OFFSET + word_len].to_vec(),
        })
    }

    /// The obscured word as a string, for display.
    pub fn word_str(&self) -> String {
        String::from_utf8_lossy(&self.word).into_owned()
    }
}

fn check_len(buf: &[u8]) -> Result<()> {
    if buf.len() < MAILBOX_SIZE {
        return Err(ProtocolError::ShortBuffer(buf.len()));
    }
    Ok(())
}

fn read_i32(buf: &[u8], offset: usize) -> i32 {
    i32::from_le_bytes([buf[offset], buf[offset + 1], buf[offset + 2], buf[offset + 3]])
}

fn read_u32(buf: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([buf[offset], buf[offset + 1], buf[offset + 2], buf[offset + 3]])
}

/// A zeroed mailbox buffer, as the server maps it initially.
///
/// All-zero bytes decode as a `NewGame` request from client 0, which
/// is why the server only reads the mailbox after the request-pending
/// semaphore fired.
pub fn zeroed() -> [u8; MAILBOX_SIZE] {
    [0; MAILBOX_SIZE]
}

/// Convenience for the first registration request.
pub const fn registration() -> Request {
    Request::NewGame {
        client_id: UNREGISTERED,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn state_discriminants_round_trip() {
        for state in [
            GameState::New,
            GameState::Open,
            GameState::Impossible,
            GameState::Lost,
            GameState::Won,
        ] {
            assert_eq!(GameState::try_from(state as u32).unwrap(), state);
        }
        assert!(GameState::try_from(5).is_err());
    }

    #[test]
    fn request_views_round_trip() {
        let mut buf = zeroed();

        let reg = registration();
        reg.encode(&mut buf).unwrap();
        assert_eq!(Request::decode(&buf).unwrap(), reg);

        let guess = Request::Guess {
            client_id: 3,
            letter: b'Q',
        };
        guess.encode(&mut buf).unwrap();
        assert_eq!(Request::decode(&buf).unwrap(), guess);

        let bye = Request::Disconnect { client_id: 3 };
        bye.encode(&mut buf).unwrap();
        assert_eq!(Request::decode(&buf).unwrap(), bye);
    }

    #[test]
    fn reply_round_trip_clears_terminate() {
        let mut buf = zeroed();
        Mailbox::set_terminate(&mut buf).unwrap();

        let reply = Reply {
            client_id: 7,
            status: GameState::Open,
            error_count: 2,
            word: b"C__".to_vec(),
        };
        reply.encode(&mut buf).unwrap();

        assert!(!Mailbox::terminate_set(&buf).unwrap());
        assert_eq!(Reply::decode(&buf).unwrap(), reply);
    }

    #[test]
    fn reply_rejects_oversized_word() {
        let mut buf = zeroed();
        let reply = Reply {
            client_id: 0,
            status: GameState::Open,
            error_count: 0,
            word: vec![b'A'; MAX_WORD_LENGTH + 1],
        };
        assert!(matches!(
            reply.encode(&mut buf),
            Err(ProtocolError::WordTooLong(_))
        ));
    }

    #[test]
    fn short_buffer_is_rejected() {
        let buf = [0u8; MAILBOX_SIZE - 1];
        assert!(matches!(
            Request::decode(&buf),
            Err(ProtocolError::ShortBuffer(_))
        ));
    }

    #[test]
    fn stale_reply_word_is_not_visible() {
        let mut buf = zeroed();
        Reply {
            client_id: 1,
            status: GameState::Lost,
            error_count: 9,
            word: b"LONGERWORD".to_vec(),
        }
        .encode(&mut buf)
        .unwrap();

        Reply {
            client_id: 1,
            status: GameState::Open,
            error_count: 0,
            word: b"___".to_vec(),
        }
        .encode(&mut buf)
        .unwrap();

        let decoded = Reply::decode(&buf).unwrap();
        assert_eq!(decoded.word, b"___");
    }
}
