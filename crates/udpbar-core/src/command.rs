//! Command decoding — raw datagram bytes to a typed [`Command`].
//!
//! Decoding is total: every byte sequence maps to some command, with
//! [`Command::Unknown`] as the catch-all, so callers never handle a decode
//! error. Classification order is integer, then color token, then quit token.

use std::borrow::Cow;

use udpbar_config::ListenerConfig;

use crate::catalog::IconColor;

/// Datagrams longer than this are `Unknown` unless configured otherwise.
pub const DEFAULT_MAX_DATAGRAM_LEN: usize = 256;

/// The reserved token that asks the indicator to exit.
pub const DEFAULT_QUIT_TOKEN: &str = "quit";

/// The intent decoded from one datagram.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Command {
    /// A color token, stored in canonical lowercase form.
    NamedColor(String),
    /// An index into the catalog's image set. Not range-checked.
    IndexedImage(usize),
    /// Stop listening and exit.
    QuitRequest,
    /// Anything else.
    Unknown,
}

impl Command {
    /// Shorthand for a `NamedColor` command.
    pub fn color(color: IconColor) -> Self {
        Command::NamedColor(color.as_str().to_string())
    }

    /// The datagram text that decodes back to this command, or `None` for
    /// `Unknown`.
    pub fn to_wire(&self, quit_token: &str) -> Option<String> {
        match self {
            Command::NamedColor(token) => Some(token.clone()),
            Command::IndexedImage(index) => Some(index.to_string()),
            Command::QuitRequest => Some(quit_token.to_string()),
            Command::Unknown => None,
        }
    }
}

/// Decodes datagram payloads into commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoder {
    max_len: usize,
    quit_token: Cow<'static, str>,
}

impl Decoder {
    pub fn new(max_len: usize, quit_token: impl Into<Cow<'static, str>>) -> Self {
        Self {
            max_len,
            quit_token: quit_token.into(),
        }
    }

    pub fn from_config(config: &ListenerConfig) -> Self {
        Self::new(config.max_datagram_len, config.quit_token.clone())
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn quit_token(&self) -> &str {
        &self.quit_token
    }

    /// Decode one datagram payload.
    pub fn decode(&self, bytes: &[u8]) -> Command {
        if bytes.len() > self.max_len {
            return Command::Unknown;
        }
        let Ok(text) = std::str::from_utf8(bytes) else {
            return Command::Unknown;
        };
        let text = text.trim();
        if text.is_empty() {
            return Command::Unknown;
        }

        if text.bytes().all(|b| b.is_ascii_digit()) {
            // Overflowing indices can never be in range.
            return text
                .parse()
                .map(Command::IndexedImage)
                .unwrap_or(Command::Unknown);
        }
        if let Some(color) = IconColor::from_token(text) {
            return Command::color(color);
        }
        if text.eq_ignore_ascii_case(&self.quit_token) {
            return Command::QuitRequest;
        }
        Command::Unknown
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DATAGRAM_LEN, DEFAULT_QUIT_TOKEN)
    }
}

/// Decode with the default length limit and quit token.
pub fn decode(bytes: &[u8]) -> Command {
    Decoder::default().decode(bytes)
}
