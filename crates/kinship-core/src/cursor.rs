//! Continuation token codec.
//!
//! A token names the last identifier a caller has seen. Sources resume with a
//! seek predicate (`id > last_seen`) instead of an offset, so insertions ahead
//! of the cursor never shift later pages.
//!
//! The empty string is both the initial token and the "no more pages" marker.
//! Every source owns a [`CursorCodec`] with its own prefix; a token minted by a
//! source with a different prefix fails to decode.

use crate::id::Identifier;
use thiserror::Error;

/// Opaque continuation token as exchanged with callers.
pub type ContinuationToken = String;

/// Upper bound on accepted token length (untrusted input).
const MAX_TOKEN_LEN: usize = 64;

/// Decoded position in a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    /// Start from the first item
    Start,
    /// Resume strictly after this identifier
    After(Identifier),
}

/// Errors produced while decoding a continuation token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CursorError {
    #[error("invalid continuation token '{token}': {reason}")]
    InvalidToken { token: String, reason: &'static str },
}

impl CursorError {
    fn invalid(token: &str, reason: &'static str) -> Self {
        let mut token = token.to_string();
        token.truncate(MAX_TOKEN_LEN);
        Self::InvalidToken { token, reason }
    }
}

/// Encoder/decoder for one source's continuation tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CursorCodec {
    prefix: String,
}

impl CursorCodec {
    /// Codec whose tokens are `<prefix><decimal id>`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Codec whose tokens are bare decimal ids.
    pub fn plain() -> Self {
        Self::default()
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Encode the last identifier of a page.
    pub fn encode(&self, last_seen: Identifier) -> ContinuationToken {
        format!("{}{}", self.prefix, last_seen.get())
    }

    /// Decode a token received from a caller.
    ///
    /// Surrounding whitespace is ignored. An empty token decodes to
    /// [`Cursor::Start`].
    pub fn decode(&self, token: &str) -> Result<Cursor, CursorError> {
        let token = token.trim();

        if token.is_empty() {
            return Ok(Cursor::Start);
        }

        if token.len() > MAX_TOKEN_LEN {
            return Err(CursorError::invalid(token, "token too long"));
        }

        let Some(body) = token.strip_prefix(self.prefix.as_str()) else {
            return Err(CursorError::invalid(token, "token was not issued by this source"));
        };

        if body.is_empty() || !body.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CursorError::invalid(token, "expected a non-negative decimal id"));
        }

        body.parse::<i64>()
            .map(|id| Cursor::After(Identifier::new(id)))
            .map_err(|_| CursorError::invalid(token, "id out of range"))
    }
}
