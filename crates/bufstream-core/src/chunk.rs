//! Data model: what producers write, what the queue owns, what consumers get.

use std::ops::Deref;

use bytes::Bytes;

use crate::encoding::Encoding;
use crate::error::Result;

/// An immutable, owned, contiguous run of bytes held by the queue.
///
/// Backed by `Bytes`, so handing a chunk to several listeners shares the
/// allocation instead of copying it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Chunk(Bytes);

impl Chunk {
    pub fn new(bytes: Bytes) -> Self {
        Self(bytes)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

impl Deref for Chunk {
    type Target = [u8];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<[u8]> for Chunk {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Bytes> for Chunk {
    fn from(b: Bytes) -> Self {
        Self(b)
    }
}

impl From<Vec<u8>> for Chunk {
    fn from(v: Vec<u8>) -> Self {
        Self(Bytes::from(v))
    }
}

impl From<&[u8]> for Chunk {
    fn from(s: &[u8]) -> Self {
        Self(Bytes::copy_from_slice(s))
    }
}

/// Data handed to `write`/`end`: raw bytes, or text plus the encoding that
/// turns it into bytes (`None` means UTF-8).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Bytes(Chunk),
    Text {
        text: String,
        encoding: Option<Encoding>,
    },
}

impl Input {
    /// Text input with an explicit encoding, e.g. `Input::encoded("ff00", Encoding::Hex)`.
    pub fn encoded(text: impl Into<String>, encoding: Encoding) -> Self {
        Input::Text {
            text: text.into(),
            encoding: Some(encoding),
        }
    }

    /// Resolve into the chunk the queue will own.
    pub fn into_chunk(self) -> Result<Chunk> {
        match self {
            Input::Bytes(chunk) => Ok(chunk),
            Input::Text { text, encoding } => {
                encoding.unwrap_or_default().encode(&text).map(Chunk)
            }
        }
    }
}

impl From<Chunk> for Input {
    fn from(c: Chunk) -> Self {
        Input::Bytes(c)
    }
}

impl From<Bytes> for Input {
    fn from(b: Bytes) -> Self {
        Input::Bytes(Chunk(b))
    }
}

impl From<Vec<u8>> for Input {
    fn from(v: Vec<u8>) -> Self {
        Input::Bytes(Chunk::from(v))
    }
}

impl From<&[u8]> for Input {
    fn from(s: &[u8]) -> Self {
        Input::Bytes(Chunk::from(s))
    }
}

impl<const N: usize> From<&[u8; N]> for Input {
    fn from(s: &[u8; N]) -> Self {
        Input::Bytes(Chunk::from(&s[..]))
    }
}

impl From<String> for Input {
    fn from(text: String) -> Self {
        Input::Text {
            text,
            encoding: None,
        }
    }
}

impl From<&str> for Input {
    fn from(text: &str) -> Self {
        Input::from(text.to_string())
    }
}

/// What a `Data` event carries: the raw chunk, or its text rendering when the
/// emitting stream has an encoding set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Bytes(Chunk),
    Text { text: String, encoding: Encoding },
}

impl Payload {
    /// Length of the carried value: bytes for raw chunks, UTF-8 bytes for text.
    pub fn len(&self) -> usize {
        match self {
            Payload::Bytes(chunk) => chunk.len(),
            Payload::Text { text, .. } => text.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text { text, .. } => Some(text),
            Payload::Bytes(_) => None,
        }
    }

    pub fn as_chunk(&self) -> Option<&Chunk> {
        match self {
            Payload::Bytes(chunk) => Some(chunk),
            Payload::Text { .. } => None,
        }
    }
}

impl From<Payload> for Input {
    /// Re-encoding text with the encoding it was decoded with recovers the
    /// original bytes, so piping a text-mode stream stays byte-faithful for
    /// well-formed input (the emitting stream's `TextDecoder` keeps split
    /// characters whole).
    fn from(p: Payload) -> Self {
        match p {
            Payload::Bytes(chunk) => Input::Bytes(chunk),
            Payload::Text { text, encoding } => Input::Text {
                text,
                encoding: Some(encoding),
            },
        }
    }
}
