//! Text encodings for string input and text-mode output.
//!
//! Encoding text into bytes can fail (hex and base64 have a grammar);
//! decoding bytes into text never does, invalid sequences are replaced.
//! `TextDecoder` is the streaming form: a multi-byte character split across
//! chunks is held back until its remaining bytes arrive.

use std::fmt;
use std::str::FromStr;

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Accepts input with or without `=` padding; always pads on output.
const BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    #[default]
    #[serde(alias = "utf-8")]
    Utf8,
    Ascii,
    #[serde(alias = "binary")]
    Latin1,
    Hex,
    Base64,
    #[serde(alias = "ucs2", alias = "utf-16le")]
    Utf16Le,
}

impl Encoding {
    pub fn name(self) -> &'static str {
        match self {
            Encoding::Utf8 => "utf8",
            Encoding::Ascii => "ascii",
            Encoding::Latin1 => "latin1",
            Encoding::Hex => "hex",
            Encoding::Base64 => "base64",
            Encoding::Utf16Le => "utf16le",
        }
    }

    /// Convert `text` into the bytes it denotes under this encoding.
    pub fn encode(self, text: &str) -> Result<Bytes> {
        let bytes: Bytes = match self {
            Encoding::Utf8 => Bytes::copy_from_slice(text.as_bytes()),
            // Both single-byte encodings keep the low byte of each code point.
            Encoding::Ascii | Encoding::Latin1 => {
                text.chars().map(|c| (c as u32 & 0xff) as u8).collect()
            }
            Encoding::Hex => hex::decode(text)
                .map(Bytes::from)
                .map_err(|e| self.invalid(e))?,
            Encoding::Base64 => BASE64
                .decode(text.trim_end())
                .map(Bytes::from)
                .map_err(|e| self.invalid(e))?,
            Encoding::Utf16Le => text.encode_utf16().flat_map(u16::to_le_bytes).collect(),
        };
        Ok(bytes)
    }

    /// Render `bytes` as text under this encoding.
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            Encoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Encoding::Ascii => bytes.iter().map(|b| (b & 0x7f) as char).collect(),
            Encoding::Latin1 => bytes.iter().map(|&b| b as char).collect(),
            Encoding::Hex => hex::encode(bytes),
            Encoding::Base64 => BASE64.encode(bytes),
            Encoding::Utf16Le => encoding_rs::UTF_16LE
                .decode_without_bom_handling(bytes)
                .0
                .into_owned(),
        }
    }

    fn invalid(self, reason: impl fmt::Display) -> Error {
        Error::Encoding {
            encoding: self,
            reason: reason.to_string(),
        }
    }
}

/// Decodes a sequence of chunks as one continuous text.
///
/// UTF-8 and UTF-16LE keep an `encoding_rs` decoder so partial sequences carry
/// over to the next chunk. The other encodings map bytes independently and
/// need no state.
pub struct TextDecoder {
    encoding: Encoding,
    inner: Option<encoding_rs::Decoder>,
}

impl TextDecoder {
    pub fn new(encoding: Encoding) -> Self {
        Self {
            encoding,
            inner: Self::stateful(encoding),
        }
    }

    fn stateful(encoding: Encoding) -> Option<encoding_rs::Decoder> {
        match encoding {
            Encoding::Utf8 => Some(encoding_rs::UTF_8.new_decoder_without_bom_handling()),
            Encoding::Utf16Le => Some(encoding_rs::UTF_16LE.new_decoder_without_bom_handling()),
            _ => None,
        }
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Decode the next chunk. Trailing bytes of an incomplete character are
    /// kept for the next call.
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        match self.inner.as_mut() {
            Some(decoder) => decode_into(decoder, bytes, false),
            None => self.encoding.decode(bytes),
        }
    }

    /// End of input: returns replacement text for any incomplete trailing
    /// character and leaves the decoder ready for a fresh sequence.
    pub fn finish(&mut self) -> String {
        let tail = match self.inner.as_mut() {
            Some(decoder) => decode_into(decoder, &[], true),
            None => String::new(),
        };
        self.inner = Self::stateful(self.encoding);
        tail
    }
}

impl fmt::Debug for TextDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextDecoder")
            .field("encoding", &self.encoding)
            .finish()
    }
}

fn decode_into(decoder: &mut encoding_rs::Decoder, mut src: &[u8], last: bool) -> String {
    let mut out = String::new();
    loop {
        let needed = decoder
            .max_utf8_buffer_length(src.len())
            .unwrap_or(src.len().saturating_mul(3) + 4);
        out.reserve(needed);
        let (result, read, _) = decoder.decode_to_string(src, &mut out, last);
        src = &src[read..];
        if let encoding_rs::CoderResult::InputEmpty = result {
            return out;
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Encoding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "utf8" | "utf-8" => Ok(Encoding::Utf8),
            "ascii" => Ok(Encoding::Ascii),
            "latin1" | "binary" => Ok(Encoding::Latin1),
            "hex" => Ok(Encoding::Hex),
            "base64" => Ok(Encoding::Base64),
            "utf16le" | "utf-16le" | "ucs2" | "ucs-2" => Ok(Encoding::Utf16Le),
            _ => Err(Error::UnknownEncoding(s.to_string())),
        }
    }
}
