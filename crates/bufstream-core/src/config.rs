//! Stream configuration that callers can serialize/deserialize.

use serde::{Deserialize, Serialize};

use crate::encoding::Encoding;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Advisory capacity in bytes. `write` reports backpressure once the
    /// accounted size exceeds it; nothing is ever rejected. `None` = unlimited.
    pub max_size: Option<usize>,

    /// Text mode: when set, `Data` events carry decoded text.
    pub encoding: Option<Encoding>,

    /// Upper bound on chunks one scheduled drain step emits. `None` emits the
    /// chunks that were queued when the step began.
    pub max_chunks_per_turn: Option<usize>,
}

impl StreamConfig {
    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            max_size: Some(max_size),
            ..Self::default()
        }
    }

    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `BUFSTREAM_MAX_SIZE`: capacity in bytes; negative means unlimited
    /// - `BUFSTREAM_ENCODING`: text mode encoding name (e.g. `utf8`, `hex`)
    /// - `BUFSTREAM_MAX_CHUNKS_PER_TURN`: per-step emission bound
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();

        if let Some(s) = lookup("BUFSTREAM_MAX_SIZE") {
            if let Ok(v) = s.trim().parse::<i64>() {
                cfg.max_size = usize::try_from(v).ok();
            }
        }

        if let Some(s) = lookup("BUFSTREAM_ENCODING") {
            if let Ok(enc) = s.parse::<Encoding>() {
                cfg.encoding = Some(enc);
            }
        }

        if let Some(s) = lookup("BUFSTREAM_MAX_CHUNKS_PER_TURN") {
            if let Ok(v) = s.trim().parse::<usize>() {
                cfg.max_chunks_per_turn = Some(v.max(1));
            }
        }

        cfg
    }
}
