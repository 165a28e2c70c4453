//! Convenient re-exports for downstream crates.

pub use crate::channel::{DataSink, DataSource, Listener, Observable, StreamEvent};
pub use crate::chunk::{Chunk, Input, Payload};
pub use crate::config::StreamConfig;
pub use crate::encoding::{Encoding, TextDecoder};
pub use crate::error::{Error, Result};
pub use crate::id::{ListenerId, StreamId};
pub use crate::schedule::{Scheduler, Task};
