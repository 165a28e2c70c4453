#![forbid(unsafe_code)]
//! bufstream-core: shared types and interfaces for the buffered stream.
//!
//! This crate holds the data model (chunks, inputs, emitted payloads), text
//! encodings, configuration, ids, and the two capabilities the buffering core
//! is composed against: a deferred-task `Scheduler` and the channel traits
//! in `channel`. The queue and the drain state machine live in
//! `bufstream-mem` and `bufstream-exec`.

pub mod channel;
pub mod chunk;
pub mod config;
pub mod encoding;
pub mod error;
pub mod id;
pub mod prelude;
pub mod schedule;

pub use error::{Error, Result};
