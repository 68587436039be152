//! Streaming primitives for fragment payload delivery.
//!
//! This crate provides:
//! - `ByteStream` - single-consumption chunk stream
//! - `tee` - split one stream into two independently consumable branches
//! - `ByteSink` / `accumulate` - append-only byte accumulation

mod sink;
mod stream;
mod tee;

pub use sink::*;
pub use stream::*;
pub use tee::*;
