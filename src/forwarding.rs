//! Batch forwarding to the external stream sink.
//!
//! Components:
//! - `sink`: the StreamSink trait defining the append-only boundary.
//! - `redis_sink`: Redis Streams implementation (one XADD per batch).
//! - `stream_forwarder`: the per-session task converting sealed batches
//!   into sink records, with at-least-once best-effort delivery.

pub mod redis_sink;
pub mod sink;
pub mod stream_forwarder;

pub use redis_sink::RedisStreamSink;
pub use sink::StreamSink;
pub use stream_forwarder::{ForwarderHandle, StreamForwarder};
