//! # Shared Log - Ordered Topic Log Client
//!
//! Port and in-memory stand-in for an append-only, totally ordered topic log
//! (the replicated log itself is external to this workspace).
//!
//! ## Write path / read path
//!
//! ```text
//! ┌──────────────┐   submit()    ┌──────────────┐
//! │  Submitter   │ ────────────→ │  Topic Log   │  assigns total order
//! └──────────────┘  ← receipt    │              │  + commit timestamp
//!                                └──────┬───────┘
//!                                       │ subscribe_from(topic, start)
//!                                       ↓
//!                                ┌──────────────┐
//!                                │   Listener   │  ordered records
//!                                └──────────────┘
//! ```
//!
//! The receipt returned by `submit` proves acceptance only. Whether a
//! message was committed is observed on the read path, and the two paths are
//! independent connections: either may complete first.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod error;
pub mod publisher;
pub mod records;
pub mod subscriber;

// Re-export main types
pub use error::LogError;
pub use publisher::{InMemoryLogConfig, InMemoryTopicLog, TopicLogClient};
pub use records::{SubmitReceipt, SubmitTransaction, TopicRecord};
pub use subscriber::RecordStream;

/// Live records buffered per topic before a slow subscriber re-reads history.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

/// Default per-record size limit of the in-memory log.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 64 * 1024;
