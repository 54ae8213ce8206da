//! # Log Errors
//!
//! Errors surfaced by the ordered log, on the write path (submission) and on
//! the read path (streaming subscriptions).

use shared_types::TopicId;
use thiserror::Error;

/// Errors from log operations.
///
/// `Clone` so stream faults can be fanned out to every subscriber.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LogError {
    /// The log refused the submission.
    #[error("Submission rejected: {0}")]
    Rejected(String),

    /// The topic does not exist.
    #[error("Unknown topic: {0}")]
    UnknownTopic(TopicId),

    /// Message exceeds the per-record size limit.
    #[error("Message too large: {size} > {max} bytes")]
    MessageTooLarge { size: usize, max: usize },

    /// The log (or its read replica) cannot be reached.
    #[error("Log unavailable: {0}")]
    Unavailable(String),

    /// The streaming read failed mid-stream.
    #[error("Stream fault: {0}")]
    StreamFault(String),

    /// The subscriber fell behind and the missed records could not be re-read.
    #[error("Subscriber lagged, {0} records dropped")]
    Lagged(u64),
}
