//! # Log Records
//!
//! Values that travel over the ordered log: submissions on the write path,
//! receipts acknowledging them, and committed records on the read path.

use serde::{Deserialize, Serialize};
use shared_types::{Timestamp, TopicId, TransactionId};

/// A message submission ready to be sent to the log.
///
/// Produced by the caller's transaction builder from the envelope's wire
/// bytes and the target topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitTransaction {
    /// Locally generated identifier.
    pub transaction_id: TransactionId,
    /// Target topic.
    pub topic_id: TopicId,
    /// Exact bytes to commit.
    pub message: Vec<u8>,
    /// Optional free-form memo.
    pub memo: Option<String>,
}

impl SubmitTransaction {
    /// Build a transaction with a freshly generated id.
    #[must_use]
    pub fn new(topic_id: TopicId, message: Vec<u8>) -> Self {
        Self {
            transaction_id: TransactionId::generate(),
            topic_id,
            message,
            memo: None,
        }
    }

    #[must_use]
    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }
}

/// Local acknowledgment of a submission.
///
/// Proves only that the log accepted the request, not that the message has
/// been ordered; confirmation comes from the read path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitReceipt {
    pub transaction_id: TransactionId,
    pub topic_id: TopicId,
    /// Log time at which the request was accepted.
    pub accepted_at: Timestamp,
}

/// A committed record observed on the read path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicRecord {
    pub topic_id: TopicId,
    /// 1-based position in the topic's total order.
    pub sequence_number: u64,
    /// Commit time assigned by the log's time service.
    pub consensus_timestamp: Timestamp,
    /// Exact committed bytes.
    pub contents: Vec<u8>,
    /// Validity flag reported by the read replica.
    pub valid: bool,
}
