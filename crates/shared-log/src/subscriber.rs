//! # Record Streams
//!
//! The read side of the log: an ordered stream of committed records for one
//! topic, replaying history from a start time and then following live
//! commits.
//!
//! A subscriber that falls behind its topic's live channel does not lose
//! records: the missed range is re-read from the topic's history by sequence
//! number and delivered before live records resume.

use crate::error::LogError;
use crate::records::TopicRecord;
use shared_types::{Timestamp, TopicId};
use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{ready, Context, Poll};
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::Stream;
use tracing::{debug, warn};

/// Ordered stream of committed records (or stream-level faults).
pub type RecordStream = Pin<Box<dyn Stream<Item = Result<TopicRecord, LogError>> + Send>>;

/// Item fanned out on a topic's live channel.
#[derive(Debug, Clone)]
pub(crate) enum LogItem {
    Record(TopicRecord),
    Fault(LogError),
}

/// Reads the records of a topic with a sequence number above the given one.
pub(crate) type Backfill =
    Arc<dyn Fn(TopicId, u64) -> Result<Vec<TopicRecord>, LogError> + Send + Sync>;

type LiveItems = Pin<Box<dyn Stream<Item = Result<LogItem, BroadcastStreamRecvError>> + Send>>;

/// Build a stream that yields `history` first, then live items committed at
/// or after `start`.
///
/// The caller must snapshot `history` and create `receiver` atomically with
/// respect to appends, otherwise records could be skipped.
pub(crate) fn record_stream(
    topic_id: TopicId,
    start: Timestamp,
    history: Vec<TopicRecord>,
    receiver: broadcast::Receiver<LogItem>,
    backfill: Backfill,
) -> RecordStream {
    debug!(topic = %topic_id, start = %start, replayed = history.len(), "Record stream opened");

    Box::pin(RecordFollower {
        topic_id,
        start,
        last_sequence: 0,
        pending: history.into(),
        live: Box::pin(BroadcastStream::new(receiver)),
        backfill,
    })
}

struct RecordFollower {
    topic_id: TopicId,
    start: Timestamp,
    /// Highest sequence number already passed through.
    last_sequence: u64,
    pending: VecDeque<TopicRecord>,
    live: LiveItems,
    backfill: Backfill,
}

impl RecordFollower {
    /// Drops duplicates and records before `start`.
    fn accept(&mut self, record: TopicRecord) -> Option<TopicRecord> {
        if record.sequence_number <= self.last_sequence {
            return None;
        }
        self.last_sequence = record.sequence_number;
        (record.consensus_timestamp >= self.start).then_some(record)
    }

    fn recover(&mut self, missed: u64) -> Result<(), LogError> {
        match (self.backfill)(self.topic_id, self.last_sequence) {
            Ok(records) => {
                debug!(
                    topic = %self.topic_id,
                    missed,
                    after = self.last_sequence,
                    recovered = records.len(),
                    "Record stream lagged, re-reading history"
                );
                self.pending.extend(records);
                Ok(())
            }
            Err(error) => {
                warn!(topic = %self.topic_id, missed, %error, "Lagged records cannot be recovered");
                Err(LogError::Lagged(missed))
            }
        }
    }
}

impl Stream for RecordFollower {
    type Item = Result<TopicRecord, LogError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        loop {
            if let Some(record) = this.pending.pop_front() {
                if let Some(record) = this.accept(record) {
                    return Poll::Ready(Some(Ok(record)));
                }
                continue;
            }

            match ready!(this.live.as_mut().poll_next(cx)) {
                None => return Poll::Ready(None),
                Some(Ok(LogItem::Record(record))) => this.pending.push_back(record),
                Some(Ok(LogItem::Fault(error))) => return Poll::Ready(Some(Err(error))),
                Some(Err(BroadcastStreamRecvError::Lagged(missed))) => {
                    if let Err(error) = this.recover(missed) {
                        return Poll::Ready(Some(Err(error)));
                    }
                }
            }
        }
    }
}
