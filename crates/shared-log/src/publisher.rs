//! # Topic Log Client
//!
//! The port through which the messaging crates talk to the ordered log, and
//! an in-memory implementation of it.
//!
//! The in-memory log is a single-process stand-in: it assigns a total order
//! and commit timestamps, replays history to new subscribers and fans live
//! commits out over one `tokio::sync::broadcast` channel per topic, so a busy
//! topic never crowds records of another topic out of a subscriber's buffer. It also exposes the
//! knobs the confirmation protocol has to survive: a lagging time service,
//! delayed commits, rejected submissions, stream faults and records flagged
//! invalid by the read replica.

use crate::error::LogError;
use crate::records::{SubmitReceipt, SubmitTransaction, TopicRecord};
use crate::subscriber::{record_stream, Backfill, LogItem, RecordStream};
use crate::{DEFAULT_CHANNEL_CAPACITY, DEFAULT_MAX_MESSAGE_SIZE};
use async_trait::async_trait;
use shared_types::{Timestamp, TopicId};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Client side of the append-only ordered log.
#[async_trait]
pub trait TopicLogClient: Send + Sync {
    /// Submit a message. Resolves once the log has accepted the request;
    /// ordering happens later and is observed through `subscribe_from`.
    async fn submit(&self, transaction: SubmitTransaction) -> Result<SubmitReceipt, LogError>;

    /// Open an ordered stream of records committed at or after `start`.
    async fn subscribe_from(
        &self,
        topic_id: TopicId,
        start: Timestamp,
    ) -> Result<RecordStream, LogError>;
}

/// Behaviour knobs of the in-memory log.
#[derive(Debug, Clone)]
pub struct InMemoryLogConfig {
    /// Live fan-out buffer per topic. Slower subscribers re-read history.
    pub channel_capacity: usize,
    /// Largest accepted message in bytes.
    pub max_message_size: usize,
    /// Delay between accepting a submission and committing it.
    pub commit_delay: Option<Duration>,
    /// How far the log's time service runs behind the local clock.
    pub clock_lag: Duration,
}

impl Default for InMemoryLogConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            commit_delay: None,
            clock_lag: Duration::ZERO,
        }
    }
}

impl InMemoryLogConfig {
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    pub fn with_max_message_size(mut self, max: usize) -> Self {
        self.max_message_size = max;
        self
    }

    pub fn with_commit_delay(mut self, delay: Duration) -> Self {
        self.commit_delay = Some(delay);
        self
    }

    pub fn with_clock_lag(mut self, lag: Duration) -> Self {
        self.clock_lag = lag;
        self
    }
}

/// Committed records of one topic and its live channel.
struct TopicLog {
    records: Vec<TopicRecord>,
    sender: broadcast::Sender<LogItem>,
}

#[derive(Default)]
struct LogState {
    topics: HashMap<TopicId, TopicLog>,
    last_timestamp: Timestamp,
    next_topic_num: u64,
    pending_rejections: VecDeque<LogError>,
}

struct Inner {
    state: RwLock<LogState>,
    submissions: AtomicU64,
    config: InMemoryLogConfig,
}

impl Inner {
    fn open_topic(&self, state: &mut LogState, topic_id: TopicId) {
        let (sender, _) = broadcast::channel(self.config.channel_capacity.max(1));
        state.topics.insert(
            topic_id,
            TopicLog {
                records: Vec::new(),
                sender,
            },
        );
    }

    fn log_time(&self) -> Timestamp {
        Timestamp::now().saturating_sub(self.config.clock_lag)
    }

    /// Append under the write lock and fan out while still holding it, so
    /// live order always equals commit order.
    fn commit(&self, topic_id: TopicId, contents: Vec<u8>, valid: bool) -> Result<TopicRecord, LogError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| LogError::Unavailable("log state poisoned".into()))?;

        let candidate = self.log_time();
        let consensus_timestamp = if candidate > state.last_timestamp {
            candidate
        } else {
            state.last_timestamp.next()
        };

        let topic = state
            .topics
            .get_mut(&topic_id)
            .ok_or(LogError::UnknownTopic(topic_id))?;

        let record = TopicRecord {
            topic_id,
            sequence_number: topic.records.len() as u64 + 1,
            consensus_timestamp,
            contents,
            valid,
        };
        topic.records.push(record.clone());
        let receivers = topic.sender.send(LogItem::Record(record.clone())).unwrap_or(0);
        state.last_timestamp = consensus_timestamp;

        debug!(
            topic = %topic_id,
            sequence = record.sequence_number,
            timestamp = %consensus_timestamp,
            receivers,
            "Record committed"
        );

        Ok(record)
    }

    /// Records of `topic_id` with a sequence number above `after`.
    fn records_after(&self, topic_id: TopicId, after: u64) -> Result<Vec<TopicRecord>, LogError> {
        let state = self
            .state
            .read()
            .map_err(|_| LogError::Unavailable("log state poisoned".into()))?;
        let topic = state
            .topics
            .get(&topic_id)
            .ok_or(LogError::UnknownTopic(topic_id))?;
        let skip = usize::try_from(after).unwrap_or(usize::MAX);
        Ok(topic.records.iter().skip(skip).cloned().collect())
    }
}

/// In-memory implementation of [`TopicLogClient`].
#[derive(Clone)]
pub struct InMemoryTopicLog {
    inner: Arc<Inner>,
}

impl InMemoryTopicLog {
    /// Create a log with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(InMemoryLogConfig::default())
    }

    #[must_use]
    pub fn with_config(config: InMemoryLogConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: RwLock::new(LogState {
                    next_topic_num: 1000,
                    ..LogState::default()
                }),
                submissions: AtomicU64::new(0),
                config,
            }),
        }
    }

    /// Create a new empty topic and return its id.
    pub fn create_topic(&self) -> Result<TopicId, LogError> {
        let mut state = self
            .inner
            .state
            .write()
            .map_err(|_| LogError::Unavailable("log state poisoned".into()))?;
        let topic_id = TopicId::new(0, 0, state.next_topic_num);
        state.next_topic_num += 1;
        self.inner.open_topic(&mut state, topic_id);

        info!(topic = %topic_id, "Topic created");
        Ok(topic_id)
    }

    /// Register a topic with a caller-chosen id. Existing topics are kept.
    pub fn register_topic(&self, topic_id: TopicId) -> Result<TopicId, LogError> {
        let mut state = self
            .inner
            .state
            .write()
            .map_err(|_| LogError::Unavailable("log state poisoned".into()))?;
        if !state.topics.contains_key(&topic_id) {
            self.inner.open_topic(&mut state, topic_id);
            info!(topic = %topic_id, "Topic registered");
        }
        Ok(topic_id)
    }

    /// Commit bytes directly, bypassing submission. Models another
    /// publisher, or a record the read replica reports as invalid.
    pub fn publish_raw(
        &self,
        topic_id: TopicId,
        contents: Vec<u8>,
        valid: bool,
    ) -> Result<TopicRecord, LogError> {
        self.inner.commit(topic_id, contents, valid)
    }

    /// Reject the next submission with `error` before it is accepted.
    pub fn reject_next_submission(&self, error: LogError) {
        if let Ok(mut state) = self.inner.state.write() {
            state.pending_rejections.push_back(error);
        }
    }

    /// Push a stream-level fault to every live subscriber of `topic_id`.
    pub fn inject_stream_fault(&self, topic_id: TopicId, error: LogError) -> usize {
        warn!(topic = %topic_id, error = %error, "Injecting stream fault");
        self.inner
            .state
            .read()
            .ok()
            .and_then(|state| {
                state
                    .topics
                    .get(&topic_id)
                    .and_then(|topic| topic.sender.send(LogItem::Fault(error)).ok())
            })
            .unwrap_or(0)
    }

    /// Snapshot of all committed records of a topic.
    pub fn records(&self, topic_id: TopicId) -> Vec<TopicRecord> {
        self.inner
            .state
            .read()
            .ok()
            .and_then(|state| state.topics.get(&topic_id).map(|t| t.records.clone()))
            .unwrap_or_default()
    }

    /// Number of submissions that reached the log (accepted or rejected).
    #[must_use]
    pub fn submissions(&self) -> u64 {
        self.inner.submissions.load(Ordering::Relaxed)
    }

    /// Number of live stream receivers across all topics.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .state
            .read()
            .map(|state| {
                state
                    .topics
                    .values()
                    .map(|topic| topic.sender.receiver_count())
                    .sum()
            })
            .unwrap_or(0)
    }

    #[must_use]
    pub fn config(&self) -> &InMemoryLogConfig {
        &self.inner.config
    }
}

impl Default for InMemoryTopicLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TopicLogClient for InMemoryTopicLog {
    async fn submit(&self, transaction: SubmitTransaction) -> Result<SubmitReceipt, LogError> {
        self.inner.submissions.fetch_add(1, Ordering::Relaxed);

        let topic_id = transaction.topic_id;
        {
            let mut state = self
                .inner
                .state
                .write()
                .map_err(|_| LogError::Unavailable("log state poisoned".into()))?;

            if let Some(error) = state.pending_rejections.pop_front() {
                warn!(topic = %topic_id, error = %error, "Submission rejected");
                return Err(error);
            }
            if !state.topics.contains_key(&topic_id) {
                return Err(LogError::UnknownTopic(topic_id));
            }
        }

        let size = transaction.message.len();
        let max = self.inner.config.max_message_size;
        if size > max {
            return Err(LogError::MessageTooLarge { size, max });
        }

        let receipt = SubmitReceipt {
            transaction_id: transaction.transaction_id.clone(),
            topic_id,
            accepted_at: self.inner.log_time(),
        };

        match self.inner.config.commit_delay {
            Some(delay) => {
                let inner = Arc::clone(&self.inner);
                let message = transaction.message;
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    if let Err(e) = inner.commit(topic_id, message, true) {
                        warn!(topic = %topic_id, error = %e, "Delayed commit failed");
                    }
                });
            }
            None => {
                self.inner.commit(topic_id, transaction.message, true)?;
            }
        }

        debug!(
            topic = %topic_id,
            transaction = %receipt.transaction_id,
            size,
            "Submission accepted"
        );
        Ok(receipt)
    }

    async fn subscribe_from(
        &self,
        topic_id: TopicId,
        start: Timestamp,
    ) -> Result<RecordStream, LogError> {
        // Snapshot and subscribe under one read lock: commits fan out while
        // holding the write lock, so nothing is duplicated or skipped.
        let state = self
            .inner
            .state
            .read()
            .map_err(|_| LogError::Unavailable("log state poisoned".into()))?;

        let topic = state
            .topics
            .get(&topic_id)
            .ok_or(LogError::UnknownTopic(topic_id))?;
        let history: Vec<TopicRecord> = topic
            .records
            .iter()
            .filter(|r| r.consensus_timestamp >= start)
            .cloned()
            .collect();
        let receiver = topic.sender.subscribe();
        drop(state);

        let inner = Arc::downgrade(&self.inner);
        let backfill: Backfill = Arc::new(move |topic_id: TopicId, after: u64| {
            inner
                .upgrade()
                .ok_or_else(|| LogError::Unavailable("log has shut down".into()))?
                .records_after(topic_id, after)
        });

        Ok(record_stream(topic_id, start, history, receiver, backfill))
    }
}
