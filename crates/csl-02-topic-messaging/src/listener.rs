//! # Consensus Listener
//!
//! Ordered, strictly sequential delivery of committed topic records.
//!
//! A listener is configured by value and consumed by [`ConsensusListener::subscribe`],
//! so it cannot be reconfigured once records are flowing. Each subscription
//! runs one delivery task that invokes callbacks one at a time in commit
//! order. Callbacks receive the [`SubscriptionHandle`] and may unsubscribe
//! from inside themselves.
//!
//! ## Per-record flow
//!
//! ```text
//! record ──→ all filters pass? ──no──→ skip
//!                   │ yes
//!                   ↓
//!            valid flag set and
//!            validators accept? ──no──→ on_invalid_message
//!                   │ yes
//!                   ↓
//!               on_message
//! ```

use shared_log::{LogError, TopicLogClient, TopicRecord};
use shared_types::{Timestamp, TopicId};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio_stream::StreamExt;
use tracing::{debug, warn};

use crate::error::MessagingError;

/// Cheap structural predicate; all filters must pass for a record to be
/// considered at all.
pub type RecordFilter = Arc<dyn Fn(&TopicRecord) -> bool + Send + Sync>;

/// Deeper validity check. `Err(reason)` routes the record to the invalid
/// handler.
pub type RecordValidator = Arc<dyn Fn(&TopicRecord) -> Result<(), String> + Send + Sync>;

type MessageHandler = Box<dyn Fn(&TopicRecord, &SubscriptionHandle) + Send + Sync>;
type InvalidHandler = Arc<dyn Fn(&TopicRecord, &str, &SubscriptionHandle) + Send + Sync>;
type StreamErrorHandler = Arc<dyn Fn(&MessagingError, &SubscriptionHandle) + Send + Sync>;

/// Unconfirmed subscription configuration.
#[derive(Clone)]
pub struct ConsensusListener {
    topic_id: TopicId,
    start_time: Timestamp,
    filters: Vec<RecordFilter>,
    validators: Vec<RecordValidator>,
    ignore_errors: bool,
    on_invalid: Option<InvalidHandler>,
    on_error: Option<StreamErrorHandler>,
}

impl ConsensusListener {
    /// Listener replaying the topic from the beginning.
    pub fn new(topic_id: TopicId) -> Self {
        Self {
            topic_id,
            start_time: Timestamp::EPOCH,
            filters: Vec::new(),
            validators: Vec::new(),
            ignore_errors: false,
            on_invalid: None,
            on_error: None,
        }
    }

    pub fn topic_id(&self) -> TopicId {
        self.topic_id
    }

    /// Deliver only records committed at or after `start`.
    pub fn start_time(mut self, start: Timestamp) -> Self {
        self.start_time = start;
        self
    }

    /// Add a filter. Repeatable; filters are AND-combined.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&TopicRecord) -> bool + Send + Sync + 'static,
    {
        self.filters.push(Arc::new(predicate));
        self
    }

    pub fn validator<F>(mut self, check: F) -> Self
    where
        F: Fn(&TopicRecord) -> Result<(), String> + Send + Sync + 'static,
    {
        self.validators.push(Arc::new(check));
        self
    }

    /// Skip stream faults instead of ending the subscription.
    pub fn ignore_errors(mut self, ignore: bool) -> Self {
        self.ignore_errors = ignore;
        self
    }

    pub fn on_invalid_message<F>(mut self, handler: F) -> Self
    where
        F: Fn(&TopicRecord, &str, &SubscriptionHandle) + Send + Sync + 'static,
    {
        self.on_invalid = Some(Arc::new(handler));
        self
    }

    /// Called once with the fault that ends the subscription. Never called
    /// when errors are ignored.
    pub fn on_error<F>(mut self, handler: F) -> Self
    where
        F: Fn(&MessagingError, &SubscriptionHandle) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(handler));
        self
    }

    /// Open the stream and start delivering records.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn subscribe<F>(
        self,
        client: &dyn TopicLogClient,
        on_message: F,
    ) -> Result<SubscriptionHandle, MessagingError>
    where
        F: Fn(&TopicRecord, &SubscriptionHandle) + Send + Sync + 'static,
    {
        let mut stream = client
            .subscribe_from(self.topic_id, self.start_time)
            .await
            .map_err(MessagingError::Listener)?;

        let handle = SubscriptionHandle::new(self.topic_id);
        let task_handle = handle.clone();
        let on_message: MessageHandler = Box::new(on_message);

        debug!(
            topic = %self.topic_id,
            start = %self.start_time,
            filters = self.filters.len(),
            ignore_errors = self.ignore_errors,
            "Subscription opened"
        );

        tokio::spawn(async move {
            let handle = task_handle;
            loop {
                let next = tokio::select! {
                    biased;
                    () = handle.inner.cancel.notified() => break,
                    item = stream.next() => item,
                };
                if !handle.is_active() {
                    break;
                }

                match next {
                    None => {
                        debug!(topic = %handle.topic(), "Record stream ended");
                        break;
                    }
                    Some(Ok(record)) => self.deliver(&record, &handle, &on_message),
                    Some(Err(err)) => {
                        if self.ignore_errors {
                            warn!(topic = %handle.topic(), error = %err, "Ignoring stream error");
                            continue;
                        }
                        self.fail(err, &handle);
                        break;
                    }
                }
            }
            handle.finish();
        });

        Ok(handle)
    }

    fn deliver(&self, record: &TopicRecord, handle: &SubscriptionHandle, on_message: &MessageHandler) {
        if !self.filters.iter().all(|filter| filter(record)) {
            return;
        }

        match self.check_validity(record) {
            Ok(()) => on_message(record, handle),
            Err(reason) => match &self.on_invalid {
                Some(on_invalid) => on_invalid(record, &reason, handle),
                None => debug!(
                    topic = %record.topic_id,
                    sequence = record.sequence_number,
                    %reason,
                    "Dropping invalid record"
                ),
            },
        }
    }

    fn check_validity(&self, record: &TopicRecord) -> Result<(), String> {
        if !record.valid {
            return Err("record flagged invalid by the log".to_string());
        }
        self.validators.iter().try_for_each(|check| check(record))
    }

    fn fail(&self, err: LogError, handle: &SubscriptionHandle) {
        let err = MessagingError::Listener(err);
        match &self.on_error {
            Some(on_error) => on_error(&err, handle),
            None => warn!(topic = %handle.topic(), error = %err, "Subscription failed"),
        }
    }
}

struct HandleInner {
    topic_id: TopicId,
    active: AtomicBool,
    finished: AtomicBool,
    cancel: Notify,
    done: Notify,
}

/// Cloneable control handle for one subscription.
///
/// Unsubscribing is terminal: no record is delivered afterwards.
#[derive(Clone)]
pub struct SubscriptionHandle {
    inner: Arc<HandleInner>,
}

impl SubscriptionHandle {
    fn new(topic_id: TopicId) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                topic_id,
                active: AtomicBool::new(true),
                finished: AtomicBool::new(false),
                cancel: Notify::new(),
                done: Notify::new(),
            }),
        }
    }

    /// Stop delivery. Idempotent and safe to call from a delivered callback.
    pub fn unsubscribe(&self) {
        if self.inner.active.swap(false, Ordering::SeqCst) {
            self.inner.cancel.notify_one();
            debug!(topic = %self.inner.topic_id, "Unsubscribed");
        }
    }

    pub fn is_active(&self) -> bool {
        self.inner.active.load(Ordering::SeqCst)
    }

    pub fn topic(&self) -> TopicId {
        self.inner.topic_id
    }

    /// Wait until the delivery task has exited.
    pub async fn closed(&self) {
        loop {
            let notified = self.inner.done.notified();
            if self.inner.finished.load(Ordering::SeqCst) {
                return;
            }
            notified.await;
        }
    }

    fn finish(&self) {
        self.inner.active.store(false, Ordering::SeqCst);
        self.inner.finished.store(true, Ordering::SeqCst);
        self.inner.done.notify_waiters();
    }
}

impl std::fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("topic", &self.inner.topic_id)
            .field("active", &self.is_active())
            .finish()
    }
}
