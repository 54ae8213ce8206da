//! # Consensus Submitter
//!
//! One-shot submission of a signed [`MessageEnvelope`] to a topic, with
//! optional confirmation observed on the read path.
//!
//! ```text
//! CREATED ──execute──→ VALIDATED ──submit──→ SUBMITTED ──→ CONFIRMED
//!                          │                     │
//!                          └── ValidationError   └──→ FAILED
//! ```
//!
//! `execute` resolves when the log accepts the submission. Confirmation, if
//! requested, arrives later through the configured callback; the two paths
//! are independent and either may complete first.

use serde::Serialize;
use shared_log::{SubmitReceipt, TopicLogClient, TopicRecord};
use shared_types::{MessageEnvelope, Timestamp, TopicId, ValidationGate};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::{ConfirmationCallback, ErrorHandler, SubmitterConfig};
use crate::error::MessagingError;
use crate::listener::{ConsensusListener, SubscriptionHandle};

/// Prefix of the aggregated precondition error raised by `execute`.
pub const PRECONDITION_PREFIX: &str = "Message submission preconditions failed: ";

/// Submits one envelope to one topic, at most once.
pub struct ConsensusSubmitter<T> {
    envelope: Mutex<MessageEnvelope<T>>,
    topic_id: TopicId,
    config: SubmitterConfig,
    executed: AtomicBool,
}

impl<T> ConsensusSubmitter<T>
where
    T: Serialize + Send + Sync,
{
    /// Fails with [`MessagingError::Argument`] if the envelope is malformed.
    pub fn new(
        envelope: MessageEnvelope<T>,
        topic_id: TopicId,
        config: SubmitterConfig,
    ) -> Result<Self, MessagingError> {
        envelope
            .validate()
            .map_err(|e| MessagingError::Argument(e.to_string()))?;

        Ok(Self {
            envelope: Mutex::new(envelope),
            topic_id,
            config,
            executed: AtomicBool::new(false),
        })
    }

    /// Like [`ConsensusSubmitter::new`], parsing `shard.realm.num`.
    pub fn for_topic(
        envelope: MessageEnvelope<T>,
        topic: &str,
        config: SubmitterConfig,
    ) -> Result<Self, MessagingError> {
        let topic_id = topic.parse::<TopicId>().map_err(MessagingError::from)?;
        Self::new(envelope, topic_id, config)
    }

    pub fn topic_id(&self) -> TopicId {
        self.topic_id
    }

    pub fn config(&self) -> &SubmitterConfig {
        &self.config
    }

    /// True once the log has accepted the submission.
    pub fn is_executed(&self) -> bool {
        self.executed.load(Ordering::SeqCst)
    }

    /// Validate, sign if needed, arm the confirmation listener and submit.
    ///
    /// Returns `Ok(Some(receipt))` on acceptance and `Ok(None)` when a
    /// failure was handed to the configured error handler. Precondition
    /// failures are always returned as [`MessagingError::Validation`] and
    /// never reach the log. Concurrent calls are serialized.
    ///
    /// Failures observed after this returns (an invalid confirmation record
    /// or a listener stream fault) go to `on_error`. Without a handler they
    /// are only logged at `warn` level and the caller is not notified, so a
    /// caller that needs them must register `on_error`.
    pub async fn execute(
        &self,
        client: &dyn TopicLogClient,
    ) -> Result<Option<SubmitReceipt>, MessagingError> {
        let mut envelope = self.envelope.lock().await;

        let mut gate = ValidationGate::new();
        gate.require(!self.is_executed(), "message has already been submitted")
            .require(
                self.config.signer().is_some() || envelope.is_signed(),
                "a signer is required for an unsigned message",
            )
            .require(
                self.config.transaction_builder().is_some(),
                "a transaction builder is required",
            );
        gate.raise_if_any(PRECONDITION_PREFIX)?;

        let mut armed = None;
        match self.submit(&mut envelope, client, &mut armed).await {
            Ok(receipt) => {
                self.executed.store(true, Ordering::SeqCst);
                info!(
                    topic = %self.topic_id,
                    transaction = %receipt.transaction_id,
                    confirming = armed.is_some(),
                    "Message submitted"
                );
                Ok(Some(receipt))
            }
            Err(err) => {
                if let Some(handle) = armed {
                    handle.unsubscribe();
                }
                warn!(topic = %self.topic_id, error = %err, "Message submission failed");
                match self.config.on_error() {
                    Some(on_error) => {
                        on_error(&err);
                        Ok(None)
                    }
                    None => Err(err),
                }
            }
        }
    }

    async fn submit(
        &self,
        envelope: &mut MessageEnvelope<T>,
        client: &dyn TopicLogClient,
        armed: &mut Option<SubscriptionHandle>,
    ) -> Result<SubmitReceipt, MessagingError> {
        if !envelope.is_signed() {
            if let Some(signer) = self.config.signer() {
                envelope.sign(signer.as_ref())?;
            }
        }
        let bytes = envelope.to_wire_bytes()?;

        if let Some(on_confirmed) = self.config.on_message_confirmed() {
            *armed = Some(self.arm_confirmation(client, &bytes, on_confirmed.clone()).await?);
        }

        let build = self.config.transaction_builder().ok_or_else(|| {
            MessagingError::Argument("a transaction builder is required".to_string())
        })?;
        let transaction = build(self.topic_id, bytes)?;

        client
            .submit(transaction)
            .await
            .map_err(MessagingError::Submission)
    }

    async fn arm_confirmation(
        &self,
        client: &dyn TopicLogClient,
        bytes: &[u8],
        on_confirmed: ConfirmationCallback,
    ) -> Result<SubscriptionHandle, MessagingError> {
        let start = Timestamp::now().saturating_sub(self.config.confirmation_guard());
        let expected: Arc<Vec<u8>> = Arc::new(bytes.to_vec());
        let on_error = self.config.on_error().cloned();

        let filter_bytes = Arc::clone(&expected);
        let invalid_error = on_error.clone();
        let listener = ConsensusListener::new(self.topic_id)
            .start_time(start)
            .filter(move |record| record.contents == *filter_bytes)
            .on_invalid_message(move |record, reason, handle| {
                let reason = if record.contents == *expected {
                    reason.to_string()
                } else {
                    "committed bytes differ from the submitted message".to_string()
                };
                report(
                    invalid_error.as_ref(),
                    &MessagingError::Confirmation {
                        reason,
                        contents: record.contents.clone(),
                    },
                );
                handle.unsubscribe();
            })
            .on_error(move |err, _| report(on_error.as_ref(), err));

        debug!(topic = %self.topic_id, start = %start, "Arming confirmation listener");

        listener
            .subscribe(client, move |record: &TopicRecord, handle| {
                handle.unsubscribe();
                debug!(
                    topic = %record.topic_id,
                    sequence = record.sequence_number,
                    "Message confirmed"
                );
                on_confirmed(record);
            })
            .await
    }
}

fn report(handler: Option<&ErrorHandler>, err: &MessagingError) {
    match handler {
        Some(handler) => handler(err),
        None => warn!(error = %err, "Unhandled confirmation failure"),
    }
}
