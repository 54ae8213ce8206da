//! # Submitter Configuration
//!
//! Callbacks and knobs for a [`crate::ConsensusSubmitter`], assembled with a
//! fluent builder and frozen before `execute`. Setting the same option twice
//! keeps the last value.

use shared_log::{SubmitTransaction, TopicRecord};
use shared_types::{MessageSigner, TopicId};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::MessagingError;

/// How far the confirmation listener starts before the local clock, to
/// tolerate skew against the log's time service. Best effort only.
pub const DEFAULT_CONFIRMATION_GUARD: Duration = Duration::from_secs(1);

/// Invoked once with the committed record that confirmed the submission.
pub type ConfirmationCallback = Arc<dyn Fn(&TopicRecord) + Send + Sync>;

/// Receives submission, confirmation and listener failures.
pub type ErrorHandler = Arc<dyn Fn(&MessagingError) + Send + Sync>;

/// Turns the wire bytes into the transaction submitted to the log.
pub type TransactionBuilder =
    Arc<dyn Fn(TopicId, Vec<u8>) -> Result<SubmitTransaction, MessagingError> + Send + Sync>;

/// Builder producing a plain [`SubmitTransaction`] with a fresh id.
pub fn default_transaction_builder() -> TransactionBuilder {
    Arc::new(|topic_id, message| Ok(SubmitTransaction::new(topic_id, message)))
}

/// Immutable submitter configuration.
#[derive(Clone)]
pub struct SubmitterConfig {
    on_message_confirmed: Option<ConfirmationCallback>,
    on_error: Option<ErrorHandler>,
    signer: Option<Arc<dyn MessageSigner>>,
    transaction_builder: Option<TransactionBuilder>,
    confirmation_guard: Duration,
}

impl Default for SubmitterConfig {
    fn default() -> Self {
        Self {
            on_message_confirmed: None,
            on_error: None,
            signer: None,
            transaction_builder: None,
            confirmation_guard: DEFAULT_CONFIRMATION_GUARD,
        }
    }
}

impl SubmitterConfig {
    pub fn builder() -> SubmitterConfigBuilder {
        SubmitterConfigBuilder::default()
    }

    pub fn on_message_confirmed(&self) -> Option<&ConfirmationCallback> {
        self.on_message_confirmed.as_ref()
    }

    pub fn on_error(&self) -> Option<&ErrorHandler> {
        self.on_error.as_ref()
    }

    pub fn signer(&self) -> Option<&Arc<dyn MessageSigner>> {
        self.signer.as_ref()
    }

    pub fn transaction_builder(&self) -> Option<&TransactionBuilder> {
        self.transaction_builder.as_ref()
    }

    pub fn confirmation_guard(&self) -> Duration {
        self.confirmation_guard
    }
}

impl fmt::Debug for SubmitterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubmitterConfig")
            .field("on_message_confirmed", &self.on_message_confirmed.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("signer", &self.signer.is_some())
            .field("transaction_builder", &self.transaction_builder.is_some())
            .field("confirmation_guard", &self.confirmation_guard)
            .finish()
    }
}

/// Fluent builder for [`SubmitterConfig`].
#[derive(Default)]
pub struct SubmitterConfigBuilder {
    config: SubmitterConfig,
}

impl SubmitterConfigBuilder {
    /// Request confirmation: arm a listener and call `callback` on commit.
    pub fn on_message_confirmed<F>(mut self, callback: F) -> Self
    where
        F: Fn(&TopicRecord) + Send + Sync + 'static,
    {
        self.config.on_message_confirmed = Some(Arc::new(callback));
        self
    }

    /// Route failures here instead of returning them from `execute`.
    pub fn on_error<F>(mut self, handler: F) -> Self
    where
        F: Fn(&MessagingError) + Send + Sync + 'static,
    {
        self.config.on_error = Some(Arc::new(handler));
        self
    }

    pub fn sign_message(mut self, signer: Arc<dyn MessageSigner>) -> Self {
        self.config.signer = Some(signer);
        self
    }

    pub fn build_and_sign_transaction<F>(mut self, builder: F) -> Self
    where
        F: Fn(TopicId, Vec<u8>) -> Result<SubmitTransaction, MessagingError>
            + Send
            + Sync
            + 'static,
    {
        self.config.transaction_builder = Some(Arc::new(builder));
        self
    }

    /// Use [`default_transaction_builder`].
    pub fn default_transaction(mut self) -> Self {
        self.config.transaction_builder = Some(default_transaction_builder());
        self
    }

    pub fn confirmation_guard(mut self, guard: Duration) -> Self {
        self.config.confirmation_guard = guard;
        self
    }

    pub fn build(self) -> SubmitterConfig {
        self.config
    }
}
