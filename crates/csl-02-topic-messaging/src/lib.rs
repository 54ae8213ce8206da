//! # CSL-02 Topic Messaging
//!
//! Submit-and-confirm messaging over the ordered topic log.
//!
//! - [`ConsensusSubmitter`]: validates preconditions, signs the envelope,
//!   optionally arms a confirmation listener, then submits exactly once.
//! - [`ConsensusListener`]: ordered, sequential delivery of committed records
//!   with filters, validators and a cancellable [`SubscriptionHandle`].
//!
//! ## Failure routing
//!
//! | Failure                         | Handler registered | No handler        |
//! |---------------------------------|--------------------|-------------------|
//! | Precondition (`Validation`)     | returned           | returned          |
//! | Signing / submission            | `on_error`         | returned          |
//! | Invalid confirmation record     | `on_error`         | logged (`warn`)   |
//! | Listener stream fault           | `on_error`         | logged (`warn`)   |
//!
//! "Logged" means the failure is not escalated: `execute` has already
//! returned, and without `on_error` the caller is never told. Nothing is
//! retried. If confirmation never arrives the caller reconciles,
//! typically by wrapping the wait in `tokio::time::timeout`.
//!
//! ## Usage Example
//!
//! ```ignore
//! let config = SubmitterConfig::builder()
//!     .sign_message(Arc::new(keypair))
//!     .default_transaction()
//!     .on_message_confirmed(|record| println!("committed #{}", record.sequence_number))
//!     .build();
//!
//! let submitter = ConsensusSubmitter::new(MessageEnvelope::new(update), topic_id, config)?;
//! let receipt = submitter.execute(&log).await?;
//! ```

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod error;
pub mod listener;
pub mod submitter;

// Re-export main types
pub use config::{
    default_transaction_builder, ConfirmationCallback, ErrorHandler, SubmitterConfig,
    SubmitterConfigBuilder, TransactionBuilder, DEFAULT_CONFIRMATION_GUARD,
};
pub use error::MessagingError;
pub use listener::{ConsensusListener, RecordFilter, RecordValidator, SubscriptionHandle};
pub use submitter::{ConsensusSubmitter, PRECONDITION_PREFIX};
