//! Shared test fixtures.

use async_trait::async_trait;
use shared_crypto::Ed25519KeyPair;
use shared_log::{
    InMemoryTopicLog, LogError, RecordStream, SubmitReceipt, SubmitTransaction, TopicLogClient,
};
use shared_types::{Timestamp, TopicId};
use std::sync::Arc;
use std::time::Duration;

/// Default deadline for awaiting asynchronous outcomes in tests.
pub const WAIT: Duration = Duration::from_secs(3);

/// Deterministic signer.
pub fn keypair() -> Arc<Ed25519KeyPair> {
    Arc::new(Ed25519KeyPair::from_seed([0x42; 32]))
}

/// Log whose read replica flags every submitted record as invalid.
#[derive(Clone, Default)]
pub struct InvalidatingLog {
    pub inner: InMemoryTopicLog,
}

#[async_trait]
impl TopicLogClient for InvalidatingLog {
    async fn submit(&self, transaction: SubmitTransaction) -> Result<SubmitReceipt, LogError> {
        let record = self
            .inner
            .publish_raw(transaction.topic_id, transaction.message, false)?;
        Ok(SubmitReceipt {
            transaction_id: transaction.transaction_id,
            topic_id: record.topic_id,
            accepted_at: record.consensus_timestamp,
        })
    }

    async fn subscribe_from(
        &self,
        topic_id: TopicId,
        start: Timestamp,
    ) -> Result<RecordStream, LogError> {
        self.inner.subscribe_from(topic_id, start).await
    }
}

/// Poll `condition` until it holds or `WAIT` elapses.
pub async fn eventually<F>(condition: F) -> bool
where
    F: Fn() -> bool,
{
    let deadline = tokio::time::Instant::now() + WAIT;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
