//! # Node Runtime
//!
//! Wires the status registry to the topic log: provision a list, apply
//! lifecycle changes, publish the signed encoded list and wait for the log to
//! confirm the exact bytes.

use std::sync::{Arc, Mutex};

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tracing::{info, warn};

use csl_01_status_list::{
    CredentialStatus, InMemoryRegistryStorage, StatusList, StatusRegistryApi,
    StatusRegistryService, StatusStride,
};
use csl_02_topic_messaging::{ConsensusSubmitter, MessagingError, SubmitterConfig};
use csl_telemetry::{log_event, log_status_event};
use shared_crypto::Ed25519KeyPair;
use shared_log::{
    InMemoryLogConfig, InMemoryTopicLog, SubmitReceipt, SubmitTransaction, TopicRecord,
};
use shared_types::{MessageEnvelope, TopicId};

use crate::config::NodeConfig;

/// Payload published to the topic for each status list version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusListPublication {
    pub reference: String,
    pub stride: StatusStride,
    pub encoded: String,
}

/// Result of a confirmed publication.
#[derive(Debug, Clone)]
pub struct PublishedList {
    pub receipt: SubmitReceipt,
    pub record: TopicRecord,
}

type Outcome = std::result::Result<TopicRecord, MessagingError>;

/// Status list publisher backed by in-memory collaborators.
pub struct NodeRuntime {
    config: NodeConfig,
    log: InMemoryTopicLog,
    registry: StatusRegistryService<InMemoryRegistryStorage>,
    keypair: Arc<Ed25519KeyPair>,
    topic_id: TopicId,
}

impl NodeRuntime {
    pub fn new(config: NodeConfig) -> Result<Self> {
        config.validate()?;

        let log = InMemoryTopicLog::with_config(
            InMemoryLogConfig::default().with_clock_lag(config.log_clock_lag),
        );
        let topic_id = match config.topic_id {
            Some(topic_id) => log.register_topic(topic_id)?,
            None => log.create_topic()?,
        };
        let registry = StatusRegistryService::new(Arc::new(InMemoryRegistryStorage::new()));

        info!(topic = %topic_id, stride = config.stride.bits(), "Node runtime created");

        Ok(Self {
            config,
            log,
            registry,
            keypair: Arc::new(Ed25519KeyPair::generate()),
            topic_id,
        })
    }

    pub fn topic_id(&self) -> TopicId {
        self.topic_id
    }

    pub fn log(&self) -> &InMemoryTopicLog {
        &self.log
    }

    pub fn registry(&self) -> &StatusRegistryService<InMemoryRegistryStorage> {
        &self.registry
    }

    /// Store a pre-sized, all-ACTIVE list under `reference`.
    pub async fn provision(&self, reference: &str) -> Result<()> {
        self.registry.create(reference, self.config.stride).await?;
        let list = StatusList::with_capacity(self.config.stride, self.config.registry_entries);
        self.registry.store(reference, &list).await?;

        log_event!(
            info,
            "node",
            "Status list provisioned",
            reference,
            entries = self.config.registry_entries
        );
        Ok(())
    }

    /// Sign and submit the current encoding of `reference`, then wait for the
    /// log to confirm it.
    pub async fn publish(&self, reference: &str) -> Result<PublishedList> {
        let list = self.registry.load(reference).await?;
        let publication = StatusListPublication {
            reference: reference.to_string(),
            stride: list.stride(),
            encoded: list.serialize_with(self.registry.codec())?,
        };

        let memo = format!("status-list:{reference}");
        let (tx, rx) = oneshot::channel::<Outcome>();
        let tx = Arc::new(Mutex::new(Some(tx)));
        let (on_confirmed, on_error) = (Arc::clone(&tx), tx);

        let config = SubmitterConfig::builder()
            .sign_message(self.keypair.clone())
            .build_and_sign_transaction(move |topic_id, message| {
                Ok(SubmitTransaction::new(topic_id, message).with_memo(memo.clone()))
            })
            .confirmation_guard(self.config.confirmation_guard)
            .on_message_confirmed(move |record| complete(&on_confirmed, Ok(record.clone())))
            .on_error(move |err| complete(&on_error, Err(err.clone())))
            .build();

        let submitter =
            ConsensusSubmitter::new(MessageEnvelope::new(publication), self.topic_id, config)?;
        let receipt = submitter.execute(&self.log).await?;

        let outcome = tokio::time::timeout(self.config.confirmation_timeout, rx)
            .await
            .context("timed out waiting for confirmation")?
            .map_err(|_| anyhow!("confirmation channel closed"))?;

        match (receipt, outcome) {
            (Some(receipt), Ok(record)) => {
                info!(
                    reference,
                    transaction = %receipt.transaction_id,
                    sequence = record.sequence_number,
                    timestamp = %record.consensus_timestamp,
                    "Status list publication confirmed"
                );
                Ok(PublishedList { receipt, record })
            }
            (_, Err(err)) => Err(err).context("status list publication failed"),
            (None, Ok(_)) => bail!("confirmation arrived for a submission that was not accepted"),
        }
    }

    /// Check a committed record's signature and decode the list it carries.
    pub fn verify_publication(&self, record: &TopicRecord) -> Result<StatusList> {
        let envelope = MessageEnvelope::<StatusListPublication>::from_wire_bytes(&record.contents)?;
        if !envelope.verify(&self.keypair.public_key()) {
            bail!("publication signature does not verify");
        }

        let publication = envelope.message();
        let list = StatusList::from_encoded_with(
            self.registry.codec(),
            publication.stride,
            &publication.encoded,
        )?;
        Ok(list)
    }

    /// Provision, mutate, publish and verify one list.
    pub async fn run_demo(&self, reference: &str) -> Result<DemoSummary> {
        self.provision(reference).await?;

        let step = self.config.stride.bits();
        let revoked = [0, 5 * step, 42 * step];
        for index in revoked {
            self.registry.revoke(reference, index).await?;
            log_status_event!(debug, "Credential revoked", reference, index);
        }

        let suspended = match self.config.stride {
            StatusStride::TwoBit => {
                self.registry.suspend(reference, 2 * step).await?;
                self.registry.suspend(reference, 3 * step).await?;
                self.registry.resume(reference, 3 * step).await?;
                vec![2 * step]
            }
            StatusStride::OneBit => Vec::new(),
        };

        let published = self.publish(reference).await?;
        let committed = self.verify_publication(&published.record)?;
        let local = self.registry.load(reference).await?;
        if committed != local {
            warn!(reference, "Committed list differs from local state");
            bail!("committed status list does not match local state");
        }

        let summary = DemoSummary {
            sequence_number: published.record.sequence_number,
            revoked: committed.count(CredentialStatus::Revoked),
            suspended: committed.count(CredentialStatus::Suspended),
            encoded_len: published.record.contents.len(),
        };
        if summary.revoked != revoked.len() || summary.suspended != suspended.len() {
            bail!("unexpected status counts in committed list: {summary:?}");
        }
        Ok(summary)
    }
}

/// Counts reported by [`NodeRuntime::run_demo`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoSummary {
    pub sequence_number: u64,
    pub revoked: usize,
    pub suspended: usize,
    pub encoded_len: usize,
}

fn complete(slot: &Mutex<Option<oneshot::Sender<Outcome>>>, outcome: Outcome) {
    let sender = match slot.lock() {
        Ok(mut guard) => guard.take(),
        Err(_) => None,
    };
    if let Some(sender) = sender {
        let _ = sender.send(outcome);
    }
}
