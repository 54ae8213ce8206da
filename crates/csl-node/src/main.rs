//! # Credential Status Ledger Node
//!
//! Provisions a status list, applies lifecycle changes, publishes the signed
//! encoded list to the topic log and waits for confirmation.

use anyhow::{Context, Result};
use tracing::info;

use csl_node::{NodeConfig, NodeRuntime};
use csl_telemetry::{init_telemetry, TelemetryConfig};

const DEMO_REFERENCE: &str = "status-list-1";

#[tokio::main]
async fn main() -> Result<()> {
    init_telemetry(&TelemetryConfig::for_component("node"))?;

    let config = NodeConfig::from_env().context("Failed to load node configuration")?;
    info!(?config, "Starting credential status node");

    let runtime = NodeRuntime::new(config)?;
    let summary = runtime
        .run_demo(DEMO_REFERENCE)
        .await
        .context("Status list demo failed")?;

    info!(
        topic = %runtime.topic_id(),
        sequence = summary.sequence_number,
        revoked = summary.revoked,
        suspended = summary.suspended,
        bytes = summary.encoded_len,
        "Status list published and confirmed"
    );
    Ok(())
}
