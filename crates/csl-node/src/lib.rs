//! # CSL Node
//!
//! Library side of the `csl-node` executable.
//!
//! ## Flow
//!
//! ```text
//! provision ──→ revoke / suspend / resume ──→ publish ──→ confirmation
//!   (registry service, load → set → store)     (submitter + listener)
//! ```

pub mod config;
pub mod runtime;

pub use config::{ConfigError, NodeConfig};
pub use runtime::{DemoSummary, NodeRuntime, PublishedList, StatusListPublication};
