//! # Credential-Status-Ledger Test Suite
//!
//! Cross-crate integration flows.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs            # Shared log wrappers and helpers
//! └── integration/
//!     ├── listener_ordering.rs   # Commit-order delivery, filters, cancel
//!     ├── submit_confirm.rs      # Submitter + listener against the log
//!     └── status_flows.rs        # Registry service, codec, publication
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p csl-tests
//! cargo test -p csl-tests integration::submit_confirm::
//! ```

pub mod fixtures;
