//! Node configuration from environment variables.

use std::env;
use std::time::Duration;

use csl_01_status_list::StatusStride;
use shared_types::TopicId;
use thiserror::Error;

/// Largest registry the demo provisions.
pub const MAX_REGISTRY_ENTRIES: usize = 1 << 24;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeConfig {
    /// Topic to publish on; a fresh topic is created when unset.
    pub topic_id: Option<TopicId>,
    /// Bit width of the provisioned list.
    pub stride: StatusStride,
    /// Entries allocated up front.
    pub registry_entries: usize,
    /// Listener start offset before the local clock.
    pub confirmation_guard: Duration,
    /// How long to wait for confirmation before giving up.
    pub confirmation_timeout: Duration,
    /// Simulated lag of the log's clock behind ours.
    pub log_clock_lag: Duration,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            topic_id: None,
            stride: StatusStride::TwoBit,
            registry_entries: 131_072,
            confirmation_guard: Duration::from_secs(1),
            confirmation_timeout: Duration::from_secs(10),
            log_clock_lag: Duration::ZERO,
        }
    }
}

impl NodeConfig {
    /// Load from the process environment.
    ///
    /// # Environment Variables
    ///
    /// - `CSL_TOPIC_ID`: `shard.realm.num` (default: new topic)
    /// - `CSL_STATUS_STRIDE`: `1` or `2` (default: 2)
    /// - `CSL_REGISTRY_ENTRIES`: entries to allocate (default: 131072)
    /// - `CSL_CONFIRMATION_GUARD_MS` (default: 1000)
    /// - `CSL_CONFIRMATION_TIMEOUT_MS` (default: 10000)
    /// - `CSL_LOG_CLOCK_LAG_MS` (default: 0)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            topic_id: parse(&lookup, "CSL_TOPIC_ID")?.or(defaults.topic_id),
            stride: parse::<u8, _>(&lookup, "CSL_STATUS_STRIDE")?
                .map(|bits| {
                    StatusStride::try_from(bits).map_err(|_| ConfigError::InvalidValue {
                        var: "CSL_STATUS_STRIDE",
                        value: bits.to_string(),
                    })
                })
                .transpose()?
                .unwrap_or(defaults.stride),
            registry_entries: parse(&lookup, "CSL_REGISTRY_ENTRIES")?
                .unwrap_or(defaults.registry_entries),
            confirmation_guard: millis(&lookup, "CSL_CONFIRMATION_GUARD_MS")?
                .unwrap_or(defaults.confirmation_guard),
            confirmation_timeout: millis(&lookup, "CSL_CONFIRMATION_TIMEOUT_MS")?
                .unwrap_or(defaults.confirmation_timeout),
            log_clock_lag: millis(&lookup, "CSL_LOG_CLOCK_LAG_MS")?
                .unwrap_or(defaults.log_clock_lag),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.registry_entries == 0 || self.registry_entries > MAX_REGISTRY_ENTRIES {
            return Err(ConfigError::Invalid(format!(
                "registry_entries must be between 1 and {MAX_REGISTRY_ENTRIES}"
            )));
        }
        if self.confirmation_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "confirmation_timeout cannot be 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(var)
        .map(|value| {
            value
                .trim()
                .parse::<T>()
                .map_err(|_| ConfigError::InvalidValue { var, value })
        })
        .transpose()
}

fn millis<F>(lookup: &F, var: &'static str) -> Result<Option<Duration>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    Ok(parse::<u64, F>(lookup, var)?.map(Duration::from_millis))
}
