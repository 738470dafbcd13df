pub mod args;
pub mod target_date;

use anyhow::{Result, anyhow};

use crate::types::S3Credentials;
use crate::types::error::S3PruneError;

/// Default number of concurrent deletion workers.
pub const DEFAULT_WORKER_SIZE: u16 = 10;
/// Default (and maximum) number of keys per DeleteObjects call.
pub const DEFAULT_MAX_KEYS: u16 = 1000;
/// Default region when none is given.
pub const DEFAULT_REGION: &str = "us-east-1";

const ERROR_MESSAGE_REQUIRED: &str = "Bucket name and date are required";

/// Main configuration for a deletion run.
///
/// Holds the target bucket, the raw target date (parsed when the pipeline
/// starts), the worker pool size, the batch size and the S3 client settings.
///
/// # Quick Start
///
/// ```
/// use s3prune_rs::Config;
///
/// let config = Config::for_target("my-bucket", "2024-01-01");
/// assert_eq!(config.worker_size, 10);
/// assert_eq!(config.max_keys, 1000);
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub bucket: String,
    pub target_date: String,
    pub worker_size: u16,
    pub max_keys: u16,
    pub target_client_config: Option<ClientConfig>,
    pub tracing_config: Option<TracingConfig>,
    pub show_no_progress: bool,
    pub warn_as_error: bool,
    pub auto_complete_shell: Option<clap_complete::shells::Shell>,
}

impl Config {
    /// Create a `Config` for the given bucket and target date, with every
    /// other field at its CLI default.
    pub fn for_target(bucket: &str, target_date: &str) -> Self {
        Config {
            bucket: bucket.to_string(),
            target_date: target_date.to_string(),
            target_client_config: Some(ClientConfig::default()),
            ..Config::default()
        }
    }

    /// Check that the settings a run cannot do without are present.
    pub fn validate(&self) -> Result<()> {
        if self.bucket.trim().is_empty() || self.target_date.trim().is_empty() {
            return Err(anyhow!(S3PruneError::InvalidConfig(
                ERROR_MESSAGE_REQUIRED.to_string()
            )));
        }
        if self.worker_size == 0 {
            return Err(anyhow!(S3PruneError::InvalidConfig(
                "Worker size must be at least 1.".to_string()
            )));
        }
        if self.max_keys == 0 || DEFAULT_MAX_KEYS < self.max_keys {
            return Err(anyhow!(S3PruneError::InvalidConfig(format!(
                "Max keys must be between 1 and {DEFAULT_MAX_KEYS}."
            ))));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bucket: String::new(),
            target_date: String::new(),
            worker_size: DEFAULT_WORKER_SIZE,
            max_keys: DEFAULT_MAX_KEYS,
            target_client_config: None,
            tracing_config: None,
            show_no_progress: false,
            warn_as_error: false,
            auto_complete_shell: None,
        }
    }
}

/// S3 client configuration.
///
/// `endpoint_url` selects an S3-compatible service; it always implies
/// path-style addressing and requires static credentials.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub credential: S3Credentials,
    pub region: String,
    pub endpoint_url: Option<String>,
    pub force_path_style: bool,
    pub retry_config: RetryConfig,
    pub cli_timeout_config: CLITimeoutConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            credential: S3Credentials::FromEnvironment,
            region: DEFAULT_REGION.to_string(),
            endpoint_url: None,
            force_path_style: false,
            retry_config: RetryConfig::default(),
            cli_timeout_config: CLITimeoutConfig::default(),
        }
    }
}

/// SDK-level retry configuration for individual HTTP requests.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub aws_max_attempts: u32,
    pub initial_backoff_milliseconds: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig {
            aws_max_attempts: 3,
            initial_backoff_milliseconds: 100,
        }
    }
}

/// Timeout configuration for AWS SDK operations.
#[derive(Debug, Clone, Default)]
pub struct CLITimeoutConfig {
    pub operation_timeout_milliseconds: Option<u64>,
    pub operation_attempt_timeout_milliseconds: Option<u64>,
    pub connect_timeout_milliseconds: Option<u64>,
    pub read_timeout_milliseconds: Option<u64>,
}

/// Tracing (logging) configuration.
#[derive(Debug, Clone, Copy)]
pub struct TracingConfig {
    pub tracing_level: log::Level,
    pub json_tracing: bool,
    pub aws_sdk_tracing: bool,
    pub span_events_tracing: bool,
    pub disable_color_tracing: bool,
}
