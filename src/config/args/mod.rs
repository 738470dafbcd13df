use crate::config::{
    CLITimeoutConfig, ClientConfig, Config, DEFAULT_MAX_KEYS, DEFAULT_REGION, DEFAULT_WORKER_SIZE,
    RetryConfig, TracingConfig,
};
use crate::types::{AccessKeys, S3Credentials};
use clap::Parser;
use clap::builder::NonEmptyStringValueParser;
use clap_verbosity_flag::{Verbosity, WarnLevel};
use std::ffi::OsString;

mod value_parser;


const DEFAULT_AWS_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_INITIAL_BACKOFF_MILLISECONDS: u64 = 100;
const DEFAULT_JSON_TRACING: bool = false;
const DEFAULT_AWS_SDK_TRACING: bool = false;
const DEFAULT_SPAN_EVENTS_TRACING: bool = false;
const DEFAULT_DISABLE_COLOR_TRACING: bool = false;
const DEFAULT_WARN_AS_ERROR: bool = false;
const DEFAULT_FORCE_PATH_STYLE: bool = false;
const DEFAULT_SHOW_NO_PROGRESS: bool = false;

const ERROR_MESSAGE_WORKER_SIZE_ZERO: &str = "Worker size must be at least 1.";
const ERROR_MESSAGE_MAX_KEYS_ZERO: &str = "Max keys must be at least 1.";
const ERROR_MESSAGE_MAX_KEYS_TOO_LARGE: &str = "Max keys must be at most 1000 (S3 API limit).";

/// s3prune - Delete every object in an S3 bucket last modified before a date.
///
/// Example:
///   s3prune --bucket my-bucket --date 2024-01-01
///   s3prune --bucket my-bucket --date 2024-01-01T00:00:00Z --workers 32
///   s3prune --bucket my-bucket --date 2024-01-01 --endpoint http://localhost:9000 \
///     --access-key minio --secret-key minio123
#[derive(Parser, Clone, Debug)]
#[command(name = "s3prune", version, about, long_about = None)]
pub struct CLIArgs {
    /// Bucket to prune.
    #[arg(long, env, value_parser = NonEmptyStringValueParser::new(), help_heading = "General")]
    pub bucket: Option<String>,

    #[arg(
        long,
        env,
        help_heading = "General",
        long_help = r#"Delete objects last modified strictly before this date.
Accepted formats: RFC3339, YYYY-MM-DD, YYYY-MM-DDTHH:MM:SS, YYYY-MM-DD HH:MM:SS,
RFC822, RFC850, RFC1123, RFC1123Z. Dates without a zone are read as UTC.

Example: 2024-01-01T00:00:00Z"#
    )]
    pub date: Option<String>,

    /// Don't show the progress line and per-batch messages.
    #[arg(long, env, default_value_t = DEFAULT_SHOW_NO_PROGRESS, help_heading = "General")]
    pub show_no_progress: bool,

    /// Number of concurrent deletion workers.
    #[arg(long, env, default_value_t = DEFAULT_WORKER_SIZE, help_heading = "Performance")]
    pub workers: u16,

    /// Objects per listing page and keys per delete request (1-1000).
    #[arg(long, env, default_value_t = DEFAULT_MAX_KEYS, help_heading = "Performance")]
    pub max_keys: u16,

    #[arg(
        long,
        env,
        value_parser = value_parser::url::check_scheme,
        help_heading = "AWS",
        long_help = r#"Custom S3-compatible endpoint URL (e.g. MinIO).
Implies path-style addressing and requires --access-key and --secret-key."#
    )]
    pub endpoint: Option<String>,

    /// AWS region.
    #[arg(long, env, default_value = DEFAULT_REGION, value_parser = NonEmptyStringValueParser::new(), help_heading = "AWS")]
    pub region: String,

    /// Access key ID.
    #[arg(long, env, value_parser = NonEmptyStringValueParser::new(), help_heading = "AWS")]
    pub access_key: Option<String>,

    /// Secret access key.
    #[arg(long, env, value_parser = NonEmptyStringValueParser::new(), help_heading = "AWS")]
    pub secret_key: Option<String>,

    /// Force path-style addressing.
    #[arg(long, env, default_value_t = DEFAULT_FORCE_PATH_STYLE, help_heading = "AWS")]
    pub force_path_style: bool,

    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Output logs in JSON format.
    #[arg(long, env, default_value_t = DEFAULT_JSON_TRACING, help_heading = "Logging")]
    pub json_tracing: bool,

    /// Enable AWS SDK tracing.
    #[arg(long, env, default_value_t = DEFAULT_AWS_SDK_TRACING, help_heading = "Logging")]
    pub aws_sdk_tracing: bool,

    /// Enable tracing span events.
    #[arg(long, env, default_value_t = DEFAULT_SPAN_EVENTS_TRACING, help_heading = "Logging")]
    pub span_events_tracing: bool,

    /// Disable colored output in logs.
    #[arg(long, env, default_value_t = DEFAULT_DISABLE_COLOR_TRACING, help_heading = "Logging")]
    pub disable_color_tracing: bool,

    /// Maximum attempts of a single AWS SDK request.
    #[arg(long, env, default_value_t = DEFAULT_AWS_MAX_ATTEMPTS, help_heading = "Retry")]
    pub aws_max_attempts: u32,

    /// Initial backoff in milliseconds for SDK retries.
    #[arg(long, env, default_value_t = DEFAULT_INITIAL_BACKOFF_MILLISECONDS, help_heading = "Retry")]
    pub initial_backoff_milliseconds: u64,

    /// Overall operation timeout in milliseconds.
    #[arg(long, env, help_heading = "Timeout")]
    pub operation_timeout_milliseconds: Option<u64>,

    /// Per-attempt operation timeout in milliseconds.
    #[arg(long, env, help_heading = "Timeout")]
    pub operation_attempt_timeout_milliseconds: Option<u64>,

    /// Connection timeout in milliseconds.
    #[arg(long, env, help_heading = "Timeout")]
    pub connect_timeout_milliseconds: Option<u64>,

    /// Read timeout in milliseconds.
    #[arg(long, env, help_heading = "Timeout")]
    pub read_timeout_milliseconds: Option<u64>,

    /// Exit with an error when any object could not be deleted.
    #[arg(long, env, default_value_t = DEFAULT_WARN_AS_ERROR, help_heading = "Advanced")]
    pub warn_as_error: bool,

    /// Generate shell completions.
    #[arg(long, env, help_heading = "Advanced")]
    pub auto_complete_shell: Option<clap_complete::shells::Shell>,
}

/// Parse command-line arguments into a `CLIArgs` struct.
///
/// # Example
///
/// ```
/// use s3prune_rs::config::args::parse_from_args;
///
/// let args = vec!["s3prune", "--bucket", "my-bucket", "--date", "2024-01-01"];
/// let cli_args = parse_from_args(args).unwrap();
/// assert_eq!(cli_args.bucket.as_deref(), Some("my-bucket"));
/// assert_eq!(cli_args.workers, 10);
/// ```
pub fn parse_from_args<I, T>(args: I) -> Result<CLIArgs, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    CLIArgs::try_parse_from(args)
}

/// Parse arguments and build a Config in one step.
pub fn build_config_from_args<I, T>(args: I) -> Result<Config, String>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli_args = CLIArgs::try_parse_from(args).map_err(|e| e.to_string())?;
    Config::try_from(cli_args)
}

impl CLIArgs {
    fn validate(&self) -> Result<(), String> {
        if self.workers == 0 {
            return Err(ERROR_MESSAGE_WORKER_SIZE_ZERO.to_string());
        }
        if self.max_keys == 0 {
            return Err(ERROR_MESSAGE_MAX_KEYS_ZERO.to_string());
        }
        if DEFAULT_MAX_KEYS < self.max_keys {
            return Err(ERROR_MESSAGE_MAX_KEYS_TOO_LARGE.to_string());
        }
        Ok(())
    }

    fn build_client_config(&self) -> ClientConfig {
        // A lone key is not enough to sign requests; fall back to the default chain.
        let credential = match (&self.access_key, &self.secret_key) {
            (Some(access_key), Some(secret_key)) => S3Credentials::Credentials {
                access_keys: AccessKeys {
                    access_key: access_key.clone(),
                    secret_access_key: secret_key.clone(),
                },
            },
            _ => S3Credentials::FromEnvironment,
        };

        ClientConfig {
            credential,
            region: self.region.clone(),
            endpoint_url: self.endpoint.clone(),
            force_path_style: self.force_path_style || self.endpoint.is_some(),
            retry_config: RetryConfig {
                aws_max_attempts: self.aws_max_attempts,
                initial_backoff_milliseconds: self.initial_backoff_milliseconds,
            },
            cli_timeout_config: CLITimeoutConfig {
                operation_timeout_milliseconds: self.operation_timeout_milliseconds,
                operation_attempt_timeout_milliseconds: self.operation_attempt_timeout_milliseconds,
                connect_timeout_milliseconds: self.connect_timeout_milliseconds,
                read_timeout_milliseconds: self.read_timeout_milliseconds,
            },
        }
    }

    fn build_tracing_config(&self) -> Option<TracingConfig> {
        let log_level = self.verbosity.log_level()?;

        Some(TracingConfig {
            tracing_level: log_level,
            json_tracing: self.json_tracing,
            aws_sdk_tracing: self.aws_sdk_tracing,
            span_events_tracing: self.span_events_tracing,
            disable_color_tracing: self.disable_color_tracing,
        })
    }
}

impl TryFrom<CLIArgs> for Config {
    type Error = String;

    /// Bucket and date stay unchecked here; a missing value surfaces as an
    /// invalid-configuration error when the pipeline starts.
    fn try_from(args: CLIArgs) -> Result<Self, Self::Error> {
        args.validate()?;

        let target_client_config = Some(args.build_client_config());
        let tracing_config = args.build_tracing_config();

        Ok(Config {
            bucket: args.bucket.unwrap_or_default(),
            target_date: args.date.unwrap_or_default(),
            worker_size: args.workers,
            max_keys: args.max_keys,
            target_client_config,
            tracing_config,
            show_no_progress: args.show_no_progress,
            warn_as_error: args.warn_as_error,
            auto_complete_shell: args.auto_complete_shell,
        })
    }
}
