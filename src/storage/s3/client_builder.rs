use std::time::Duration;

use aws_config::BehaviorVersion;
use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{Credentials, Region};

use crate::config::ClientConfig;
use crate::types::S3Credentials;

const STATIC_CREDENTIALS_PROVIDER_NAME: &str = "s3prune";

impl ClientConfig {
    /// Build an S3 client from these settings.
    ///
    /// Static credentials replace the default credential chain when present.
    /// A custom endpoint always switches to path-style addressing.
    pub async fn create_client(&self) -> Client {
        let mut config_loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(self.region.clone()))
            .retry_config(self.build_retry_config())
            .timeout_config(self.build_timeout_config());

        if let S3Credentials::Credentials { access_keys } = &self.credential {
            config_loader = config_loader.credentials_provider(Credentials::new(
                access_keys.access_key.clone(),
                access_keys.secret_access_key.clone(),
                None,
                None,
                STATIC_CREDENTIALS_PROVIDER_NAME,
            ));
        }

        let sdk_config = config_loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(self.force_path_style || self.endpoint_url.is_some());
        if let Some(endpoint_url) = &self.endpoint_url {
            builder = builder.endpoint_url(endpoint_url);
        }

        Client::from_conf(builder.build())
    }

    fn build_retry_config(&self) -> RetryConfig {
        RetryConfig::standard()
            .with_max_attempts(self.retry_config.aws_max_attempts)
            .with_initial_backoff(Duration::from_millis(
                self.retry_config.initial_backoff_milliseconds,
            ))
    }

    fn build_timeout_config(&self) -> TimeoutConfig {
        let timeouts = &self.cli_timeout_config;

        let mut builder = TimeoutConfig::builder();
        builder
            .set_operation_timeout(timeouts.operation_timeout_milliseconds.map(Duration::from_millis))
            .set_operation_attempt_timeout(
                timeouts
                    .operation_attempt_timeout_milliseconds
                    .map(Duration::from_millis),
            )
            .set_connect_timeout(timeouts.connect_timeout_milliseconds.map(Duration::from_millis))
            .set_read_timeout(timeouts.read_timeout_milliseconds.map(Duration::from_millis));
        builder.build()
    }
}
