//! Modified-time "before" filter.
//!
//! Passes objects whose last_modified time is strictly before the cutoff.

use aws_smithy_types_convert::date_time::DateTimeExt;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::types::S3Object;

const FILTER_NAME: &str = "MtimeBeforeFilter";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MtimeBeforeFilter {
    cutoff: DateTime<Utc>,
}

impl MtimeBeforeFilter {
    pub fn new(cutoff: DateTime<Utc>) -> Self {
        Self { cutoff }
    }

    /// Whether `object` is a deletion candidate.
    ///
    /// An object equal to the cutoff is kept. Entries without a key or a
    /// last-modified time are never candidates.
    pub fn is_match(&self, object: &S3Object) -> bool {
        let Some(key) = object.key() else {
            debug!(name = FILTER_NAME, "object without key filtered.");
            return false;
        };

        let Some(last_modified) = object
            .last_modified()
            .and_then(|last_modified| last_modified.to_chrono_utc().ok())
        else {
            debug!(
                name = FILTER_NAME,
                key = key,
                "object without usable last_modified filtered."
            );
            return false;
        };

        if self.cutoff <= last_modified {
            debug!(
                name = FILTER_NAME,
                key = key,
                last_modified = last_modified.to_rfc3339(),
                config_time = self.cutoff.to_rfc3339(),
                "object filtered."
            );
            return false;
        }

        true
    }
}
