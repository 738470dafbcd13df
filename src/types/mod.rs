use std::fmt;
use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use aws_sdk_s3::primitives::DateTime;
use aws_sdk_s3::types::Object;
use zeroize_derive::{Zeroize, ZeroizeOnDrop};

pub mod error;
pub mod token;

/// An entry returned by the bucket listing.
///
/// Read-only snapshot of the listed object. Only the key and the
/// last-modified time take part in deletion decisions.
#[derive(Debug, Clone, PartialEq)]
pub struct S3Object(Object);

impl S3Object {
    pub fn new(object: Object) -> Self {
        Self(object)
    }

    pub fn key(&self) -> Option<&str> {
        self.0.key()
    }

    pub fn last_modified(&self) -> Option<&DateTime> {
        self.0.last_modified()
    }
}

impl From<Object> for S3Object {
    fn from(object: Object) -> Self {
        Self::new(object)
    }
}

/// One page of a bucket listing.
///
/// `next_continuation_token` is `None` on the last page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectPage {
    pub objects: Vec<S3Object>,
    pub next_continuation_token: Option<String>,
}

/// Keys submitted together to a single bulk-delete call.
///
/// Assembled by the scanner and handed over to exactly one deletion worker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionBatch {
    keys: Vec<String>,
}

impl DeletionBatch {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            keys: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, key: impl Into<String>) {
        self.keys.push(key.into());
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn into_keys(self) -> Vec<String> {
        self.keys
    }
}

impl From<Vec<String>> for DeletionBatch {
    fn from(keys: Vec<String>) -> Self {
        Self { keys }
    }
}

/// Progress observations sent through the stats channel during a run.
#[derive(Debug, PartialEq)]
pub enum DeletionStatistics {
    /// A listing page has been scanned.
    ObjectsListed { listed: u64, matched: u64 },
    /// A bulk-delete call succeeded for `count` objects.
    DeleteComplete { count: u64 },
    /// A bulk-delete call failed; `count` objects were not deleted.
    DeleteError { count: u64 },
    /// The store reported a failure for an individual key.
    DeleteWarning { key: String },
}

/// Process-lifetime counters shared by the scanner and all deletion workers.
///
/// Every field is an atomic so workers never need a lock to account for
/// their batches.
#[derive(Debug, Default)]
pub struct DeletionStatsReport {
    listed_objects: AtomicU64,
    candidate_objects: AtomicU64,
    deleted_objects: AtomicU64,
    failed_objects: AtomicU64,
    dispatched_batches: AtomicU64,
}

impl DeletionStatsReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listed(&self, count: u64) {
        self.listed_objects.fetch_add(count, Ordering::SeqCst);
    }

    pub fn increment_candidates(&self) {
        self.candidate_objects.fetch_add(1, Ordering::SeqCst);
    }

    pub fn add_deleted(&self, count: u64) {
        self.deleted_objects.fetch_add(count, Ordering::SeqCst);
    }

    pub fn add_failed(&self, count: u64) {
        self.failed_objects.fetch_add(count, Ordering::SeqCst);
    }

    pub fn increment_dispatched_batches(&self) {
        self.dispatched_batches.fetch_add(1, Ordering::SeqCst);
    }

    pub fn snapshot(&self, duration: Duration) -> DeletionStats {
        DeletionStats {
            stats_listed_objects: self.listed_objects.load(Ordering::SeqCst),
            stats_candidate_objects: self.candidate_objects.load(Ordering::SeqCst),
            stats_deleted_objects: self.deleted_objects.load(Ordering::SeqCst),
            stats_failed_objects: self.failed_objects.load(Ordering::SeqCst),
            stats_dispatched_batches: self.dispatched_batches.load(Ordering::SeqCst),
            duration,
        }
    }
}

/// Point-in-time copy of [`DeletionStatsReport`] plus the elapsed run time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionStats {
    pub stats_listed_objects: u64,
    pub stats_candidate_objects: u64,
    pub stats_deleted_objects: u64,
    pub stats_failed_objects: u64,
    pub stats_dispatched_batches: u64,
    pub duration: Duration,
}

/// Credentials used to sign requests to the object store.
#[derive(Debug, Clone)]
pub enum S3Credentials {
    Credentials { access_keys: AccessKeys },
    FromEnvironment,
}

/// Static access key pair.
///
/// The secret is cleared from memory on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct AccessKeys {
    pub access_key: String,
    pub secret_access_key: String,
}

impl Debug for AccessKeys {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessKeys")
            .field("access_key", &self.access_key)
            .field("secret_access_key", &"** redacted **")
            .finish()
    }
}
