// Session-unique upload identifiers.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::request::UploadOptions;
use crate::config::UID_PREFIX;

/// One issued identifier. Orders by issue sequence within a session.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UploadUid {
    prefix: Arc<str>,
    seq: u64,
}

impl UploadUid {
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

impl fmt::Display for UploadUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.prefix, self.seq)
    }
}

/// Issues identifiers unique for the lifetime of one process session: a
/// prefix fixed at construction from the session start time, followed by an
/// incrementing counter. Create one per host and share it by reference.
pub struct UploadUidGenerator {
    prefix: Arc<str>,
    counter: AtomicU64,
}

impl UploadUidGenerator {
    pub fn new() -> Self {
        let started = chrono::Utc::now().timestamp_millis();
        Self::with_prefix(format!("{}{}", UID_PREFIX, started))
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Arc::from(prefix.into()),
            counter: AtomicU64::new(0),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn next(&self) -> UploadUid {
        let seq = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        UploadUid {
            prefix: Arc::clone(&self.prefix),
            seq,
        }
    }

    /// Next identifier as a plain string token.
    pub fn next_token(&self) -> String {
        self.next().to_string()
    }

    /// Add a fresh `<uid> = 1` field to a file's options so the endpoint
    /// never sees two identical requests.
    pub fn stamp(&self, options: &mut UploadOptions) -> UploadUid {
        let uid = self.next();
        options.data.insert(uid.to_string(), 1);
        uid
    }
}

impl Default for UploadUidGenerator {
    fn default() -> Self {
        Self::new()
    }
}
