//! Entry options shared by every cache backend.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// How an entry expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiration {
    /// Expires a fixed duration after it was written.
    Absolute(Duration),
    /// Expires after the duration passes without a read; each read resets it.
    Sliding(Duration),
    /// Lives until removed or evicted.
    Never,
}

/// Eviction hint for backends that evict under memory pressure.
///
/// Only the memory backend honours it; disk and redis ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum CachePriority {
    Low,
    #[default]
    Normal,
    High,
    NeverRemove,
}

/// Options attached to a single `set`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryOptions {
    pub expiration: Expiration,
    pub priority: CachePriority,
}

impl EntryOptions {
    pub fn absolute(ttl: Duration) -> Self {
        Self {
            expiration: Expiration::Absolute(ttl),
            priority: CachePriority::Normal,
        }
    }

    pub fn absolute_secs(seconds: u64) -> Self {
        Self::absolute(Duration::from_secs(seconds))
    }

    pub fn sliding(ttl: Duration) -> Self {
        Self {
            expiration: Expiration::Sliding(ttl),
            priority: CachePriority::Normal,
        }
    }

    pub fn never() -> Self {
        Self {
            expiration: Expiration::Never,
            priority: CachePriority::Normal,
        }
    }

    pub fn with_priority(mut self, priority: CachePriority) -> Self {
        self.priority = priority;
        self
    }

    /// The expiration horizon, if any.
    pub fn ttl(&self) -> Option<Duration> {
        match self.expiration {
            Expiration::Absolute(ttl) | Expiration::Sliding(ttl) => Some(ttl),
            Expiration::Never => None,
        }
    }

    pub fn is_sliding(&self) -> bool {
        matches!(self.expiration, Expiration::Sliding(_))
    }
}

/// Serialized envelope used by backends that persist entries outside the
/// process (disk, redis).
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct StoredEntry {
    pub value: Vec<u8>,
    /// Unix timestamp in seconds
    pub expires_at: Option<u64>,
    pub sliding_seconds: Option<u64>,
}

impl StoredEntry {
    pub fn new(value: Vec<u8>, options: &EntryOptions) -> Self {
        let expires_at = options.ttl().map(|ttl| unix_now() + ttl.as_secs());
        let sliding_seconds = match options.expiration {
            Expiration::Sliding(ttl) => Some(ttl.as_secs()),
            _ => None,
        };
        Self {
            value,
            expires_at,
            sliding_seconds,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| unix_now() >= exp)
    }

    /// Push the expiry of a sliding entry forward. Returns true if it moved.
    pub fn touch(&mut self) -> bool {
        match self.sliding_seconds {
            Some(secs) => {
                self.expires_at = Some(unix_now() + secs);
                true
            }
            None => false,
        }
    }
}

pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
