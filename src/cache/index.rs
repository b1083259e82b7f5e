//! Ordered key index for backends without a native key scan.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::RwLock;

use crate::cache::entry::unix_now;
use crate::cache::{CacheError, KeyPattern};

/// Tracks every key a backend has written, with its expiry, so pattern
/// removal can find live keys and expired ones can be swept.
#[derive(Debug, Default)]
pub(crate) struct KeyIndex {
    /// Key to expiry as a Unix timestamp in seconds; `None` never expires.
    keys: RwLock<BTreeMap<String, Option<u64>>>,
}

impl KeyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `key`, or move its expiry.
    pub fn insert(&self, key: &str, expires_at: Option<u64>) -> Result<(), CacheError> {
        let mut keys = self
            .keys
            .write()
            .map_err(|e| CacheError::Operation(e.to_string()))?;
        keys.insert(key.to_string(), expires_at);
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<(), CacheError> {
        let mut keys = self
            .keys
            .write()
            .map_err(|e| CacheError::Operation(e.to_string()))?;
        keys.remove(key);
        Ok(())
    }

    pub fn clear(&self) -> Result<(), CacheError> {
        let mut keys = self
            .keys
            .write()
            .map_err(|e| CacheError::Operation(e.to_string()))?;
        keys.clear();
        Ok(())
    }

    /// Live keys matching the pattern, range-scanned from its literal prefix.
    pub fn matching(&self, pattern: &KeyPattern) -> Result<Vec<String>, CacheError> {
        let keys = self
            .keys
            .read()
            .map_err(|e| CacheError::Operation(e.to_string()))?;
        let prefix = pattern.literal_prefix();
        let now = unix_now();
        Ok(keys
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(key, _)| key.starts_with(prefix))
            .filter(|(key, expires_at)| !is_expired(**expires_at, now) && pattern.matches(key))
            .map(|(key, _)| key.clone())
            .collect())
    }

    /// Drop every expired key from the index and return them.
    pub fn take_expired(&self) -> Result<Vec<String>, CacheError> {
        let mut keys = self
            .keys
            .write()
            .map_err(|e| CacheError::Operation(e.to_string()))?;
        let now = unix_now();
        let expired: Vec<String> = keys
            .iter()
            .filter(|(_, expires_at)| is_expired(**expires_at, now))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            keys.remove(key);
        }
        Ok(expired)
    }
}

fn is_expired(expires_at: Option<u64>, now: u64) -> bool {
    expires_at.is_some_and(|exp| now >= exp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_uses_prefix_range() {
        let index = KeyIndex::new();
        for key in ["a:1", "b:1", "b:2", "bb:1", "c:1"] {
            index.insert(key, None).unwrap();
        }

        let pattern = KeyPattern::new("b:*").unwrap();
        assert_eq!(index.matching(&pattern).unwrap(), vec!["b:1", "b:2"]);

        let all = KeyPattern::all();
        assert_eq!(index.matching(&all).unwrap().len(), 5);
    }

    #[test]
    fn test_remove_and_clear() {
        let index = KeyIndex::new();
        index.insert("k1", None).unwrap();
        index.insert("k2", None).unwrap();
        index.remove("k1").unwrap();
        assert_eq!(index.matching(&KeyPattern::all()).unwrap(), vec!["k2"]);
        index.clear().unwrap();
        assert!(index.matching(&KeyPattern::all()).unwrap().is_empty());
    }

    #[test]
    fn test_expired_keys_are_skipped_and_swept() {
        let index = KeyIndex::new();
        let now = unix_now();
        index.insert("q:old", Some(now - 10)).unwrap();
        index.insert("q:live", Some(now + 3600)).unwrap();
        index.insert("q:forever", None).unwrap();

        let pattern = KeyPattern::new("q:*").unwrap();
        assert_eq!(
            index.matching(&pattern).unwrap(),
            vec!["q:forever", "q:live"]
        );

        assert_eq!(index.take_expired().unwrap(), vec!["q:old"]);
        assert!(index.take_expired().unwrap().is_empty());

        // A refreshed expiry revives the key.
        index.insert("q:old", Some(now + 60)).unwrap();
        assert_eq!(index.matching(&pattern).unwrap().len(), 3);
    }
}
