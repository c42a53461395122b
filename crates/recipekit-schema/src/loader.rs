use crate::manifest::ManifestError;
use serde_yaml::{Mapping, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, OnceLock, PoisonError};
use tracing::trace;

/// Capacity of the process-wide cache behind [`load_document`].
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Content-addressed memo of parsed documents.
///
/// Entries are keyed by the blake3 digest of the exact input text and never change
/// once inserted, so one cache can be shared by concurrent loaders. The oldest entry
/// is evicted when the cache is full.
#[derive(Debug)]
pub struct ParseCache {
    capacity: usize,
    inner: Mutex<CacheInner>,
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<blake3::Hash, Mapping>,
    order: VecDeque<blake3::Hash>,
}

impl ParseCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(CacheInner::default()),
        }
    }

    /// Parse `text` as a YAML mapping, reusing a previous parse of identical text.
    pub fn load(&self, text: &str) -> Result<Mapping, ManifestError> {
        let key = blake3::hash(text.as_bytes());
        if let Some(hit) = self.lock().entries.get(&key) {
            trace!("parse cache hit {}", &key.to_hex()[..12]);
            return Ok(hit.clone());
        }

        let parsed = parse_document(text)?;

        let mut inner = self.lock();
        if !inner.entries.contains_key(&key) {
            if inner.order.len() >= self.capacity {
                if let Some(oldest) = inner.order.pop_front() {
                    inner.entries.remove(&oldest);
                }
            }
            inner.order.push_back(key);
            inner.entries.insert(key, parsed.clone());
        }
        Ok(parsed)
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheInner> {
        // Entries are immutable once written; a poisoned lock still holds valid data.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ParseCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

fn global_cache() -> &'static ParseCache {
    static CACHE: OnceLock<ParseCache> = OnceLock::new();
    CACHE.get_or_init(ParseCache::default)
}

/// Parse selector-filtered text into a mapping through the process-wide cache.
pub fn load_document(text: &str) -> Result<Mapping, ManifestError> {
    global_cache().load(text)
}

/// Parse without caching. Empty and comment-only documents yield an empty mapping.
pub fn parse_document(text: &str) -> Result<Mapping, ManifestError> {
    let blank = text
        .lines()
        .map(str::trim)
        .all(|l| l.is_empty() || l.starts_with('#'));
    if blank {
        return Ok(Mapping::new());
    }

    match serde_yaml::from_str::<Value>(text)? {
        Value::Null => Ok(Mapping::new()),
        Value::Mapping(m) => Ok(m),
        other => Err(ManifestError::NotAMapping(crate::normalize::value_kind(&other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_mapping() {
        let doc = parse_document("package:\n  name: foo\n  version: 1.0\n").unwrap();
        let package = doc.get("package").and_then(Value::as_mapping).unwrap();
        assert_eq!(package.get("name").and_then(Value::as_str), Some("foo"));
    }

    #[test]
    fn empty_and_comment_only_yield_empty_mapping() {
        assert!(parse_document("").unwrap().is_empty());
        assert!(parse_document("\n\n").unwrap().is_empty());
        assert!(parse_document("# just a comment\n  # another\n").unwrap().is_empty());
    }

    #[test]
    fn top_level_sequence_is_rejected() {
        let err = parse_document("- a\n- b\n").unwrap_err();
        assert!(matches!(err, ManifestError::NotAMapping("sequence")));
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        assert!(parse_document("package: [unclosed\n").is_err());
    }

    #[test]
    fn identical_text_is_parsed_once() {
        let cache = ParseCache::new(8);
        let a = cache.load("a: 1\n").unwrap();
        let b = cache.load("a: 1\n").unwrap();
        assert_eq!(a, b);
        assert_eq!(cache.len(), 1);
        cache.load("a: 2\n").unwrap();
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn cache_evicts_oldest_when_full() {
        let cache = ParseCache::new(2);
        cache.load("a: 1\n").unwrap();
        cache.load("b: 1\n").unwrap();
        cache.load("c: 1\n").unwrap();
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn failed_parses_are_not_cached() {
        let cache = ParseCache::new(4);
        assert!(cache.load("- a\n").is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn cache_is_shareable_across_threads() {
        let cache = std::sync::Arc::new(ParseCache::new(16));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cache = std::sync::Arc::clone(&cache);
                std::thread::spawn(move || cache.load("shared: true\n").unwrap())
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(cache.len(), 1);
    }
}
