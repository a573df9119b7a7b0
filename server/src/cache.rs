//! In-memory content hashes for the downloaded boundary files.
//!
//! Hashes are derived from file bytes, never from paths or mtimes, so a
//! re-download of identical content keeps the same version token. Nothing
//! here is persisted; the map is rebuilt lazily as files are read.

use std::collections::HashMap;

use sha2::{Digest, Sha256};

/// Length of the truncated hex digest used as a version token.
pub const HASH_LEN: usize = 12;

pub fn content_hash(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    let mut hex = format!("{digest:x}");
    hex.truncate(HASH_LEN);
    hex
}

#[derive(Default, Debug)]
pub struct ContentCache {
    file_hashes: HashMap<String, String>,
}

impl ContentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute the hash for `filename` from `data`, store it, and return it.
    pub fn update_file_hash(&mut self, filename: &str, data: &[u8]) -> String {
        let hash = content_hash(data);
        self.file_hashes.insert(filename.to_string(), hash.clone());
        hash
    }

    pub fn file_hash(&self, filename: &str) -> Option<&str> {
        self.file_hashes.get(filename).map(String::as_str)
    }

    /// Combined version over every tracked file: the per-file hashes are
    /// sorted, concatenated, and hashed again, so the token changes whenever
    /// any file's content changes, regardless of which one.
    pub fn data_version(&self) -> Option<String> {
        if self.file_hashes.is_empty() {
            return None;
        }

        let mut hashes: Vec<&str> = self.file_hashes.values().map(String::as_str).collect();
        hashes.sort_unstable();

        Some(content_hash(hashes.concat().as_bytes()))
    }

    pub fn clear(&mut self) {
        self.file_hashes.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.file_hashes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic_and_content_sensitive() {
        let a = content_hash(b"{\"type\":\"FeatureCollection\"}");
        let b = content_hash(b"{\"type\":\"FeatureCollection\"}");
        let c = content_hash(b"{\"type\":\"FeatureCollectioN\"}");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), HASH_LEN);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn update_returns_stored_hash() {
        let mut cache = ContentCache::new();

        let hash = cache.update_file_hash("countries.json", b"data");
        assert_eq!(cache.file_hash("countries.json"), Some(hash.as_str()));
        assert_eq!(cache.file_hash("states.json"), None);
    }

    #[test]
    fn data_version_tracks_any_file_change() {
        let mut cache = ContentCache::new();
        assert_eq!(cache.data_version(), None);

        cache.update_file_hash("countries.json", b"aaa");
        cache.update_file_hash("states.json", b"bbb");
        let v1 = cache.data_version().unwrap();
        assert_eq!(v1.len(), HASH_LEN);

        // Unrelated file changes still move the combined version.
        cache.update_file_hash("states.json", b"ccc");
        let v2 = cache.data_version().unwrap();
        assert_ne!(v1, v2);

        // Re-hashing identical content keeps it stable.
        cache.update_file_hash("states.json", b"ccc");
        assert_eq!(cache.data_version().unwrap(), v2);
    }

    #[test]
    fn version_is_independent_of_update_order() {
        let mut first = ContentCache::new();
        first.update_file_hash("a.json", b"one");
        first.update_file_hash("b.json", b"two");

        let mut second = ContentCache::new();
        second.update_file_hash("b.json", b"two");
        second.update_file_hash("a.json", b"one");

        assert_eq!(first.data_version(), second.data_version());
    }

    #[test]
    fn clear_resets_everything() {
        let mut cache = ContentCache::new();
        cache.update_file_hash("countries.json", b"data");

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.data_version(), None);
        assert_eq!(cache.file_hash("countries.json"), None);
    }
}
