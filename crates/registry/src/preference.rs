//! Persisted provider preferences.
//!
//! A preference store maps `(operation, flag)` to a pinned provider id. The
//! registry only reads it; writing (a settings UI, a config file) lives
//! elsewhere.

use std::collections::HashMap;

/// Read-only lookup of pinned providers.
pub trait PreferenceStore: Send + Sync {
    fn lookup(&self, operation: &str, flag: &str) -> Option<String>;
}

/// The empty store: nothing is ever pinned.
pub struct NoPreferences;

impl PreferenceStore for NoPreferences {
    fn lookup(&self, _operation: &str, _flag: &str) -> Option<String> {
        None
    }
}

/// A map-backed store for tests and programmatic setup.
#[derive(Debug, Default)]
pub struct InMemoryPreferences {
    entries: HashMap<(String, String), String>,
}

impl InMemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, operation: &str, flag: &str, provider_id: &str) {
        self.entries.insert(
            (operation.to_string(), flag.to_string()),
            provider_id.to_string(),
        );
    }
}

impl PreferenceStore for InMemoryPreferences {
    fn lookup(&self, operation: &str, flag: &str) -> Option<String> {
        self.entries
            .get(&(operation.to_string(), flag.to_string()))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_lookup_hits_and_misses() {
        let mut store = InMemoryPreferences::new();
        store.insert("render", "local", "pinned");

        assert_eq!(store.lookup("render", "local"), Some("pinned".into()));
        assert_eq!(store.lookup("render", "fast"), None);
        assert_eq!(store.lookup("other", "local"), None);
    }

    #[test]
    fn no_preferences_always_misses() {
        assert_eq!(NoPreferences.lookup("render", "local"), None);
    }
}
