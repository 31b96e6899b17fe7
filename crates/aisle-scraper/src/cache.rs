//! Single-process response memoization for one run.
//!
//! Values are either a fetched HTML body or `None` for "unreachable this
//! run" (negative entry). The first write for a URL wins, so concurrent
//! fetches of the same URL can never make a negative entry oscillate.

use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct ResponseCache {
    inner: Mutex<HashMap<String, Option<String>>>,
}

impl ResponseCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Outer `None`: never fetched. `Some(None)`: known unreachable.
    #[must_use]
    pub fn get(&self, url: &str) -> Option<Option<String>> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(url)
            .cloned()
    }

    /// Record the outcome for a URL. Existing entries are kept as-is.
    pub fn insert(&self, url: &str, body: Option<String>) {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .entry(url.to_string())
            .or_insert(body);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
