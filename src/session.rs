use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

/// Everything needed to re-issue the authenticated upstream request for one
/// resolved media entry. Immutable once inserted into the cache.
#[derive(Debug, Clone)]
pub struct StreamSession {
    pub upstream_url: String,
    pub headers: HashMap<String, String>,
    pub cookies: HashMap<String, String>,
    pub title: String,
    pub ext: Option<String>,
}

/// Process-wide handle → session table.
///
/// Handles are UUIDv4 strings, so collisions are cryptographically
/// negligible. There is no eviction and no delete path; entries live until
/// the process exits.
#[derive(Default)]
pub struct SessionCache {
    sessions: DashMap<String, Arc<StreamSession>>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Insert a session under a freshly generated handle and return the
    /// handle. The entry is fully visible to readers once this returns.
    pub fn put(&self, session: StreamSession) -> String {
        let handle = Uuid::new_v4().to_string();
        self.sessions.insert(handle.clone(), Arc::new(session));
        handle
    }

    /// Clones the Arc out so no map guard outlives the call; callers are
    /// free to hold the session across await points.
    pub fn get(&self, handle: &str) -> Option<Arc<StreamSession>> {
        self.sessions.get(handle).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
