//! Whole-response cache for the global feed.
//!
//! Entries live for a fixed TTL from the moment they are stored and are served
//! as-is until then, even if the posts behind them changed. `clear` drops
//! everything at once.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use actix_web::web::Bytes;
use parking_lot::RwLock;
use tracing::debug;

use crate::domain::error::DomainError;

pub const DEFAULT_PAGE_TTL: Duration = Duration::from_secs(20 * 60);

/// Key-value store for rendered bodies. `set` replaces a single key
/// atomically and `clear` empties the whole store atomically, so a reader
/// sees either an entry or nothing, never a half-cleared cache.
pub trait PageCache: Send + Sync {
    fn get(&self, key: &str) -> Option<Bytes>;
    fn set(&self, key: &str, body: Bytes, ttl: Duration);
    fn clear(&self);
}

struct CachedPage {
    body: Bytes,
    expires_at: Instant,
}

#[derive(Default)]
pub struct InMemoryPageCache {
    entries: RwLock<HashMap<String, CachedPage>>,
}

impl InMemoryPageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PageCache for InMemoryPageCache {
    fn get(&self, key: &str) -> Option<Bytes> {
        let entries = self.entries.read();
        entries
            .get(key)
            .filter(|page| Instant::now() < page.expires_at)
            .map(|page| page.body.clone())
    }

    fn set(&self, key: &str, body: Bytes, ttl: Duration) {
        let now = Instant::now();
        let mut entries = self.entries.write();
        entries.retain(|_, page| now < page.expires_at);
        entries.insert(
            key.to_string(),
            CachedPage {
                body,
                expires_at: now + ttl,
            },
        );
    }

    fn clear(&self) {
        self.entries.write().clear();
    }
}

/// The cache as handed to request handlers: a store plus the TTL pages are
/// kept for.
#[derive(Clone)]
pub struct ResponseCache {
    store: Arc<dyn PageCache>,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(store: Arc<dyn PageCache>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Serves `key` from the cache, or renders it and stores the result.
    /// Failed renders are never stored.
    pub async fn get_or_render<F, Fut>(&self, key: &str, render: F) -> Result<Bytes, DomainError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Bytes, DomainError>>,
    {
        if let Some(body) = self.store.get(key) {
            debug!(key, "page cache hit");
            return Ok(body);
        }

        debug!(key, "page cache miss");
        let body = render().await?;
        self.store.set(key, body.clone(), self.ttl);
        Ok(body)
    }

    pub fn clear(&self) {
        self.store.clear();
        debug!("page cache cleared");
    }
}
