//! Per-domain pattern set cache.
//!
//! Pattern compilation is comparatively expensive and every request to the
//! same domain needs the same compiled forms, so sets are compiled once and
//! shared. The map is keyed by domain: a set handed out for `a.com` can never
//! carry the patterns of `b.com`.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

use crate::error::ProxyError;
use crate::observability::metrics;
use crate::rewrite::patterns::PatternSet;

/// A thread-safe, domain-keyed store of compiled pattern sets.
pub struct PatternCache {
    sets: DashMap<String, Arc<PatternSet>>,
    /// Soft bound on cached domains; only unleased sets are evicted.
    capacity: usize,
}

impl PatternCache {
    /// Create an empty cache holding up to `capacity` domains.
    pub fn new(capacity: usize) -> Self {
        Self {
            sets: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Get the pattern set for `domain`, compiling it on first use.
    ///
    /// Concurrent misses for the same domain compile once: the entry's shard
    /// stays locked while the winner compiles.
    pub fn acquire(&self, domain: &str) -> Result<Arc<PatternSet>, ProxyError> {
        if let Some(set) = self.sets.get(domain) {
            metrics::record_pattern_cache("hit");
            return Ok(Arc::clone(set.value()));
        }

        if self.sets.len() >= self.capacity {
            self.evict_idle();
        }

        let set = match self.sets.entry(domain.to_string()) {
            Entry::Occupied(entry) => {
                metrics::record_pattern_cache("hit");
                Arc::clone(entry.get())
            }
            Entry::Vacant(entry) => {
                let set = Arc::new(PatternSet::compile(domain)?);
                entry.insert(Arc::clone(&set));
                metrics::record_pattern_cache("miss");
                tracing::debug!(domain = %domain, "Compiled URL patterns");
                set
            }
        };

        metrics::record_pattern_cache_size(self.sets.len());
        Ok(set)
    }

    /// Hand a set back after a response has been rewritten.
    ///
    /// The set stays cached for later requests; dropping the lease only makes
    /// it eligible for eviction once no other request holds it.
    pub fn release(&self, set: Arc<PatternSet>) {
        tracing::trace!(domain = %set.domain(), "Released URL patterns");
        drop(set);
    }

    /// Number of cached domains.
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Drop every set that no request currently holds.
    fn evict_idle(&self) {
        let before = self.sets.len();
        self.sets.retain(|_, set| Arc::strong_count(set) > 1);
        tracing::debug!(
            evicted = before.saturating_sub(self.sets.len()),
            remaining = self.sets.len(),
            "Evicted idle URL pattern sets"
        );
    }
}

impl Default for PatternCache {
    fn default() -> Self {
        Self::new(1024)
    }
}
