use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use mk_domain::config::SearchConfig;

use crate::backend::SearchBackend;

/// Per-session search state: the backend plus what the last probe found.
///
/// Owned by the session object and dropped with it; nothing here is
/// process-global.
pub struct SearchHandle {
    backend: Arc<dyn SearchBackend>,
    config: SearchConfig,
    available: AtomicBool,
    has_collection: AtomicBool,
}

impl SearchHandle {
    /// A handle that has not been probed yet reports the tool unavailable.
    pub fn new(backend: Arc<dyn SearchBackend>, config: SearchConfig) -> Self {
        Self {
            backend,
            config,
            available: AtomicBool::new(false),
            has_collection: AtomicBool::new(false),
        }
    }

    pub fn backend(&self) -> &Arc<dyn SearchBackend> {
        &self.backend
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::Relaxed)
    }

    pub fn has_collection(&self) -> bool {
        self.has_collection.load(Ordering::Relaxed)
    }

    /// Stop using the tool until the next probe, e.g. after its binary
    /// vanished mid-session.
    pub fn mark_unavailable(&self) {
        self.available.store(false, Ordering::Relaxed);
    }

    /// Check the tool and provision the collection if missing.
    ///
    /// Safe to call every session. Failures only downgrade the flags.
    pub async fn probe(&self) -> bool {
        if !self.config.enabled {
            self.available.store(false, Ordering::Relaxed);
            return false;
        }

        let available = self.backend.status().await;
        self.available.store(available, Ordering::Relaxed);
        if !available {
            tracing::info!(command = %self.config.command, "search tool not available; relevance injection disabled");
            self.has_collection.store(false, Ordering::Relaxed);
            return false;
        }

        let ready = match self.backend.ensure_collection().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(collection = %self.config.collection, error = %e, "failed to provision search collection");
                false
            }
        };
        self.has_collection.store(ready, Ordering::Relaxed);
        true
    }
}
