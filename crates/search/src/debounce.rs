//! Debounced re-indexing.
//!
//! Every memory write calls [`Reindexer::schedule`]; only the last call in a
//! burst actually runs `update` once the delay has elapsed quietly.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::task::JoinHandle;

use mk_domain::trace::TraceEvent;

use crate::backend::SearchBackend;

pub struct Reindexer {
    backend: Arc<dyn SearchBackend>,
    delay: Duration,
    embed: bool,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Reindexer {
    pub fn new(backend: Arc<dyn SearchBackend>, delay: Duration, embed: bool) -> Self {
        Self {
            backend,
            delay,
            embed,
            pending: Mutex::new(None),
        }
    }

    /// Schedule a re-index after the quiet period, replacing any pending one.
    ///
    /// Returns `true` when an earlier pending run was replaced. Must be
    /// called from within a tokio runtime.
    pub fn schedule(&self) -> bool {
        let backend = Arc::clone(&self.backend);
        let delay = self.delay;
        let embed = self.embed;

        let mut pending = self.pending.lock();
        let replaced = match pending.take() {
            Some(prev) if !prev.is_finished() => {
                prev.abort();
                true
            }
            _ => false,
        };

        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            run_update(backend.as_ref(), embed).await;
        }));

        TraceEvent::ReindexScheduled {
            delay_ms: delay.as_millis() as u64,
            replaced_pending: replaced,
        }
        .emit();
        replaced
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Drop the pending run, if any. Returns whether one was cancelled.
    pub fn cancel(&self) -> bool {
        match self.pending.lock().take() {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                tracing::debug!("pending reindex cancelled");
                true
            }
            _ => false,
        }
    }

    /// Run a pending re-index now instead of waiting out the delay.
    ///
    /// Used by short-lived callers (the CLI) that would otherwise exit
    /// before the timer fires.
    pub async fn flush(&self) -> bool {
        if !self.cancel() {
            return false;
        }
        run_update(self.backend.as_ref(), self.embed).await;
        true
    }
}

impl Drop for Reindexer {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.get_mut().take() {
            handle.abort();
        }
    }
}

async fn run_update(backend: &dyn SearchBackend, embed: bool) {
    let started = Instant::now();
    let ok = match backend.update(embed).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "memory reindex failed");
            false
        }
    };
    TraceEvent::ReindexCompleted {
        ok,
        duration_ms: started.elapsed().as_millis() as u64,
    }
    .emit();
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use mk_domain::config::SearchMode;

    use super::*;
    use crate::error::SearchError;
    use crate::normalize::SearchSnippet;

    #[derive(Default)]
    struct CountingBackend {
        updates: AtomicUsize,
        embeds: AtomicUsize,
    }

    #[async_trait]
    impl SearchBackend for CountingBackend {
        async fn status(&self) -> bool {
            true
        }
        async fn has_collection(&self) -> Result<bool, SearchError> {
            Ok(true)
        }
        async fn ensure_collection(&self) -> Result<(), SearchError> {
            Ok(())
        }
        async fn search(
            &self,
            _mode: SearchMode,
            _query: &str,
            _limit: usize,
        ) -> Result<Vec<SearchSnippet>, SearchError> {
            Ok(Vec::new())
        }
        async fn update(&self, embed: bool) -> Result<(), SearchError> {
            self.updates.fetch_add(1, Ordering::SeqCst);
            if embed {
                self.embeds.fetch_add(1, Ordering::SeqCst);
            }
            Ok(())
        }
    }

    fn reindexer(embed: bool) -> (Arc<CountingBackend>, Reindexer) {
        let backend = Arc::new(CountingBackend::default());
        let r = Reindexer::new(backend.clone(), Duration::from_millis(500), embed);
        (backend, r)
    }

    #[tokio::test(start_paused = true)]
    async fn burst_collapses_to_one_update() {
        let (backend, r) = reindexer(false);
        assert!(!r.schedule());
        for _ in 0..4 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            assert!(r.schedule());
        }
        assert!(r.is_pending());

        tokio::time::sleep(Duration::from_millis(499)).await;
        assert_eq!(backend.updates.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(backend.updates.load(Ordering::SeqCst), 1);
        assert!(!r.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn spaced_writes_each_reindex() {
        let (backend, r) = reindexer(true);
        r.schedule();
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(!r.schedule());
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(backend.updates.load(Ordering::SeqCst), 2);
        assert_eq!(backend.embeds.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_update() {
        let (backend, r) = reindexer(false);
        r.schedule();
        assert!(r.cancel());
        assert!(!r.cancel());
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(backend.updates.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn flush_runs_pending_immediately() {
        let (backend, r) = reindexer(false);
        assert!(!r.flush().await);
        r.schedule();
        assert!(r.flush().await);
        assert_eq!(backend.updates.load(Ordering::SeqCst), 1);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(backend.updates.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_cancels_pending() {
        let (backend, r) = reindexer(false);
        r.schedule();
        drop(r);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(backend.updates.load(Ordering::SeqCst), 0);
    }
}
