//! Coalescing of bursty per-document work.
//!
//! Each key has at most one pending task. Scheduling again restarts the quiet
//! period, so a burst of edits results in a single run after the last one.

use std::future::Future;
use std::hash::Hash;
use std::time::Duration;

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
pub struct Debouncer<K: Eq + Hash> {
    delay: Duration,
    pending: DashMap<K, CancellationToken>,
}

impl<K: Eq + Hash> Debouncer<K> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: DashMap::new(),
        }
    }

    /// Run `task` once `key` has been quiet for the configured delay.
    ///
    /// Any task still pending for `key` is cancelled. Must be called from
    /// within a tokio runtime.
    pub fn schedule<F>(&self, key: K, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        if let Some(previous) = self.pending.insert(key, token.clone()) {
            previous.cancel();
        }

        let delay = self.delay;
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => task.await,
            }
        });
    }

    /// Drop the pending task for `key`, if any.
    pub fn cancel(&self, key: &K) {
        if let Some((_, token)) = self.pending.remove(key) {
            token.cancel();
        }
    }

    /// Cancel every pending task.
    pub fn dispose(&self) {
        self.pending.retain(|_, token| {
            token.cancel();
            false
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_task(counter: &Arc<AtomicUsize>) -> impl Future<Output = ()> + Send + 'static {
        let counter = Arc::clone(counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn burst_runs_once() {
        let debouncer = Debouncer::new(Duration::from_millis(100));
        let runs = Arc::new(AtomicUsize::new(0));

        for _ in 0..5 {
            debouncer.schedule("doc", counting_task(&runs));
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn keys_are_independent() {
        let debouncer = Debouncer::new(Duration::from_millis(50));
        let runs = Arc::new(AtomicUsize::new(0));

        debouncer.schedule("a", counting_task(&runs));
        debouncer.schedule("b", counting_task(&runs));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_and_dispose() {
        let debouncer = Debouncer::new(Duration::from_millis(50));
        let runs = Arc::new(AtomicUsize::new(0));

        debouncer.schedule("a", counting_task(&runs));
        debouncer.cancel(&"a");
        debouncer.schedule("b", counting_task(&runs));
        debouncer.schedule("c", counting_task(&runs));
        debouncer.dispose();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }
}
