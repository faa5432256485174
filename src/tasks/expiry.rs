//! Expiry Task
//!
//! Background task that removes each cache entry once its lifetime has passed.
//!
//! Every successful `put` sends one [`ExpiryRequest`] over an unbounded
//! channel. The task keeps pending requests in a min-heap ordered by
//! deadline and sleeps until the earliest one is due, so all expirations
//! run on a single execution lane.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Weak;

use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info};

/// A deferred removal scheduled by one insertion.
#[derive(Debug)]
pub struct ExpiryRequest<K> {
    pub key: K,
    /// Generation of the entry this request was created for
    pub generation: u64,
    pub deadline: Instant,
}

// BinaryHeap is a max-heap; order is reversed so the earliest deadline pops first.
impl<K> PartialEq for ExpiryRequest<K> {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.generation == other.generation
    }
}

impl<K> Eq for ExpiryRequest<K> {}

impl<K> PartialOrd for ExpiryRequest<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K> Ord for ExpiryRequest<K> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.generation.cmp(&self.generation))
    }
}

/// Target of expiry actions.
pub trait ExpirySink<K>: Send + Sync + 'static {
    /// Removes `key` only if its stored entry still carries `generation`.
    ///
    /// Returns true if an entry was removed.
    fn expire(&self, key: &K, generation: u64) -> bool;
}

/// Spawns the expiry task on `handle`.
///
/// The task exits when `shutdown` flips to true, when every request sender
/// is dropped, or when the sink has been dropped.
pub fn spawn_expiry_task<K, S>(
    handle: &Handle,
    sink: Weak<S>,
    mut requests: mpsc::UnboundedReceiver<ExpiryRequest<K>>,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()>
where
    K: Send + 'static,
    S: ExpirySink<K>,
{
    handle.spawn(async move {
        info!("Starting cache expiry task");
        let mut pending: BinaryHeap<ExpiryRequest<K>> = BinaryHeap::new();

        loop {
            let next_deadline = pending.peek().map(|req| req.deadline);
            let wake_at = next_deadline.unwrap_or_else(Instant::now);

            tokio::select! {
                biased;

                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                request = requests.recv() => match request {
                    Some(request) => pending.push(request),
                    None => break,
                },
                _ = sleep_until(wake_at), if next_deadline.is_some() => {
                    let Some(sink) = sink.upgrade() else {
                        break;
                    };
                    let now = Instant::now();
                    let mut removed = 0usize;
                    while pending.peek().is_some_and(|req| req.deadline <= now) {
                        if let Some(req) = pending.pop() {
                            if sink.expire(&req.key, req.generation) {
                                removed += 1;
                            }
                        }
                    }
                    if removed > 0 {
                        debug!("Cache expiry: removed {} entries", removed);
                    }
                }
            }
        }

        info!(
            "Cache expiry task stopped with {} pending expirations",
            pending.len()
        );
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingSink {
        expired: Mutex<Vec<(&'static str, u64)>>,
    }

    impl ExpirySink<&'static str> for RecordingSink {
        fn expire(&self, key: &&'static str, generation: u64) -> bool {
            self.expired.lock().push((*key, generation));
            true
        }
    }

    fn request(key: &'static str, generation: u64, after_ms: u64) -> ExpiryRequest<&'static str> {
        ExpiryRequest {
            key,
            generation,
            deadline: Instant::now() + Duration::from_millis(after_ms),
        }
    }

    #[test]
    fn test_heap_pops_earliest_deadline_first() {
        let now = Instant::now();
        let at = |key, generation, secs| ExpiryRequest {
            key,
            generation,
            deadline: now + Duration::from_secs(secs),
        };
        let mut heap = BinaryHeap::new();
        heap.push(at("late", 1, 5));
        heap.push(at("early", 2, 1));
        heap.push(at("mid", 3, 3));

        let order: Vec<_> = std::iter::from_fn(|| heap.pop().map(|r| r.key)).collect();
        assert_eq!(order, vec!["early", "mid", "late"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_task_fires_in_deadline_order() {
        let sink = Arc::new(RecordingSink::default());
        let (tx, rx) = mpsc::unbounded_channel();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = spawn_expiry_task(&Handle::current(), Arc::downgrade(&sink), rx, shutdown_rx);

        tx.send(request("b", 2, 200)).unwrap();
        tx.send(request("a", 1, 100)).unwrap();

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(*sink.expired.lock(), vec![("a", 1)]);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(*sink.expired.lock(), vec![("a", 1), ("b", 2)]);

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_task_stops_on_shutdown() {
        let sink = Arc::new(RecordingSink::default());
        let (tx, rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = spawn_expiry_task(&Handle::current(), Arc::downgrade(&sink), rx, shutdown_rx);

        tx.send(request("a", 1, 1_000)).unwrap();
        shutdown_tx.send_replace(true);

        handle.await.unwrap();
        assert!(sink.expired.lock().is_empty(), "Pending expiry must not fire after shutdown");
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_task_stops_when_senders_dropped() {
        let sink = Arc::new(RecordingSink::default());
        let (tx, rx) = mpsc::unbounded_channel::<ExpiryRequest<&'static str>>();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = spawn_expiry_task(&Handle::current(), Arc::downgrade(&sink), rx, shutdown_rx);

        drop(tx);
        handle.await.unwrap();
    }
}
