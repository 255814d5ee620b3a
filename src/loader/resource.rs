use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::state::{LoadState, Settlement, Snapshot};
use crate::error::ErrorInfo;

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

type Producer<K, T> = Arc<dyn Fn(&K) -> BoxFuture<Result<T, ErrorInfo>> + Send + Sync>;

/// Sequence counter, current key and teardown flag. Starting an invocation
/// and publishing a result both happen under this one lock.
struct Tracker<K> {
    issued: u64,
    key: K,
    torn_down: bool,
}

struct Shared<K, T> {
    producer: Producer<K, T>,
    tracker: Mutex<Tracker<K>>,
    state: watch::Sender<LoadState<T>>,
    closed: Notify,
}

impl<K, T> Shared<K, T> {
    fn lock(&self) -> MutexGuard<'_, Tracker<K>> {
        self.tracker
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<K, T> Shared<K, T>
where
    K: Clone + PartialEq + Send + 'static,
    T: Send + Sync + 'static,
{
    /// Issues the next sequence number and publishes `Loading`.
    ///
    /// With `Some(key)`, only starts when the key differs from the current one.
    fn begin(&self, key: Option<K>) -> Option<(u64, K)> {
        let mut tracker = self.lock();
        if tracker.torn_down {
            return None;
        }
        if let Some(key) = key {
            if tracker.key == key {
                return None;
            }
            tracker.key = key;
        }
        tracker.issued += 1;
        self.state.send_replace(LoadState::Loading);
        Some((tracker.issued, tracker.key.clone()))
    }

    fn start(self: &Arc<Self>, key: Option<K>) -> Option<JoinHandle<Settlement>> {
        let (seq, key) = self.begin(key)?;
        debug!(seq, "Invocation started");

        let producer = Arc::clone(&self.producer);
        let shared = Arc::clone(self);
        Some(tokio::spawn(async move {
            // Call the producer in its own task so a panic, whether raised while
            // building the future or while polling it, surfaces as a JoinError.
            let invocation = tokio::spawn(async move {
                let future = producer(&key);
                future.await
            });
            let outcome = match invocation.await {
                Ok(outcome) => outcome,
                Err(e) if e.is_panic() => Err(ErrorInfo::new(format!("producer panicked: {e}"))),
                Err(e) => Err(ErrorInfo::new(format!("producer was cancelled: {e}"))),
            };
            shared.settle(seq, outcome)
        }))
    }

    /// Publishes `outcome` only if `seq` is still the latest invocation.
    fn settle(&self, seq: u64, outcome: Result<T, ErrorInfo>) -> Settlement {
        let tracker = self.lock();
        if tracker.torn_down {
            debug!(seq, "Resource torn down, dropping result");
            return Settlement::TornDown;
        }
        if seq != tracker.issued {
            debug!(seq, latest = tracker.issued, "Discarding superseded result");
            return Settlement::Superseded;
        }
        if let Err(err) = &outcome {
            warn!(seq, error = %err, "Invocation failed");
        }
        self.state.send_replace(outcome.into());
        Settlement::Published
    }
}

/// Race-safe `{data, loading, error}` state for an async producer.
///
/// Every invocation (the initial load, a key change, or a [`refetch`]) takes
/// the next number from one counter. A finished invocation is published only
/// if no later one has started, so a slow early response can never overwrite
/// a newer one. Superseded invocations are not cancelled; their results are
/// dropped.
///
/// State is published through a `tokio::sync::watch` channel; see
/// [`subscribe`]. Dropping the handle (or calling [`teardown`]) stops all
/// further publication.
///
/// Construction spawns the first invocation, so it must happen inside a
/// tokio runtime.
///
/// [`refetch`]: Resource::refetch
/// [`subscribe`]: Resource::subscribe
/// [`teardown`]: Resource::teardown
pub struct Resource<T, K = ()> {
    shared: Arc<Shared<K, T>>,
}

impl<T> Resource<T, ()>
where
    T: Send + Sync + 'static,
{
    /// Loader for a zero-argument producer.
    pub fn new<F, Fut>(producer: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ErrorInfo>> + Send + 'static,
    {
        Self::keyed((), move |_: &()| producer())
    }
}

impl<T, K> Resource<T, K>
where
    K: Clone + PartialEq + Send + 'static,
    T: Send + Sync + 'static,
{
    /// Loader whose producer reads a dependency key. Changing the key with
    /// [`set_key`](Self::set_key) re-invokes the producer.
    pub fn keyed<F, Fut>(key: K, producer: F) -> Self
    where
        F: Fn(&K) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ErrorInfo>> + Send + 'static,
    {
        let producer: Producer<K, T> =
            Arc::new(move |key: &K| -> BoxFuture<Result<T, ErrorInfo>> { Box::pin(producer(key)) });
        let (state, _) = watch::channel(LoadState::Idle);
        let shared = Arc::new(Shared {
            producer,
            tracker: Mutex::new(Tracker {
                issued: 0,
                key,
                torn_down: false,
            }),
            state,
            closed: Notify::new(),
        });
        // The initial load; its handle is not needed.
        let _ = shared.start(None);
        Self { shared }
    }

    /// Starts a new invocation if `key` differs from the current key.
    /// Returns whether one was started.
    pub fn set_key(&self, key: K) -> bool {
        self.shared.start(Some(key)).is_some()
    }

    pub fn key(&self) -> K {
        self.shared.lock().key.clone()
    }

    /// Starts a new invocation, superseding any in flight, and waits for it
    /// to settle.
    pub async fn refetch(&self) -> Settlement {
        match self.shared.start(None) {
            Some(handle) => handle.await.unwrap_or(Settlement::TornDown),
            None => Settlement::TornDown,
        }
    }

    /// A listener for the published state. The channel keeps only the latest
    /// value, so a slow listener may skip intermediate states.
    pub fn subscribe(&self) -> watch::Receiver<LoadState<T>> {
        self.shared.state.subscribe()
    }
}

impl<T, K> Resource<T, K>
where
    K: Clone + PartialEq + Send + 'static,
    T: Clone + Send + Sync + 'static,
{
    pub fn state(&self) -> LoadState<T> {
        self.shared.state.borrow().clone()
    }

    pub fn snapshot(&self) -> Snapshot<T> {
        Snapshot::from(&*self.shared.state.borrow())
    }

    /// Waits until the published state is `Success` or `Failure`.
    ///
    /// If the resource is torn down first, returns whatever was last
    /// published, which may still be `Loading`.
    pub async fn settled(&self) -> LoadState<T> {
        let mut rx = self.subscribe();
        let closed = self.shared.closed.notified();
        tokio::pin!(closed);
        closed.as_mut().enable();
        if self.is_torn_down() {
            return self.state();
        }

        tokio::select! {
            result = rx.wait_for(LoadState::is_settled) => match result {
                Ok(state) => (*state).clone(),
                Err(_) => self.state(),
            },
            _ = closed => self.state(),
        }
    }
}

impl<T, K> Resource<T, K> {
    /// Stops all further publication. Invocations still in flight run to
    /// completion and their results are dropped.
    pub fn teardown(&self) {
        let mut tracker = self.shared.lock();
        if !tracker.torn_down {
            tracker.torn_down = true;
            debug!(issued = tracker.issued, "Resource torn down");
        }
        drop(tracker);
        self.shared.closed.notify_waiters();
    }

    pub fn is_torn_down(&self) -> bool {
        self.shared.lock().torn_down
    }
}

impl<T, K> Drop for Resource<T, K> {
    fn drop(&mut self) {
        self.teardown();
    }
}
