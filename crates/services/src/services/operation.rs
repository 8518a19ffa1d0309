//! Single-flight async operation with cancellable, order-preserving commits.
//!
//! An [`Operation`] owns one in-flight task at a time. Starting a new one
//! cancels the previous token before anything else happens, so only the most
//! recently started task can ever commit state, no matter in which order the
//! underlying requests resolve. State is published through a
//! [`tokio::sync::watch`] channel so any number of views can follow it.

use std::{future::Future, sync::Arc, time::Duration};

use tokio::{sync::watch, task::JoinHandle};
use tokio_util::sync::CancellationToken;

struct InFlight {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

pub struct Operation<S> {
    state: Arc<watch::Sender<S>>,
    current: Option<InFlight>,
}

impl<S> Operation<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new(initial: S) -> Self {
        let (state, _) = watch::channel(initial);
        Self {
            state: Arc::new(state),
            current: None,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<S> {
        self.state.subscribe()
    }

    pub fn state(&self) -> S {
        self.state.borrow().clone()
    }

    pub fn is_in_flight(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|in_flight| !in_flight.handle.is_finished())
    }

    /// Cancel whatever is running and publish `state` synchronously.
    pub fn reset(&mut self, state: S) {
        self.cancel();
        self.state.send_replace(state);
    }

    /// Cancel whatever is running, publish `pending`, then spawn `task`.
    pub fn start<F, Fut>(&mut self, pending: S, task: F)
    where
        F: FnOnce(Committer<S>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        self.state.send_replace(pending);

        let token = CancellationToken::new();
        let committer = Committer {
            token: token.clone(),
            state: self.state.clone(),
        };
        let handle = tokio::spawn(task(committer));
        self.current = Some(InFlight { token, handle });
    }

    /// Cancel the in-flight task, leaving the published state as it is.
    pub fn cancel(&mut self) {
        if let Some(in_flight) = self.current.take() {
            in_flight.token.cancel();
        }
    }
}

impl<S> Drop for Operation<S> {
    fn drop(&mut self) {
        if let Some(in_flight) = self.current.take() {
            in_flight.token.cancel();
        }
    }
}

/// Handle given to a running task for waiting and committing.
pub struct Committer<S> {
    token: CancellationToken,
    state: Arc<watch::Sender<S>>,
}

impl<S> Committer<S> {
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Publish `state` unless this task has been superseded or cancelled.
    /// The check happens under the channel lock, so a cancel that lands
    /// first always wins.
    pub fn commit(&self, state: S) -> bool {
        self.state.send_if_modified(|current| {
            if self.token.is_cancelled() {
                return false;
            }
            *current = state;
            true
        })
    }

    /// Drive `fut` until it finishes or the task is cancelled; a cancelled
    /// future is dropped, which aborts any request it owns.
    pub async fn run<T>(&self, fut: impl Future<Output = T>) -> Option<T> {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => None,
            out = fut => Some(out),
        }
    }

    /// Sleep for `duration`; `false` when cancelled first.
    pub async fn sleep(&self, duration: Duration) -> bool {
        self.run(tokio::time::sleep(duration)).await.is_some()
    }
}
