use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use tracing::debug;

/// Observable phase of an [`InitCell`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InitPhase {
    Uninitialized,
    Initializing,
    Ready,
    Failed(String),
}

/// Error returned when initialization did not produce a handle.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InitError {
    #[error("initialization failed: {0}")]
    Failed(String),
}

type Outcome<T> = Option<Result<Arc<T>, String>>;

enum State<T: ?Sized> {
    Uninitialized,
    Initializing(watch::Receiver<Outcome<T>>),
    Ready(Arc<T>),
    Failed(String),
}

enum Step<T: ?Sized> {
    Done(Arc<T>),
    Wait(watch::Receiver<Outcome<T>>),
    Init(watch::Sender<Outcome<T>>),
}

/// Single-flight lazy initialization of a shared service handle.
///
/// The first caller of [`get_or_init`](Self::get_or_init) runs the
/// initializer; callers arriving while it is in flight wait for the same
/// attempt and receive its outcome. A failed attempt leaves the cell in
/// `Failed`, and the next call starts a fresh attempt. If the initializing
/// future is dropped before finishing, the cell returns to `Uninitialized`
/// and one of the waiters takes over.
pub struct InitCell<T: ?Sized> {
    state: Mutex<State<T>>,
}

impl<T: ?Sized> InitCell<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::Uninitialized),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().expect("init cell lock poisoned")
    }

    /// Current phase.
    pub fn phase(&self) -> InitPhase {
        match &*self.lock() {
            State::Uninitialized => InitPhase::Uninitialized,
            State::Initializing(_) => InitPhase::Initializing,
            State::Ready(_) => InitPhase::Ready,
            State::Failed(reason) => InitPhase::Failed(reason.clone()),
        }
    }

    /// The handle, if initialization already succeeded.
    pub fn get(&self) -> Option<Arc<T>> {
        match &*self.lock() {
            State::Ready(handle) => Some(Arc::clone(handle)),
            _ => None,
        }
    }

    /// Move a ready handle out, returning the cell to `Uninitialized`.
    ///
    /// Any other phase is left untouched and `None` is returned.
    pub fn take(&self) -> Option<Arc<T>> {
        let mut state = self.lock();
        if matches!(&*state, State::Ready(_)) {
            if let State::Ready(handle) = std::mem::replace(&mut *state, State::Uninitialized) {
                return Some(handle);
            }
        }
        None
    }

    /// Return the handle, running `init` if no attempt is ready or in flight.
    ///
    /// `init` yields the shared handle itself so trait objects can be stored.
    pub async fn get_or_init<F, Fut, E>(&self, init: F) -> Result<Arc<T>, InitError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Arc<T>, E>>,
        E: fmt::Display,
    {
        let mut init = Some(init);
        loop {
            let step = {
                let mut state = self.lock();
                match &*state {
                    State::Ready(handle) => Step::Done(Arc::clone(handle)),
                    State::Initializing(rx) => Step::Wait(rx.clone()),
                    State::Uninitialized | State::Failed(_) => {
                        let (tx, rx) = watch::channel(None);
                        *state = State::Initializing(rx);
                        Step::Init(tx)
                    }
                }
            };

            match step {
                Step::Done(handle) => return Ok(handle),
                Step::Wait(mut rx) => {
                    let outcome = rx
                        .wait_for(Option::is_some)
                        .await
                        .map(|seen| seen.clone())
                        .unwrap_or(None);
                    match outcome {
                        Some(Ok(handle)) => return Ok(handle),
                        Some(Err(reason)) => return Err(InitError::Failed(reason)),
                        // Initializer was dropped mid-flight; try again.
                        None => continue,
                    }
                }
                Step::Init(tx) => {
                    let Some(init) = init.take() else {
                        return Err(InitError::Failed("initializer already consumed".into()));
                    };
                    let mut guard = ResetOnDrop {
                        cell: self,
                        armed: true,
                    };
                    let outcome = match init().await {
                        Ok(handle) => Ok(handle),
                        Err(e) => Err(e.to_string()),
                    };
                    guard.armed = false;

                    *self.lock() = match &outcome {
                        Ok(handle) => State::Ready(Arc::clone(handle)),
                        Err(reason) => State::Failed(reason.clone()),
                    };
                    // Waiters may all have gone away; that is fine.
                    let _ = tx.send(Some(outcome.clone()));
                    return outcome.map_err(InitError::Failed);
                }
            }
        }
    }
}

impl<T: ?Sized> Default for InitCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for InitCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InitCell")
            .field("phase", &self.phase())
            .finish()
    }
}

struct ResetOnDrop<'a, T: ?Sized> {
    cell: &'a InitCell<T>,
    armed: bool,
}

impl<T: ?Sized> Drop for ResetOnDrop<'_, T> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Ok(mut state) = self.cell.state.lock() {
            *state = State::Uninitialized;
            debug!("initialization abandoned; cell reset");
        }
    }
}
