//! One-shot future with ordered continuations

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::future::Future as StdFuture;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

use parking_lot::Mutex;
use tracing::{trace, warn};

use weft_core::{BridgeError, ExternalObject, Rejection, SettlementState, Value};

use crate::Thenable;

/// Settled outcome of a future
pub type Outcome = Result<Value, Rejection>;

/// Computation bound to a future, run against the value it is resolved with
pub type Executor = Box<dyn FnOnce(Value) -> Outcome + Send + 'static>;

/// Reaction to a fulfilled outcome
pub type OnFulfilled = Box<dyn FnOnce(Value) -> Outcome + Send + 'static>;

/// Reaction to a rejected outcome
pub type OnRejected = Box<dyn FnOnce(Rejection) -> Outcome + Send + 'static>;

type Continuation = Box<dyn FnOnce(&Outcome) + Send + 'static>;

type Job = Box<dyn FnOnce()>;

thread_local! {
    /// Continuations of settled futures waiting to run on this thread
    static READY: RefCell<VecDeque<Job>> = RefCell::new(VecDeque::new());
    static DRAINING: Cell<bool> = const { Cell::new(false) };
}

/// Resets the drain flag; a panicking continuation abandons the rest of its cascade
struct DrainGuard;

impl Drop for DrainGuard {
    fn drop(&mut self) {
        if std::thread::panicking() {
            let abandoned = READY.with(|ready| std::mem::take(&mut *ready.borrow_mut()));
            drop(abandoned);
        }
        DRAINING.with(|draining| draining.set(false));
    }
}

/// Queue jobs and run them, unless an outer call on this thread is already
/// draining the queue.
///
/// Settling a future from inside a continuation only enqueues, so a chain of
/// any length settles in constant stack depth.
fn run_ready(jobs: Vec<Job>) {
    READY.with(|ready| ready.borrow_mut().extend(jobs));
    if DRAINING.with(|draining| draining.replace(true)) {
        return;
    }

    let _guard = DrainGuard;
    while let Some(job) = READY.with(|ready| ready.borrow_mut().pop_front()) {
        job();
    }
}

struct Inner {
    executor: Option<Executor>,
    /// Set once resolve/reject has been accepted
    resolving: bool,
    state: SettlementState,
    outcome: Option<Outcome>,
    continuations: Vec<Continuation>,
    /// Wakers of pending `Wait`s, keyed by waiter
    wakers: Vec<(u64, Waker)>,
    next_waiter: u64,
}

/// One-shot asynchronous value container
///
/// Cloning yields another handle to the same future.
#[derive(Clone)]
pub struct Future {
    inner: Arc<Mutex<Inner>>,
}

impl Future {
    fn with_executor(executor: Option<Executor>) -> Self {
        Future {
            inner: Arc::new(Mutex::new(Inner {
                executor,
                resolving: false,
                state: SettlementState::Pending,
                outcome: None,
                continuations: Vec::new(),
                wakers: Vec::new(),
                next_waiter: 0,
            })),
        }
    }

    /// Unbound future, settled by a later `resolve` or `reject`
    pub fn pending() -> Self {
        Self::with_executor(None)
    }

    /// Future bound to a computation over the value it will be resolved with
    pub fn new<F>(executor: F) -> Self
    where
        F: FnOnce(Value) -> Outcome + Send + 'static,
    {
        Self::with_executor(Some(Box::new(executor)))
    }

    /// Run `task` as a concurrently scheduled tokio task and settle with its output
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<T>(task: T) -> Self
    where
        T: StdFuture<Output = Outcome> + Send + 'static,
    {
        let future = Future::pending();
        let settle = future.clone();
        let handle = tokio::spawn(task);

        tokio::spawn(async move {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!("spawned future task failed: {}", e);
                    Err(BridgeError::TaskFailed(e.to_string()).into())
                }
            };
            settle.settle(outcome);
        });

        future
    }

    pub fn state(&self) -> SettlementState {
        self.inner.lock().state
    }

    pub fn is_settled(&self) -> bool {
        self.state().is_settled()
    }

    /// Outcome, once settled
    pub fn outcome(&self) -> Option<Outcome> {
        self.inner.lock().outcome.clone()
    }

    /// Do both handles refer to the same future?
    pub fn ptr_eq(&self, other: &Future) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Resolve with `value`
    ///
    /// A bound executor runs against `value` and its outcome settles the
    /// future; otherwise the future fulfills with `value` itself. Only the
    /// first resolve/reject takes effect.
    pub fn resolve(&self, value: Value) {
        let executor = {
            let mut inner = self.inner.lock();
            if inner.resolving || inner.state.is_settled() {
                trace!(state = %inner.state, "ignoring resolve on an already resolved future");
                return;
            }
            inner.resolving = true;
            inner.executor.take()
        };

        let outcome = match executor {
            Some(executor) => executor(value),
            None => Ok(value),
        };
        self.settle(outcome);
    }

    /// Reject with `reason`
    pub fn reject(&self, reason: Rejection) {
        {
            let mut inner = self.inner.lock();
            if inner.resolving || inner.state.is_settled() {
                trace!(state = %inner.state, "ignoring reject on an already resolved future");
                return;
            }
            inner.resolving = true;
            inner.executor = None;
        }
        self.complete(Err(reason));
    }

    /// Settle with `outcome`, adopting it if it carries a native thenable
    fn settle(&self, outcome: Outcome) {
        let adopted = match &outcome {
            Ok(value) => Thenable::from_value(value),
            Err(_) => None,
        };

        match adopted {
            Some(Thenable::Future(source)) if source.ptr_eq(self) => {
                self.complete(Err(Rejection::msg("chaining cycle detected for future")));
            }
            Some(Thenable::Future(source)) => {
                let target = self.clone();
                source.on_settle(move |outcome| target.complete(outcome.clone()));
            }
            Some(Thenable::Settled(settled)) => self.complete(settled.into_outcome()),
            None => self.complete(outcome),
        }
    }

    /// Terminal transition; runs continuations in registration order
    fn complete(&self, outcome: Outcome) {
        let next = match outcome {
            Ok(_) => SettlementState::Fulfilled,
            Err(_) => SettlementState::Rejected,
        };

        let (continuations, wakers) = {
            let mut inner = self.inner.lock();
            if !inner.state.can_transition_to(next) {
                trace!(state = %inner.state, "future already settled");
                return;
            }
            inner.state = next;
            inner.resolving = true;
            inner.executor = None;
            inner.outcome = Some(outcome.clone());
            (
                std::mem::take(&mut inner.continuations),
                std::mem::take(&mut inner.wakers),
            )
        };

        for (_, waker) in wakers {
            waker.wake();
        }
        if continuations.is_empty() {
            return;
        }

        let outcome = Arc::new(outcome);
        let jobs = continuations
            .into_iter()
            .map(|continuation| {
                let outcome = Arc::clone(&outcome);
                Box::new(move || continuation(&outcome)) as Job
            })
            .collect();
        run_ready(jobs);
    }

    /// Register a continuation; runs immediately if already settled
    pub fn on_settle<F>(&self, continuation: F)
    where
        F: FnOnce(&Outcome) + Send + 'static,
    {
        let settled = {
            let mut inner = self.inner.lock();
            if inner.outcome.is_none() {
                inner.continuations.push(Box::new(continuation));
                return;
            }
            inner.outcome.clone()
        };

        if let Some(outcome) = settled {
            continuation(&outcome);
        }
    }

    /// Chain reactions onto this future
    ///
    /// Returns this future unchanged when neither reaction is supplied. The
    /// returned future adopts the original outcome when the matching reaction
    /// is missing.
    pub fn then(&self, on_fulfilled: Option<OnFulfilled>, on_rejected: Option<OnRejected>) -> Future {
        if on_fulfilled.is_none() && on_rejected.is_none() {
            return self.clone();
        }

        let derived = Future::pending();
        let target = derived.clone();

        self.on_settle(move |outcome| {
            let next = match outcome {
                Ok(value) => match on_fulfilled {
                    Some(reaction) => reaction(value.clone()),
                    None => Ok(value.clone()),
                },
                Err(reason) => match on_rejected {
                    Some(reaction) => reaction(reason.clone()),
                    None => Err(reason.clone()),
                },
            };
            target.settle(next);
        });

        derived
    }

    /// Suspend until settled
    pub fn wait(&self) -> Wait {
        Wait {
            future: self.clone(),
            waiter: None,
        }
    }
}

impl fmt::Debug for Future {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_lock() {
            Some(inner) => f
                .debug_struct("Future")
                .field("state", &inner.state)
                .field("continuations", &inner.continuations.len())
                .finish(),
            None => f.write_str("Future(<locked>)"),
        }
    }
}

impl ExternalObject for Future {
    fn type_name(&self) -> &'static str {
        "Future"
    }
}

/// Awaitable returned by [`Future::wait`]
///
/// Dropping it before the future settles unregisters its waker.
#[derive(Debug)]
pub struct Wait {
    future: Future,
    /// Key of our entry in the future's waker list
    waiter: Option<u64>,
}

impl StdFuture for Wait {
    type Output = Outcome;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Outcome> {
        let this = self.get_mut();
        let mut inner = this.future.inner.lock();
        if let Some(outcome) = &inner.outcome {
            this.waiter = None;
            return Poll::Ready(outcome.clone());
        }

        let slot = this
            .waiter
            .and_then(|key| inner.wakers.iter().position(|(waiter, _)| *waiter == key));
        match slot {
            Some(index) => {
                if !inner.wakers[index].1.will_wake(cx.waker()) {
                    inner.wakers[index].1 = cx.waker().clone();
                }
            }
            None => {
                let key = inner.next_waiter;
                inner.next_waiter += 1;
                inner.wakers.push((key, cx.waker().clone()));
                this.waiter = Some(key);
            }
        }
        Poll::Pending
    }
}

impl Drop for Wait {
    fn drop(&mut self) {
        if let Some(key) = self.waiter.take() {
            self.future
                .inner
                .lock()
                .wakers
                .retain(|(waiter, _)| *waiter != key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SettledResult;
    use std::time::Duration;

    fn double(value: Value) -> Outcome {
        Ok(Value::Int(value.as_int().unwrap_or_default() * 2))
    }

    #[test]
    fn test_pending_until_resolved() {
        let future = Future::pending();
        assert_eq!(future.state(), SettlementState::Pending);
        assert!(future.outcome().is_none());

        future.resolve(Value::Int(1));
        assert_eq!(future.state(), SettlementState::Fulfilled);
        assert_eq!(future.outcome(), Some(Ok(Value::Int(1))));
    }

    #[test]
    fn test_executor_runs_on_resolve() {
        let future = Future::new(double);
        future.resolve(Value::Int(21));
        assert_eq!(future.outcome(), Some(Ok(Value::Int(42))));
    }

    #[test]
    fn test_settlement_is_terminal() {
        let future = Future::pending();
        let reason = Rejection::msg("first");
        future.reject(reason.clone());
        future.resolve(Value::Int(1));
        future.reject(Rejection::msg("second"));

        assert_eq!(future.state(), SettlementState::Rejected);
        assert_eq!(future.outcome(), Some(Err(reason)));
    }

    #[test]
    fn test_continuations_run_once_in_order() {
        let future = Future::pending();
        let log = Arc::new(Mutex::new(Vec::new()));

        for i in 0..3 {
            let log = Arc::clone(&log);
            future.on_settle(move |_| log.lock().push(i));
        }
        assert!(log.lock().is_empty());

        future.resolve(Value::Null);
        future.resolve(Value::Null);
        assert_eq!(*log.lock(), vec![0, 1, 2]);

        // Late registration runs immediately
        let late = Arc::clone(&log);
        future.on_settle(move |_| late.lock().push(3));
        assert_eq!(*log.lock(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_then_without_reactions_is_identity() {
        let future = Future::pending();
        let chained = future.then(None, None);
        assert!(chained.ptr_eq(&future));
    }

    #[test]
    fn test_then_runs_matching_reaction() {
        let future = Future::pending();
        let chained = future.then(Some(Box::new(double)), None);
        assert_eq!(chained.state(), SettlementState::Pending);

        future.resolve(Value::Int(5));
        assert_eq!(chained.outcome(), Some(Ok(Value::Int(10))));
    }

    #[test]
    fn test_then_adopts_outcome_without_matching_reaction() {
        let future = Future::pending();
        let chained = future.then(Some(Box::new(double)), None);
        let reason = Rejection::msg("nope");

        future.reject(reason.clone());
        assert_eq!(chained.outcome(), Some(Err(reason)));
    }

    #[test]
    fn test_rejection_handler_recovers() {
        let future = Future::pending();
        let chained = future.then(
            None,
            Some(Box::new(|reason: Rejection| -> Outcome {
                Ok(Value::from(reason.to_string()))
            })),
        );

        future.reject(Rejection::msg("recovered"));
        assert_eq!(chained.outcome(), Some(Ok(Value::from("recovered"))));
    }

    #[test]
    fn test_adopts_native_thenables() {
        let inner = Future::pending();
        let outer = Future::pending();
        outer.resolve(Value::object(inner.clone()));
        assert_eq!(outer.state(), SettlementState::Pending);

        inner.resolve(Value::Int(9));
        assert_eq!(outer.outcome(), Some(Ok(Value::Int(9))));

        let settled = Future::pending();
        settled.resolve(Value::object(SettledResult::fulfilled(Value::Bool(true))));
        assert_eq!(settled.outcome(), Some(Ok(Value::Bool(true))));
    }

    #[test]
    fn test_self_adoption_is_rejected() {
        let future = Future::pending();
        future.resolve(Value::object(future.clone()));
        assert_eq!(future.state(), SettlementState::Rejected);
    }

    #[tokio::test]
    async fn test_wait_suspends_until_settled() {
        let future = Future::pending();
        let resolver = future.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            resolver.resolve(Value::Int(3));
        });

        assert_eq!(future.wait().await, Ok(Value::Int(3)));
    }

    #[tokio::test]
    async fn test_spawn_settles_with_task_output() {
        let future = Future::spawn(async {
            tokio::time::sleep(Duration::from_millis(1)).await;
            Ok(Value::from("done"))
        });

        assert_eq!(future.wait().await, Ok(Value::from("done")));
    }

    #[test]
    fn test_long_chain_settles_without_recursion() {
        let settle_chain = || {
            let root = Future::pending();
            let mut tail = root.clone();
            for _ in 0..20_000 {
                tail = tail.then(
                    Some(Box::new(|value: Value| -> Outcome {
                        Ok(Value::Int(value.as_int().unwrap_or_default() + 1))
                    })),
                    None,
                );
            }

            root.resolve(Value::Int(0));
            tail.outcome()
        };

        let outcome = std::thread::Builder::new()
            .stack_size(256 * 1024)
            .spawn(settle_chain)
            .unwrap()
            .join()
            .unwrap();
        assert_eq!(outcome, Some(Ok(Value::Int(20_000))));
    }

    #[test]
    fn test_long_adoption_chain_settles() {
        let root = Future::pending();
        let mut outer = root.clone();
        for _ in 0..20_000 {
            let next = Future::pending();
            next.resolve(Value::object(outer));
            outer = next;
        }

        root.resolve(Value::from("deep"));
        assert_eq!(outer.outcome(), Some(Ok(Value::from("deep"))));
    }

    #[test]
    fn test_nested_settlement_keeps_per_future_order() {
        let first = Future::pending();
        let second = Future::pending();
        let log = Arc::new(Mutex::new(Vec::new()));

        let trigger = second.clone();
        let entry = Arc::clone(&log);
        first.on_settle(move |_| {
            entry.lock().push("first:0");
            trigger.resolve(Value::Null);
        });
        let entry = Arc::clone(&log);
        first.on_settle(move |_| entry.lock().push("first:1"));
        let entry = Arc::clone(&log);
        second.on_settle(move |_| entry.lock().push("second:0"));

        first.resolve(Value::Null);
        assert_eq!(*log.lock(), vec!["first:0", "first:1", "second:0"]);
        assert!(second.is_settled());
    }

    #[tokio::test]
    async fn test_abandoned_wait_unregisters_waker() {
        let future = Future::pending();

        for _ in 0..5 {
            let expired = tokio::time::timeout(Duration::from_millis(1), future.wait()).await;
            assert!(expired.is_err());
        }
        assert!(future.inner.lock().wakers.is_empty());

        let waiting = future.wait();
        let abandoned = future.wait();
        let resolver = future.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            resolver.resolve(Value::Int(1));
        });

        let _ = tokio::time::timeout(Duration::from_millis(1), abandoned).await;
        assert_eq!(waiting.await, Ok(Value::Int(1)));
        assert!(future.inner.lock().wakers.is_empty());
    }

    #[tokio::test]
    async fn test_spawn_rejects_on_panic() {
        async fn explode() -> Outcome {
            panic!("resolver exploded")
        }

        let future = Future::spawn(explode());

        let reason = future.wait().await.unwrap_err();
        assert!(matches!(reason.bridge_error(), Some(BridgeError::TaskFailed(_))));
    }
}
