use crate::error::RefreshError;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;

pub(crate) type RefreshOutcome = Result<String, RefreshError>;

#[derive(Default)]
struct RefreshState {
    in_progress: bool,
    waiters: VecDeque<oneshot::Sender<RefreshOutcome>>,
}

/// Single-flight coordination for token refresh. At most one caller leads a
/// refresh cycle; everyone who hits a 401 while it runs queues behind it and
/// is settled with the leader's outcome, in arrival order.
#[derive(Clone, Default)]
pub(crate) struct RefreshCoordinator {
    state: Arc<Mutex<RefreshState>>,
}

pub(crate) enum RefreshTurn {
    /// The caller must run the refresh and complete the lease.
    Lead(RefreshLease),
    /// A cycle is in flight; await its outcome.
    Wait(RefreshWaiter),
    /// The session already holds a newer access token than the one that was
    /// rejected.
    Ready(String),
}

pub(crate) struct RefreshWaiter(oneshot::Receiver<RefreshOutcome>);

impl RefreshWaiter {
    pub(crate) async fn settled(self) -> RefreshOutcome {
        self.0.await.unwrap_or(Err(RefreshError::Abandoned))
    }
}

#[must_use = "a lease must be completed, dropping it abandons the refresh"]
pub(crate) struct RefreshLease {
    state: Arc<Mutex<RefreshState>>,
    completed: bool,
}

fn lock(state: &Mutex<RefreshState>) -> MutexGuard<'_, RefreshState> {
    // Nothing in the critical sections can leave the state half-written.
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RefreshCoordinator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Decides the caller's role after its request was rejected while
    /// carrying `rejected_token`. `current_token` is read inside the critical
    /// section so a cycle cannot finish between the read and the decision.
    pub(crate) fn enter<E>(
        &self,
        rejected_token: Option<&str>,
        current_token: impl FnOnce() -> Result<Option<String>, E>,
    ) -> Result<RefreshTurn, E> {
        let mut state = lock(&self.state);

        if state.in_progress {
            let (tx, rx) = oneshot::channel();
            state.waiters.push_back(tx);
            return Ok(RefreshTurn::Wait(RefreshWaiter(rx)));
        }

        if let Some(token) = current_token()? {
            if rejected_token != Some(token.as_str()) {
                return Ok(RefreshTurn::Ready(token));
            }
        }

        state.in_progress = true;
        Ok(RefreshTurn::Lead(RefreshLease {
            state: self.state.clone(),
            completed: false,
        }))
    }

    pub(crate) fn is_refreshing(&self) -> bool {
        lock(&self.state).in_progress
    }

    pub(crate) fn waiting(&self) -> usize {
        lock(&self.state).waiters.len()
    }
}

impl RefreshLease {
    pub(crate) fn complete(mut self, outcome: RefreshOutcome) {
        self.settle(outcome);
    }

    fn settle(&mut self, outcome: RefreshOutcome) {
        if self.completed {
            return;
        }
        self.completed = true;

        let mut state = lock(&self.state);
        let waiters = std::mem::take(&mut state.waiters);
        tracing::debug!(
            waiters = waiters.len(),
            ok = outcome.is_ok(),
            "settling queued requests"
        );
        for waiter in waiters {
            // A waiter whose caller went away has nothing to settle.
            let _ = waiter.send(outcome.clone());
        }
        state.in_progress = false;
    }
}

impl Drop for RefreshLease {
    fn drop(&mut self) {
        if !self.completed {
            tracing::warn!("refresh leader dropped before completing; rejecting queued requests");
            self.settle(Err(RefreshError::Abandoned));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    fn enter(
        coordinator: &RefreshCoordinator,
        rejected: Option<&str>,
        current: Option<&str>,
    ) -> RefreshTurn {
        let current = current.map(str::to_string);
        coordinator
            .enter(rejected, || Ok::<_, Infallible>(current))
            .unwrap()
    }

    fn expect_lead(turn: RefreshTurn) -> RefreshLease {
        match turn {
            RefreshTurn::Lead(lease) => lease,
            _ => panic!("expected to lead the refresh"),
        }
    }

    fn expect_wait(turn: RefreshTurn) -> RefreshWaiter {
        match turn {
            RefreshTurn::Wait(waiter) => waiter,
            _ => panic!("expected to wait for the refresh"),
        }
    }

    #[tokio::test]
    async fn only_the_first_caller_leads() {
        let coordinator = RefreshCoordinator::new();
        let lease = expect_lead(enter(&coordinator, Some("tok1"), Some("tok1")));
        let waiters: Vec<_> = (0..4)
            .map(|_| expect_wait(enter(&coordinator, Some("tok1"), Some("tok1"))))
            .collect();

        assert!(coordinator.is_refreshing());
        assert_eq!(coordinator.waiting(), 4);

        lease.complete(Ok("tok2".to_string()));
        assert!(!coordinator.is_refreshing());
        assert_eq!(coordinator.waiting(), 0);

        for waiter in waiters {
            assert_eq!(waiter.settled().await, Ok("tok2".to_string()));
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn waiters_are_settled_in_queue_order() {
        let coordinator = RefreshCoordinator::new();
        let lease = expect_lead(enter(&coordinator, Some("tok1"), Some("tok1")));
        let waiters: Vec<_> = (0..5)
            .map(|i| (i, expect_wait(enter(&coordinator, Some("tok1"), Some("tok1")))))
            .collect();

        // Park the waiters in reverse so wake-up order can only come from
        // the order in which the lease settles them.
        let order = Arc::new(Mutex::new(Vec::new()));
        let handles: Vec<_> = waiters
            .into_iter()
            .rev()
            .map(|(i, waiter)| {
                let order = order.clone();
                tokio::spawn(async move {
                    let outcome = waiter.settled().await;
                    order.lock().unwrap().push(i);
                    outcome
                })
            })
            .collect();
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }

        lease.complete(Ok("tok2".to_string()));
        for handle in handles {
            assert_eq!(handle.await.unwrap(), Ok("tok2".to_string()));
        }

        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn failure_reaches_every_waiter() {
        let coordinator = RefreshCoordinator::new();
        let lease = expect_lead(enter(&coordinator, Some("tok1"), Some("tok1")));
        let a = expect_wait(enter(&coordinator, Some("tok1"), Some("tok1")));
        let b = expect_wait(enter(&coordinator, Some("tok1"), Some("tok1")));

        lease.complete(Err(RefreshError::Network("connection reset".to_string())));

        let expected = Err(RefreshError::Network("connection reset".to_string()));
        assert_eq!(a.settled().await, expected);
        assert_eq!(b.settled().await, expected);
    }

    #[tokio::test]
    async fn abandoned_waiters_keep_their_session() {
        let coordinator = RefreshCoordinator::new();
        let lease = expect_lead(enter(&coordinator, Some("tok1"), Some("tok1")));
        let waiter = expect_wait(enter(&coordinator, Some("tok1"), Some("tok1")));

        drop(lease);

        let err = crate::error::ApiError::from(waiter.settled().await.unwrap_err());
        assert!(!err.is_session_expired());
    }

    #[tokio::test]
    async fn dropped_lease_abandons_and_resets() {
        let coordinator = RefreshCoordinator::new();
        let lease = expect_lead(enter(&coordinator, None, None));
        let waiter = expect_wait(enter(&coordinator, None, None));

        drop(lease);

        assert_eq!(waiter.settled().await, Err(RefreshError::Abandoned));
        assert!(!coordinator.is_refreshing());
        expect_lead(enter(&coordinator, None, None)).complete(Ok("tok".to_string()));
    }

    #[test]
    fn newer_token_in_session_skips_the_refresh() {
        let coordinator = RefreshCoordinator::new();
        match enter(&coordinator, Some("tok1"), Some("tok2")) {
            RefreshTurn::Ready(token) => assert_eq!(token, "tok2"),
            _ => panic!("expected the stored token to be reused"),
        }
        assert!(!coordinator.is_refreshing());
    }

    #[test]
    fn lookup_errors_leave_state_idle() {
        let coordinator = RefreshCoordinator::new();
        let result = coordinator.enter(Some("tok1"), || Err::<Option<String>, _>("store down"));
        assert!(matches!(result, Err("store down")));
        assert!(!coordinator.is_refreshing());
    }
}
