//! Per-context binding of the current transaction.
//!
//! Async request handlers run inside [`Tracer::scope`], which stores the transaction in a tokio
//! task-local so concurrent requests on the same worker thread never see each other's
//! transaction. Synchronous code uses [`Tracer::enter`], a thread-local stack of bindings where
//! each guard removes its own entry on drop, in whatever order guards are dropped. The
//! task-local binding wins when both are present.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::agent::types::Transaction;

tokio::task_local! {
    static TASK_TRANSACTION: Arc<dyn Transaction>;
}

thread_local! {
    static THREAD_TRANSACTIONS: RefCell<Vec<(u64, Arc<dyn Transaction>)>> =
        const { RefCell::new(Vec::new()) };
    static NEXT_GUARD_ID: Cell<u64> = const { Cell::new(0) };
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Tracer;

impl Tracer {
    pub fn new() -> Self {
        Self
    }

    pub fn current_transaction(&self) -> Option<Arc<dyn Transaction>> {
        TASK_TRANSACTION
            .try_with(|transaction| Arc::clone(transaction))
            .ok()
            .or_else(|| {
                THREAD_TRANSACTIONS.with(|stack| {
                    stack
                        .borrow()
                        .last()
                        .map(|(_, transaction)| Arc::clone(transaction))
                })
            })
    }

    /// Runs `future` with `transaction` bound as the current transaction.
    pub async fn scope<F>(&self, transaction: Arc<dyn Transaction>, future: F) -> F::Output
    where
        F: Future,
    {
        TASK_TRANSACTION.scope(transaction, future).await
    }

    /// Runs `f` with `transaction` bound for the current task.
    pub fn sync_scope<R>(&self, transaction: Arc<dyn Transaction>, f: impl FnOnce() -> R) -> R {
        TASK_TRANSACTION.sync_scope(transaction, f)
    }

    /// Binds `transaction` to the current thread until the returned guard drops.
    ///
    /// The guard is `!Send`, so it cannot be held across an `.await` in a spawned task.
    pub fn enter(&self, transaction: Arc<dyn Transaction>) -> TransactionGuard {
        log::debug!("entering transaction {:?}", transaction.url());
        let id = NEXT_GUARD_ID.with(|next| {
            let id = next.get();
            next.set(id.wrapping_add(1));
            id
        });
        THREAD_TRANSACTIONS.with(|stack| stack.borrow_mut().push((id, transaction)));
        TransactionGuard {
            id,
            _not_send: PhantomData,
        }
    }
}

/// Unbinds its transaction on drop. The most recently entered live guard stays current.
pub struct TransactionGuard {
    id: u64,
    _not_send: PhantomData<*const ()>,
}

impl Drop for TransactionGuard {
    fn drop(&mut self) {
        let removed = THREAD_TRANSACTIONS.with(|stack| {
            let mut stack = stack.borrow_mut();
            stack
                .iter()
                .rposition(|(id, _)| *id == self.id)
                .map(|index| stack.remove(index))
        });
        // Released after the stack borrow ends.
        drop(removed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::transaction::WebTransaction;

    fn transaction(url: &str) -> Arc<dyn Transaction> {
        Arc::new(WebTransaction::new(Some(url.to_string()), None))
    }

    fn current_url(tracer: &Tracer) -> Option<String> {
        tracer.current_transaction().and_then(|txn| txn.url())
    }

    #[test]
    fn enter_guards_nest_and_restore() {
        let tracer = Tracer::new();
        assert!(tracer.current_transaction().is_none());

        let outer = tracer.enter(transaction("/outer"));
        assert_eq!(current_url(&tracer).as_deref(), Some("/outer"));
        {
            let _inner = tracer.enter(transaction("/inner"));
            assert_eq!(current_url(&tracer).as_deref(), Some("/inner"));
        }
        assert_eq!(current_url(&tracer).as_deref(), Some("/outer"));
        drop(outer);
        assert!(tracer.current_transaction().is_none());
    }

    #[test]
    fn guards_dropped_out_of_order_leave_no_stale_binding() {
        let tracer = Tracer::new();
        let first = tracer.enter(transaction("/a"));
        let second = tracer.enter(transaction("/b"));

        drop(first);
        assert_eq!(current_url(&tracer).as_deref(), Some("/b"));
        drop(second);
        assert!(tracer.current_transaction().is_none());
    }

    #[test]
    fn dropping_outer_guard_keeps_inner_binding_then_falls_back() {
        let tracer = Tracer::new();
        let outer = tracer.enter(transaction("/outer"));
        let middle = tracer.enter(transaction("/middle"));
        let inner = tracer.enter(transaction("/inner"));

        drop(middle);
        assert_eq!(current_url(&tracer).as_deref(), Some("/inner"));
        drop(inner);
        assert_eq!(current_url(&tracer).as_deref(), Some("/outer"));
        drop(outer);
        assert!(tracer.current_transaction().is_none());
    }

    #[test]
    fn task_binding_takes_precedence_over_thread_binding() {
        let tracer = Tracer::new();
        let _guard = tracer.enter(transaction("/thread"));
        let seen = tracer.sync_scope(transaction("/task"), || current_url(&tracer));
        assert_eq!(seen.as_deref(), Some("/task"));
        assert_eq!(current_url(&tracer).as_deref(), Some("/thread"));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn concurrent_scopes_are_isolated() {
        let tracer = Tracer::new();
        let first = tracer.scope(transaction("/a"), async move {
            tokio::task::yield_now().await;
            current_url(&tracer)
        });
        let second = tracer.scope(transaction("/b"), async move {
            tokio::task::yield_now().await;
            current_url(&tracer)
        });
        let (a, b) = tokio::join!(first, second);
        assert_eq!(a.as_deref(), Some("/a"));
        assert_eq!(b.as_deref(), Some("/b"));
        assert!(tracer.current_transaction().is_none());
    }
}
