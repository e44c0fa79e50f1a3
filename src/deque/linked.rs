//! Blocking Linked Deque
//!
//! [`LinkedDeque`] is a double-ended queue over a doubly linked list, guarded by
//! a reader/writer admission protocol built from one mutex and two condition
//! variables.
//!
//! ## Access classes
//!
//! - **Writers** (`push_*`, `pop_*`, `try_pop_*`, `deinit`) are exclusive with
//!   each other and with every registered reader.
//! - **Readers** (`traverse`) share the list with each other. The list is walked
//!   without holding the mutex; writers are held off until the last reader
//!   leaves.
//!
//! ## Blocking behaviour
//!
//! | Operation | Waits while |
//! |-----------|-------------|
//! | `push_front` / `push_back` | a reader is registered |
//! | `pop_front` / `pop_back` | the list is empty or a reader is registered |
//! | `traverse` | the list is empty |
//! | `deinit` | a reader is registered |
//!
//! Every wait ends early once the deque is torn down with [`LinkedDeque::deinit`],
//! after which all operations fail fast or return `None`.
//!
//! ## Example
//!
//! ```rust
//! use rwdeque::LinkedDeque;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let deque = Arc::new(LinkedDeque::new());
//!
//! let consumer = thread::spawn({
//!     let deque = Arc::clone(&deque);
//!     move || deque.pop_front()
//! });
//!
//! deque.push_back(7).unwrap();
//! assert_eq!(consumer.join().unwrap(), Some(7));
//! ```

use super::access::Gate;
use super::node::{self, Link, Node};
use crate::metrics::{AtomicMetrics, MetricsCollector, PerformanceMetrics};
use crate::{Error, PushError, Result};
use core::fmt;
use core::ptr::NonNull;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// Which end of the list an operation works on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum End {
    Front,
    Back,
}

/// List bookkeeping protected by the deque's mutex
pub(crate) struct State<T> {
    pub(crate) head: Link<T>,
    pub(crate) tail: Link<T>,
    pub(crate) len: usize,
    pub(crate) readers: usize,
    pub(crate) destroyed: bool,
    /// Threads currently parked on either condition variable
    #[cfg(test)]
    pub(crate) waiting: usize,
}

impl<T> State<T> {
    pub(crate) fn new() -> Self {
        Self {
            head: None,
            tail: None,
            len: 0,
            readers: 0,
            destroyed: false,
            #[cfg(test)]
            waiting: 0,
        }
    }

    fn link_front(&mut self, node: NonNull<Node<T>>) {
        // SAFETY: the caller holds write access, so no reader is walking the
        // chain and `node` is detached.
        unsafe {
            (*node.as_ptr()).next = self.head;
            match self.head {
                Some(head) => (*head.as_ptr()).prev = Some(node),
                None => self.tail = Some(node),
            }
        }
        self.head = Some(node);
        self.len += 1;
    }

    fn link_back(&mut self, node: NonNull<Node<T>>) {
        // SAFETY: see `link_front`.
        unsafe {
            (*node.as_ptr()).prev = self.tail;
            match self.tail {
                Some(tail) => (*tail.as_ptr()).next = Some(node),
                None => self.head = Some(node),
            }
        }
        self.tail = Some(node);
        self.len += 1;
    }

    fn unlink_front(&mut self) -> Option<T> {
        let head = self.head?;

        // SAFETY: the caller holds write access; `head` is a live node of
        // this chain and becomes unreachable before it is released.
        unsafe {
            let next = head.as_ref().next;
            match next {
                Some(next) => (*next.as_ptr()).prev = None,
                None => self.tail = None,
            }
            self.head = next;
            self.len -= 1;
            Some(Node::into_value(head))
        }
    }

    fn unlink_back(&mut self) -> Option<T> {
        let tail = self.tail?;

        // SAFETY: see `unlink_front`.
        unsafe {
            let prev = tail.as_ref().prev;
            match prev {
                Some(prev) => (*prev.as_ptr()).next = None,
                None => self.head = None,
            }
            self.tail = prev;
            self.len -= 1;
            Some(Node::into_value(tail))
        }
    }

    fn unlink(&mut self, end: End) -> Option<T> {
        match end {
            End::Front => self.unlink_front(),
            End::Back => self.unlink_back(),
        }
    }

    /// Release every node, returning the payloads front to back
    pub(crate) fn drain(&mut self) -> Vec<T> {
        let mut values = Vec::with_capacity(self.len);
        while let Some(value) = self.unlink_front() {
            values.push(value);
        }
        values
    }

    /// Verify the chain's structural invariants
    #[cfg(test)]
    pub(crate) fn check_links(&self) {
        assert_eq!(self.head.is_none(), self.tail.is_none());
        assert_eq!(self.head.is_none(), self.len == 0);

        let mut count = 0;
        let mut prev: Link<T> = None;
        let mut link = self.head;
        while let Some(node) = link {
            let node_ref = unsafe { node.as_ref() };
            assert_eq!(node_ref.prev, prev, "prev link out of sync");
            prev = Some(node);
            link = node_ref.next;
            count += 1;
        }
        assert_eq!(prev, self.tail, "chain does not end at tail");
        assert_eq!(count, self.len);
    }
}

/// A thread-safe, blocking double-ended queue with shared traversal
///
/// Pushes never wait for space (the deque is unbounded) but do wait for active
/// traversals to finish. Pops wait for an element. Teardown through
/// [`deinit`](Self::deinit) wakes every waiter and hands the remaining
/// payloads back to the caller.
///
/// # Examples
///
/// ```rust
/// use rwdeque::LinkedDeque;
///
/// let deque = LinkedDeque::new();
/// deque.push_front(1).unwrap();
/// deque.push_front(2).unwrap();
/// assert_eq!(deque.pop_back(), Some(1));
/// assert_eq!(deque.pop_back(), Some(2));
/// ```
pub struct LinkedDeque<T> {
    gate: Gate<T>,
    metrics: AtomicMetrics,
    metrics_enabled: AtomicBool,
}

// SAFETY: nodes are only reached through the gate, which serializes writers
// against each other and against readers. Payloads move between threads on
// push/pop (`Send`) and are shared by concurrent traversals (`Sync`).
unsafe impl<T: Send> Send for LinkedDeque<T> {}
unsafe impl<T: Send + Sync> Sync for LinkedDeque<T> {}

impl<T> LinkedDeque<T> {
    /// Create an empty, live deque
    pub fn new() -> Self {
        Self {
            gate: Gate::new(),
            metrics: AtomicMetrics::default(),
            metrics_enabled: AtomicBool::new(cfg!(feature = "metrics")),
        }
    }

    /// Insert `value` at the front
    ///
    /// Waits while a traversal is in progress. Fails with
    /// [`Error::Destroyed`] after teardown and with
    /// [`Error::AllocationFailed`] if no node could be allocated; either way
    /// the value is handed back inside the [`PushError`].
    pub fn push_front(&self, value: T) -> core::result::Result<(), PushError<T>> {
        self.push(End::Front, value)
    }

    /// Insert `value` at the back
    ///
    /// Same waiting and failure behaviour as [`push_front`](Self::push_front).
    pub fn push_back(&self, value: T) -> core::result::Result<(), PushError<T>> {
        self.push(End::Back, value)
    }

    /// Remove and return the front element, waiting for one if necessary
    ///
    /// Returns `None` only if the deque is, or becomes, torn down.
    pub fn pop_front(&self) -> Option<T> {
        self.pop(End::Front)
    }

    /// Remove and return the back element, waiting for one if necessary
    pub fn pop_back(&self) -> Option<T> {
        self.pop(End::Back)
    }

    /// Remove the front element if there is one, without waiting for data
    ///
    /// Still waits for active traversals to finish.
    pub fn try_pop_front(&self) -> Option<T> {
        self.try_pop(End::Front)
    }

    /// Remove the back element if there is one, without waiting for data
    pub fn try_pop_back(&self) -> Option<T> {
        self.try_pop(End::Back)
    }

    /// Call `f` on every element, front to back
    ///
    /// Waits until the deque holds at least one element. Any number of
    /// traversals may run at the same time; writers are held off until all of
    /// them finish. Fails with [`Error::Destroyed`] if the deque is torn down
    /// before the walk starts, in which case `f` is never called.
    ///
    /// `f` must not push to or pop from the same deque: the writer would wait
    /// for this very traversal to end.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rwdeque::LinkedDeque;
    ///
    /// let deque = LinkedDeque::new();
    /// deque.push_back(1).unwrap();
    /// deque.push_back(2).unwrap();
    ///
    /// let mut sum = 0;
    /// deque.traverse(|v| sum += v)?;
    /// assert_eq!(sum, 3);
    /// # Ok::<(), rwdeque::Error>(())
    /// ```
    pub fn traverse<F>(&self, f: F) -> Result<()>
    where
        F: FnMut(&T),
    {
        let started = self.start();

        let access = match self.gate.read_lock() {
            Ok(access) => access,
            Err(refused) => {
                tracing::debug!("traversal rejected, deque torn down");
                self.finish(started, false, refused.contended);
                return Err(Error::Destroyed);
            }
        };

        // SAFETY: while `access` is held the reader count is non-zero, so no
        // writer can link, unlink or release nodes.
        unsafe { node::walk(access.head(), f) };

        let contended = access.contended();
        drop(access);
        self.finish(started, true, contended);
        Ok(())
    }

    /// Tear the deque down
    ///
    /// Waits for active traversals, releases every node and returns the
    /// remaining payloads front to back. All threads blocked in any operation
    /// wake up and observe the teardown. Calling it again is a no-op that
    /// returns an empty `Vec`.
    pub fn deinit(&self) -> Vec<T> {
        let mut access = self.gate.write_lock_push();
        if access.destroyed {
            return Vec::new();
        }

        let values = access.drain();
        access.destroyed = true;
        tracing::debug!(returned = values.len(), "deque torn down");
        values
    }

    /// Bring a torn-down deque back to the live, empty state
    ///
    /// Exclusive access guarantees no other thread is waiting on it. Any
    /// elements still present are dropped.
    pub fn reset(&mut self) {
        let state = self.gate.get_mut();
        debug_assert_eq!(state.readers, 0);
        drop(state.drain());
        state.destroyed = false;
    }

    /// Number of elements currently stored
    pub fn len(&self) -> usize {
        self.gate.peek().len
    }

    /// Whether the deque currently holds no elements
    pub fn is_empty(&self) -> bool {
        self.gate.peek().head.is_none()
    }

    /// Whether [`deinit`](Self::deinit) has run
    pub fn is_destroyed(&self) -> bool {
        self.gate.peek().destroyed
    }

    fn push(&self, end: End, value: T) -> core::result::Result<(), PushError<T>> {
        let started = self.start();
        let mut access = self.gate.write_lock_push();
        let contended = access.contended();

        let result = if access.destroyed {
            tracing::debug!(?end, "push rejected, deque torn down");
            Err(PushError::new(Error::Destroyed, value))
        } else {
            match Node::try_alloc(value) {
                Ok(node) => {
                    match end {
                        End::Front => access.link_front(node),
                        End::Back => access.link_back(node),
                    }
                    Ok(())
                }
                Err(value) => {
                    tracing::warn!(?end, "node allocation failed");
                    Err(PushError::new(Error::AllocationFailed, value))
                }
            }
        };

        drop(access);
        self.finish(started, result.is_ok(), contended);
        result
    }

    fn pop(&self, end: End) -> Option<T> {
        let started = self.start();
        let mut access = self.gate.write_lock_pop();
        let contended = access.contended();

        let value = if access.destroyed {
            None
        } else {
            access.unlink(end)
        };

        drop(access);
        self.finish(started, value.is_some(), contended);
        value
    }

    fn try_pop(&self, end: End) -> Option<T> {
        let started = self.start();
        let mut access = self.gate.write_lock_push();
        let contended = access.contended();

        let value = if access.destroyed {
            None
        } else {
            access.unlink(end)
        };

        drop(access);
        self.finish(started, value.is_some(), contended);
        value
    }

    #[inline]
    fn start(&self) -> Option<Instant> {
        if self.metrics_enabled.load(Ordering::Relaxed) {
            Some(Instant::now())
        } else {
            None
        }
    }

    #[inline]
    fn finish(&self, started: Option<Instant>, ok: bool, contended: bool) {
        let Some(started) = started else {
            return;
        };
        if contended {
            self.metrics.record_contention();
        }
        if ok {
            self.metrics.record_success(started.elapsed());
        } else {
            self.metrics.record_failure();
        }
    }

    #[cfg(test)]
    pub(crate) fn check_links(&self) {
        self.gate.peek().check_links();
    }

    #[cfg(test)]
    pub(crate) fn readers(&self) -> usize {
        self.gate.peek().readers
    }

    #[cfg(test)]
    pub(crate) fn waiting(&self) -> usize {
        self.gate.peek().waiting
    }
}

impl<T> Default for LinkedDeque<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for LinkedDeque<T> {
    fn drop(&mut self) {
        drop(self.gate.get_mut().drain());
    }
}

impl<T> fmt::Debug for LinkedDeque<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.gate.peek();
        f.debug_struct("LinkedDeque")
            .field("len", &state.len)
            .field("readers", &state.readers)
            .field("destroyed", &state.destroyed)
            .finish()
    }
}

impl<T> MetricsCollector for LinkedDeque<T> {
    fn metrics(&self) -> PerformanceMetrics {
        self.metrics.snapshot()
    }

    fn reset_metrics(&self) {
        self.metrics.reset();
    }

    fn set_metrics_enabled(&self, enabled: bool) {
        self.metrics_enabled
            .store(enabled && cfg!(feature = "metrics"), Ordering::Relaxed);
    }

    fn is_metrics_enabled(&self) -> bool {
        self.metrics_enabled.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_operations() {
        let deque = LinkedDeque::new();

        assert!(deque.is_empty());
        assert_eq!(deque.len(), 0);
        assert_eq!(deque.try_pop_front(), None);

        deque.push_back(1).unwrap();
        deque.push_back(2).unwrap();
        deque.push_front(0).unwrap();

        assert_eq!(deque.len(), 3);
        deque.check_links();

        assert_eq!(deque.pop_front(), Some(0));
        assert_eq!(deque.pop_back(), Some(2));
        assert_eq!(deque.pop_back(), Some(1));
        assert!(deque.is_empty());
        deque.check_links();
    }

    #[test]
    fn test_single_element_is_head_and_tail() {
        let deque = LinkedDeque::new();
        deque.push_front("only").unwrap();

        {
            let state = deque.gate.peek();
            assert_eq!(state.head, state.tail);
            assert!(state.head.is_some());
        }

        assert_eq!(deque.pop_back(), Some("only"));
        let state = deque.gate.peek();
        assert!(state.head.is_none());
        assert!(state.tail.is_none());
    }

    #[test]
    fn test_deinit_returns_payloads_in_order() {
        let deque = LinkedDeque::new();
        for i in 0..5 {
            deque.push_back(i).unwrap();
        }

        assert_eq!(deque.deinit(), vec![0, 1, 2, 3, 4]);
        assert!(deque.is_destroyed());
        assert!(deque.is_empty());
        deque.check_links();
    }

    #[test]
    fn test_operations_after_deinit() {
        let deque = LinkedDeque::new();
        deque.push_back(1).unwrap();
        deque.deinit();

        let err = deque.push_front(9).unwrap_err();
        assert_eq!(err.error(), &Error::Destroyed);
        assert_eq!(err.into_inner(), 9);

        assert_eq!(deque.push_back(10).unwrap_err().into_inner(), 10);
        assert_eq!(deque.pop_front(), None);
        assert_eq!(deque.pop_back(), None);
        assert_eq!(deque.try_pop_front(), None);
        assert_eq!(deque.traverse(|_| panic!("called after teardown")), Err(Error::Destroyed));
    }

    #[test]
    fn test_deinit_twice_is_noop() {
        let deque = LinkedDeque::new();
        deque.push_back(1).unwrap();

        assert_eq!(deque.deinit(), vec![1]);
        assert!(deque.deinit().is_empty());
        assert!(deque.is_destroyed());
    }

    #[test]
    fn test_reset_rearms_deque() {
        let mut deque = LinkedDeque::new();
        deque.push_back(1).unwrap();
        deque.deinit();

        deque.reset();
        assert!(!deque.is_destroyed());

        deque.push_back(2).unwrap();
        assert_eq!(deque.pop_front(), Some(2));
    }

    #[test]
    fn test_debug_output() {
        let deque = LinkedDeque::new();
        deque.push_back(()).unwrap();
        let rendered = format!("{:?}", deque);
        assert!(rendered.contains("len: 1"));
        assert!(rendered.contains("destroyed: false"));
    }

    #[cfg(feature = "metrics")]
    #[test]
    fn test_metrics_collection() {
        let deque = LinkedDeque::new();
        deque.push_back(1).unwrap();
        assert_eq!(deque.pop_front(), Some(1));
        assert_eq!(deque.try_pop_front(), None);

        let metrics = deque.metrics();
        assert_eq!(metrics.total_operations, 3);
        assert_eq!(metrics.successful_operations, 2);
        assert_eq!(metrics.failed_operations, 1);

        deque.set_metrics_enabled(false);
        deque.push_back(2).unwrap();
        assert_eq!(deque.metrics().total_operations, 3);

        deque.reset_metrics();
        assert_eq!(deque.metrics().total_operations, 0);
    }
}
