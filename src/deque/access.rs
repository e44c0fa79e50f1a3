//! Reader/writer admission protocol
//!
//! All bookkeeping lives behind a single mutex. Two condition variables gate
//! the waiting:
//!
//! - `read_cond`: signalled whenever a writer finishes. Traversers wait on it
//!   until the list has an element or the deque is torn down.
//! - `write_cond`: signalled whenever a writer finishes and whenever the last
//!   reader leaves. Pushers wait on it until no reader is registered, poppers
//!   additionally until the list is non-empty.
//!
//! Readers hold the mutex only long enough to bump the reader count; the walk
//! itself happens unlocked and is sound because no writer is admitted while
//! the count is non-zero. Writers keep the mutex for their whole critical
//! section and broadcast both conditions on the way out.
//!
//! `loom_tests.rs` models these predicates and wakeups over loom's primitives.
//! Any change to a wait condition or to who gets notified must be made there
//! too.

use super::linked::State;
use super::node::Link;
use core::ops::{Deref, DerefMut};
use parking_lot::{Condvar, Mutex, MutexGuard};

/// A traversal turned away because the deque was torn down
#[derive(Debug)]
pub(crate) struct Refused {
    /// Whether the traverser waited before being turned away
    pub(crate) contended: bool,
}

/// Mutex and condition variables shared by every access path
pub(crate) struct Gate<T> {
    state: Mutex<State<T>>,
    read_cond: Condvar,
    write_cond: Condvar,
}

impl<T> Gate<T> {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(State::new()),
            read_cond: Condvar::new(),
            write_cond: Condvar::new(),
        }
    }

    /// Lock the state without waiting on any predicate
    ///
    /// Only for short observations; never mutate the list through this.
    pub(crate) fn peek(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock()
    }

    pub(crate) fn get_mut(&mut self) -> &mut State<T> {
        self.state.get_mut()
    }

    /// Register as a reader once the list is non-empty or torn down
    ///
    /// Refused if the deque is (or becomes) torn down before the reader is
    /// admitted; no reader is registered in that case.
    pub(crate) fn read_lock(&self) -> Result<ReadAccess<'_, T>, Refused> {
        let mut state = self.state.lock();
        let mut contended = false;

        while state.head.is_none() && !state.destroyed {
            if !contended {
                tracing::trace!("reader waiting for an element");
                contended = true;
            }
            park(&self.read_cond, &mut state);
        }

        if state.destroyed {
            return Err(Refused { contended });
        }

        state.readers += 1;
        let head = state.head;
        drop(state);

        Ok(ReadAccess {
            gate: self,
            head,
            contended,
        })
    }

    fn read_unlock(&self) {
        let mut state = self.state.lock();
        state.readers -= 1;
        if state.readers == 0 {
            // Readers can always re-enter, so only writers need waking.
            self.write_cond.notify_all();
        }
    }

    /// Acquire exclusive access for an insertion
    ///
    /// Waits until no reader is registered or the deque is torn down. The
    /// returned guard may observe `destroyed == true`.
    pub(crate) fn write_lock_push(&self) -> WriteAccess<'_, T> {
        let mut state = self.state.lock();
        let mut contended = false;

        while state.readers > 0 && !state.destroyed {
            if !contended {
                tracing::trace!(readers = state.readers, "writer waiting for readers to drain");
                contended = true;
            }
            park(&self.write_cond, &mut state);
        }

        WriteAccess {
            gate: self,
            state,
            contended,
        }
    }

    /// Acquire exclusive access for a removal
    ///
    /// Waits until the list has an element and no reader is registered, or
    /// the deque is torn down.
    pub(crate) fn write_lock_pop(&self) -> WriteAccess<'_, T> {
        let mut state = self.state.lock();
        let mut contended = false;

        while (state.head.is_none() || state.readers > 0) && !state.destroyed {
            if !contended {
                tracing::trace!(
                    len = state.len,
                    readers = state.readers,
                    "popper waiting for an element"
                );
                contended = true;
            }
            park(&self.write_cond, &mut state);
        }

        WriteAccess {
            gate: self,
            state,
            contended,
        }
    }
}

fn park<T>(cond: &Condvar, state: &mut MutexGuard<'_, State<T>>) {
    #[cfg(test)]
    {
        state.waiting += 1;
    }
    cond.wait(state);
    #[cfg(test)]
    {
        state.waiting -= 1;
    }
}

/// Registration of a traverser; unregisters on drop
pub(crate) struct ReadAccess<'a, T> {
    gate: &'a Gate<T>,
    head: Link<T>,
    contended: bool,
}

impl<T> ReadAccess<'_, T> {
    /// First node of the list as observed at admission
    ///
    /// Stable for the lifetime of the guard since no writer can run.
    pub(crate) fn head(&self) -> Link<T> {
        self.head
    }

    pub(crate) fn contended(&self) -> bool {
        self.contended
    }
}

impl<T> Drop for ReadAccess<'_, T> {
    fn drop(&mut self) {
        self.gate.read_unlock();
    }
}

/// Exclusive access to the list state; broadcasts both conditions on drop
pub(crate) struct WriteAccess<'a, T> {
    gate: &'a Gate<T>,
    state: MutexGuard<'a, State<T>>,
    contended: bool,
}

impl<T> WriteAccess<'_, T> {
    pub(crate) fn contended(&self) -> bool {
        self.contended
    }
}

impl<T> Deref for WriteAccess<'_, T> {
    type Target = State<T>;

    fn deref(&self) -> &State<T> {
        &self.state
    }
}

impl<T> DerefMut for WriteAccess<'_, T> {
    fn deref_mut(&mut self) -> &mut State<T> {
        &mut self.state
    }
}

impl<T> Drop for WriteAccess<'_, T> {
    fn drop(&mut self) {
        // A write may have made the list non-empty (pending poppers and
        // readers) and never registered as a reader, so both classes are
        // woken before the guard field releases the mutex.
        self.gate.read_cond.notify_all();
        self.gate.write_cond.notify_all();
    }
}
