//! # RwDeque
//!
//! A blocking, thread-safe double-ended queue over a doubly linked list.
//!
//! ## Features
//!
//! - **Both ends**: push and pop at the front or the back
//! - **Blocking pops**: consumers sleep on a condition variable until data arrives
//! - **Shared traversal**: any number of threads may walk the deque at once
//! - **Clean teardown**: [`LinkedDeque::deinit`] wakes every waiter and hands the
//!   remaining payloads back
//!
//! ## Quick Start
//!
//! ```rust
//! use rwdeque::LinkedDeque;
//!
//! let deque = LinkedDeque::new();
//! deque.push_back(1).unwrap();
//! deque.push_front(0).unwrap();
//!
//! assert_eq!(deque.pop_front(), Some(0));
//! assert_eq!(deque.pop_back(), Some(1));
//! ```
//!
//! ## Thread Safety
//!
//! [`LinkedDeque`] is `Sync` whenever its payload is `Send + Sync`; share it
//! between threads with an `Arc`. Writers (pushes, pops, teardown) exclude each
//! other and any running traversal. Traversals only exclude writers.
//!
//! ## Cargo Features
//!
//! - `metrics` (default): operation counters through
//!   [`metrics::MetricsCollector`]
//! - `unstable`: nightly-only documentation attributes

#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]
#![cfg_attr(feature = "unstable", feature(doc_cfg))]

pub mod deque;
pub mod metrics;

pub use crate::deque::LinkedDeque;

use core::fmt;

/// Error types for deque operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The deque has been torn down
    #[error("Deque has been torn down")]
    Destroyed,
    /// No memory could be allocated for a new node
    #[error("Node allocation failed")]
    AllocationFailed,
}

/// Result type for deque operations
pub type Result<T> = core::result::Result<T, Error>;

/// A rejected push, carrying the value that was not enqueued
///
/// # Examples
///
/// ```rust
/// use rwdeque::{Error, LinkedDeque};
///
/// let deque = LinkedDeque::new();
/// deque.deinit();
///
/// let err = deque.push_back(String::from("late")).unwrap_err();
/// assert_eq!(err.error(), &Error::Destroyed);
/// assert_eq!(err.into_inner(), "late");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct PushError<T> {
    error: Error,
    value: T,
}

impl<T> PushError<T> {
    pub(crate) fn new(error: Error, value: T) -> Self {
        Self { error, value }
    }

    /// Why the push failed
    pub fn error(&self) -> &Error {
        &self.error
    }

    /// Take back the value that was not enqueued
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T> fmt::Debug for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PushError")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<T> fmt::Display for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "push failed: {}", self.error)
    }
}

impl<T> std::error::Error for PushError<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl<T> From<PushError<T>> for Error {
    fn from(err: PushError<T>) -> Self {
        err.error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(Error::Destroyed.to_string(), "Deque has been torn down");
        assert_eq!(Error::AllocationFailed.to_string(), "Node allocation failed");
    }

    #[test]
    fn test_push_error() {
        let err = PushError::new(Error::Destroyed, 5);
        assert_eq!(err.to_string(), "push failed: Deque has been torn down");
        assert!(format!("{:?}", err).contains("Destroyed"));
        assert_eq!(Error::from(err.clone()), Error::Destroyed);
        assert_eq!(err.into_inner(), 5);
    }

    #[test]
    fn test_push_error_converts_with_question_mark() {
        fn enqueue(deque: &LinkedDeque<u32>) -> Result<()> {
            deque.push_back(1)?;
            Ok(())
        }

        let deque = LinkedDeque::new();
        assert_eq!(enqueue(&deque), Ok(()));
        deque.deinit();
        assert_eq!(enqueue(&deque), Err(Error::Destroyed));
    }
}
