//! Deque (double-ended queue) implementations
//!
//! ## Available Deques
//!
//! - [`LinkedDeque`]: unbounded, blocking deque over a doubly linked list with
//!   shared traversal
//!
//! ## Choosing an Operation
//!
//! - `pop_*` for consumers that should sleep until work arrives
//! - `try_pop_*` for consumers that poll
//! - `traverse` for inspecting every element without removing anything
//! - `deinit` to shut down: every sleeping thread wakes and gets `None` or an
//!   error back

mod access;
pub mod linked;
mod node;

pub use self::linked::LinkedDeque;


#[cfg(test)]
mod proptests;
