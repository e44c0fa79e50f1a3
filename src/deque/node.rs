//! Node storage for the linked deque
//!
//! Nodes are allocated through the global allocator directly so that an
//! allocation failure can be reported to the caller instead of aborting the
//! process. A node owns its payload until it is detached; the links are plain
//! raw pointers whose validity is guaranteed by the deque's locking protocol.

use std::alloc::{self, Layout};
use std::ptr::{self, NonNull};

/// Raw link to a node, `None` at either end of the chain
pub(crate) type Link<T> = Option<NonNull<Node<T>>>;

/// A single element of the doubly linked chain
pub(crate) struct Node<T> {
    pub(crate) value: T,
    pub(crate) prev: Link<T>,
    pub(crate) next: Link<T>,
}

impl<T> Node<T> {
    /// Allocate a detached node holding `value`
    ///
    /// On allocation failure the value is handed back untouched.
    pub(crate) fn try_alloc(value: T) -> Result<NonNull<Node<T>>, T> {
        let layout = Layout::new::<Node<T>>();

        // SAFETY: `Node<T>` always contains two pointer-sized links, so the
        // layout is never zero-sized.
        let raw = unsafe { alloc::alloc(layout) } as *mut Node<T>;
        let Some(node) = NonNull::new(raw) else {
            return Err(value);
        };

        // SAFETY: `node` is freshly allocated with the layout of `Node<T>`
        // and is not yet visible to anyone else.
        unsafe {
            ptr::write(
                node.as_ptr(),
                Node {
                    value,
                    prev: None,
                    next: None,
                },
            );
        }
        Ok(node)
    }

    /// Release a detached node and return its payload
    ///
    /// # Safety
    ///
    /// `node` must come from [`Node::try_alloc`], must be unlinked from the
    /// chain, and must not be reachable by any reader.
    pub(crate) unsafe fn into_value(node: NonNull<Node<T>>) -> T {
        // The allocation matches `Box`'s layout for `Node<T>` under the
        // global allocator.
        let boxed = Box::from_raw(node.as_ptr());
        boxed.value
    }
}

/// Walk the chain starting at `link`, calling `f` on each payload in order
///
/// # Safety
///
/// Every node reachable from `link` must stay alive and unmodified for the
/// whole walk.
pub(crate) unsafe fn walk<T, F>(mut link: Link<T>, mut f: F)
where
    F: FnMut(&T),
{
    while let Some(node) = link {
        let node = node.as_ref();
        f(&node.value);
        link = node.next;
    }
}
