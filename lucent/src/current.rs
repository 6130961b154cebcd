//! The current-context slot.
//!
//! Only one context can be active on a thread at a time. Contexts are neither [`Send`] nor
//! [`Sync`], so a context never leaves the thread holding its slot.

use std::cell::RefCell;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

// TLS synchronization barrier for contexts.
thread_local!(static TLS_CURRENT_CONTEXT: RefCell<Option<ContextId>> = RefCell::new(None));

/// Identifier of a context.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ContextId(u64);

impl ContextId {
  fn next() -> Self {
    static NEXT: AtomicU64 = AtomicU64::new(1);
    ContextId(NEXT.fetch_add(1, Ordering::Relaxed))
  }
}

impl fmt::Display for ContextId {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "#{}", self.0)
  }
}

/// Identifier of the context active on this thread, if any.
pub fn current() -> Option<ContextId> {
  TLS_CURRENT_CONTEXT.with(|rc| *rc.borrow())
}

/// Ownership of the current-context slot; releasing happens on drop.
#[derive(Debug)]
pub(crate) struct CurrentGuard {
  id: ContextId,
}

impl CurrentGuard {
  /// Claim the slot, or return [`None`] if another context holds it.
  pub(crate) fn acquire() -> Option<Self> {
    TLS_CURRENT_CONTEXT.with(|rc| {
      let mut current = rc.borrow_mut();

      match *current {
        Some(_) => None,

        None => {
          let id = ContextId::next();
          *current = Some(id);
          Some(CurrentGuard { id })
        }
      }
    })
  }

  pub(crate) fn id(&self) -> ContextId {
    self.id
  }
}

impl Drop for CurrentGuard {
  fn drop(&mut self) {
    release(self.id);
  }
}

/// Clear the slot held by `id`.
///
/// # Panics
///
/// Panics if `id` is not the current context: destroying a context that isn’t current is a bug.
fn release(id: ContextId) {
  TLS_CURRENT_CONTEXT.with(|rc| {
    let mut current = rc.borrow_mut();

    assert_eq!(
      *current,
      Some(id),
      "context {} destroyed while not current",
      id
    );

    *current = None;
  })
}
