// core/src/context.rs

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;

/// Shared, lockable workflow context.
///
/// Cloning a `Shared<T>` clones the handle, not the data: every step handler
/// in a workflow run observes and mutates the same underlying `T`.
///
/// The guards returned by [`read`](Shared::read) and [`write`](Shared::write)
/// are blocking `parking_lot` guards and MUST be dropped before any `.await`
/// suspension point.
#[derive(Debug)]
pub struct Shared<T: Send + Sync + 'static>(Arc<RwLock<T>>);

impl<T: Send + Sync + 'static> Shared<T> {
  pub fn new(data: T) -> Self {
    Shared(Arc::new(RwLock::new(data)))
  }

  /// Acquires a read lock. Drop the guard before awaiting.
  pub fn read(&self) -> RwLockReadGuard<'_, T> {
    self.0.read()
  }

  /// Acquires a write lock. Drop the guard before awaiting.
  pub fn write(&self) -> RwLockWriteGuard<'_, T> {
    self.0.write()
  }

  /// Non-blocking read attempt.
  pub fn try_read(&self) -> Option<RwLockReadGuard<'_, T>> {
    self.0.try_read()
  }

  /// Non-blocking write attempt.
  pub fn try_write(&self) -> Option<RwLockWriteGuard<'_, T>> {
    self.0.try_write()
  }
}

impl<T: Send + Sync + 'static> Clone for Shared<T> {
  fn clone(&self) -> Self {
    Shared(Arc::clone(&self.0))
  }
}

impl<T: Send + Sync + 'static + Default> Default for Shared<T> {
  fn default() -> Self {
    Self::new(Default::default())
  }
}
