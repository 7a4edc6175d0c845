//! Poison-tolerant lock acquisition for the cache maps.
//!
//! Everything behind these locks is rebuildable from the database, so a
//! panic in another thread must not take the cache down with it. The
//! helpers log the recovery and hand back the guard; whatever stale state
//! the poisoned lock carries is corrected by the next invalidation.

use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::warn;

fn note_recovery(target: &'static str, op: &'static str, kind: &'static str) {
    warn!(
        target_module = target,
        op,
        lock_kind = kind,
        "Cache lock was poisoned; continuing with possibly stale state"
    );
}

pub(crate) fn rw_read<'a, T>(
    lock: &'a RwLock<T>,
    target: &'static str,
    op: &'static str,
) -> RwLockReadGuard<'a, T> {
    lock.read().unwrap_or_else(|poisoned| {
        note_recovery(target, op, "rwlock.read");
        poisoned.into_inner()
    })
}

pub(crate) fn rw_write<'a, T>(
    lock: &'a RwLock<T>,
    target: &'static str,
    op: &'static str,
) -> RwLockWriteGuard<'a, T> {
    lock.write().unwrap_or_else(|poisoned| {
        note_recovery(target, op, "rwlock.write");
        poisoned.into_inner()
    })
}

pub(crate) fn mutex_lock<'a, T>(
    lock: &'a Mutex<T>,
    target: &'static str,
    op: &'static str,
) -> MutexGuard<'a, T> {
    lock.lock().unwrap_or_else(|poisoned| {
        note_recovery(target, op, "mutex");
        poisoned.into_inner()
    })
}
