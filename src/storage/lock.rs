//! Lock helpers that turn poisoning into storage errors

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::TallyError;

pub(crate) fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>, TallyError> {
    lock.read()
        .map_err(|e| TallyError::Storage(format!("Failed to acquire read lock: {}", e)))
}

pub(crate) fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>, TallyError> {
    lock.write()
        .map_err(|e| TallyError::Storage(format!("Failed to acquire write lock: {}", e)))
}
