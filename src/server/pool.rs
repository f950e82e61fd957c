//! Fixed-capacity session pool
//!
//! Bounds the number of connections the server tracks at once. Each claimed
//! slot is an ownership token: it frees its bitmap entry when dropped, so a
//! slot can never be held by two connections.

use std::sync::{Arc, Mutex, MutexGuard};

/// Pool of session slots backed by a free bitmap.
///
/// An entry is `true` while the slot is free and `false` while it is in use.
#[derive(Debug, Clone)]
pub struct SessionPool {
    free: Arc<Mutex<Vec<bool>>>,
}

impl SessionPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            free: Arc::new(Mutex::new(vec![true; capacity])),
        }
    }

    pub fn capacity(&self) -> usize {
        self.bitmap().len()
    }

    /// Number of slots currently claimed.
    pub fn in_use(&self) -> usize {
        self.bitmap().iter().filter(|free| !**free).count()
    }

    /// Claims the lowest free slot, or `None` when every slot is taken.
    pub fn try_claim(&self) -> Option<Slot> {
        let mut free = self.bitmap();
        let index = free.iter().position(|f| *f)?;
        free[index] = false;

        Some(Slot {
            index,
            free: Arc::clone(&self.free),
        })
    }

    fn bitmap(&self) -> MutexGuard<'_, Vec<bool>> {
        // The bitmap is only ever flipped one entry at a time, so a poisoned
        // lock still guards consistent data.
        self.free.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// A claimed slot in a [`SessionPool`].
#[derive(Debug)]
pub struct Slot {
    index: usize,
    free: Arc<Mutex<Vec<bool>>>,
}

impl Slot {
    pub fn index(&self) -> usize {
        self.index
    }
}

impl Drop for Slot {
    fn drop(&mut self) {
        let mut free = self.free.lock().unwrap_or_else(|e| e.into_inner());
        free[self.index] = true;
    }
}
