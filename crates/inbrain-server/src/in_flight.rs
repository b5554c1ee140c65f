//! Per-user guard so only one clustering run is active for a user at a time.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct InFlight {
    users: Arc<Mutex<HashSet<Uuid>>>,
}

impl InFlight {
    /// Claim `user_id`. Returns `None` if a run for that user is already
    /// active; otherwise the claim is held until the guard drops.
    pub fn try_acquire(&self, user_id: Uuid) -> Option<InFlightGuard> {
        let inserted = self
            .users
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(user_id);
        inserted.then(|| InFlightGuard {
            users: Arc::clone(&self.users),
            user_id,
        })
    }
}

#[derive(Debug)]
pub struct InFlightGuard {
    users: Arc<Mutex<HashSet<Uuid>>>,
    user_id: Uuid,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.users
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.user_id);
    }
}
