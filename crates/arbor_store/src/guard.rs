//! Scoped suppression guards.
//!
//! Both flags in this module follow the same contract: engaging a guard
//! records the flag's prior value and sets it; dropping the guard restores
//! the prior value. The flag is therefore never left engaged by an early
//! return or an error path, and nested guards unwind correctly.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Scoped handle for the "sync feedback disabled" flag.
///
/// While a `FeedbackGuard` is live, change feed events are stamped as
/// self-inflicted so sync-feedback listeners can ignore writes made by the
/// reconciliation run itself.
#[must_use = "the flag is restored when the guard drops"]
#[derive(Debug)]
pub struct FeedbackGuard {
    flag: Arc<AtomicBool>,
    prior: bool,
}

impl FeedbackGuard {
    /// Engages the flag, capturing its prior value.
    pub fn engage(flag: Arc<AtomicBool>) -> Self {
        let prior = flag.swap(true, Ordering::SeqCst);
        Self { flag, prior }
    }
}

impl Drop for FeedbackGuard {
    fn drop(&mut self) {
        self.flag.store(self.prior, Ordering::SeqCst);
    }
}

/// Scoped handle for pausing change notifications.
///
/// While a `NotificationsGuard` is live the store emits no change feed
/// events at all; used for whole-batch loads so external listeners do not
/// react to the sync's own writes.
#[must_use = "notifications resume when the guard drops"]
#[derive(Debug)]
pub struct NotificationsGuard {
    flag: Arc<AtomicBool>,
    prior: bool,
}

impl NotificationsGuard {
    /// Engages the pause flag, capturing its prior value.
    pub fn engage(flag: Arc<AtomicBool>) -> Self {
        let prior = flag.swap(true, Ordering::SeqCst);
        Self { flag, prior }
    }
}

impl Drop for NotificationsGuard {
    fn drop(&mut self) {
        self.flag.store(self.prior, Ordering::SeqCst);
    }
}
