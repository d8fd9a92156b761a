//! Pushline Harness
//!
//! In-memory stand-ins for the external collaborators of the pipeline: the
//! messaging provider and its native bridge, and the on-device notification
//! center. Every mock counts the calls it receives so tests can assert on side
//! effects without a live platform.

pub mod backend;
pub mod notifier;
pub mod service;

pub use backend::{InitBehavior, MockBackend};
pub use notifier::RecordingNotifier;
pub use service::MockMessagingService;

use std::sync::{Mutex, MutexGuard};

/// Lock a recording buffer; a panicked test thread does not invalidate it
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
