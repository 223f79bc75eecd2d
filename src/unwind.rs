//! First-panic-wins capture across worker threads.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Mutex;

/// Thread-safe single-assignment slot for one panic payload.
///
/// Workers offer payloads through [`run_captured`](PanicSlot::run_captured);
/// the first offer wins and later offers are dropped. Once every worker has
/// joined, the owning thread drains the slot with
/// [`resume`](PanicSlot::resume), re-raising the captured payload unchanged.
pub(crate) struct PanicSlot {
    payload: Mutex<Option<Box<dyn Any + Send + 'static>>>,
}

impl PanicSlot {
    pub(crate) fn new() -> Self {
        Self {
            payload: Mutex::new(None),
        }
    }

    /// Run `op`, capturing a panic into the slot instead of unwinding the
    /// worker. The slot keeps the first payload it is offered.
    pub(crate) fn run_captured(&self, op: impl FnOnce()) {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(op)) {
            let mut guard = self.payload.lock().unwrap();
            if guard.is_none() {
                *guard = Some(payload);
            }
        }
    }

    /// Re-raise the captured panic on the calling thread, if any.
    pub(crate) fn resume(self) {
        if let Some(payload) = self.payload.into_inner().unwrap() {
            panic::resume_unwind(payload);
        }
    }
}
