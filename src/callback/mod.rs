//! The client-side half of server-originated callbacks.
//!
//! Mirrors the original's callback-id → JS-function-reference map plus its
//! condvar-based "wait for the client to call finish" bridge. A code handle
//! here is any `Fn(Finisher) + Send + Sync` closure standing in for the
//! original's JS function reference.

use crate::error::ApiCallErr;
use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// A client-provided callback. Invoked with a [`Finisher`] the callback
/// must eventually resolve exactly once.
pub type CodeHandle = Arc<dyn Fn(Finisher) + Send + Sync>;

struct LockState {
    ready: bool,
    res: bool,
    err_msg: String,
}

/// Handed to a [`CodeHandle`] invocation; resolves the pending wait.
#[derive(Clone)]
pub struct Finisher {
    inner: Arc<(Mutex<LockState>, Condvar)>,
}

impl Finisher {
    /// Resolves the wait with a success/failure boolean.
    pub fn finish(&self, result: bool) {
        let (lock, cvar) = &*self.inner;
        let mut state = lock.lock();
        if state.ready {
            return;
        }
        state.res = result;
        state.ready = true;
        cvar.notify_all();
    }

    /// Resolves the wait with a captured host-side exception message.
    pub fn fail(&self, message: impl Into<String>) {
        let (lock, cvar) = &*self.inner;
        let mut state = lock.lock();
        if state.ready {
            return;
        }
        state.err_msg = message.into();
        state.ready = true;
        cvar.notify_all();
    }
}

/// The process-wide callback-id → code-handle map plus the dispatch logic
/// for `PerfTest.run` and `PerfTest.destroy` callback requests.
#[derive(Default)]
pub struct CallbackBridge {
    handles: Mutex<HashMap<String, CodeHandle>>,
}

impl CallbackBridge {
    /// Builds an empty bridge.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a code handle under `callback_id`, overwriting any
    /// previous registration for that id.
    pub fn register(&self, callback_id: impl Into<String>, handle: CodeHandle) {
        self.handles.lock().insert(callback_id.into(), handle);
    }

    /// True iff `callback_id` is currently registered.
    #[must_use]
    pub fn contains(&self, callback_id: &str) -> bool {
        self.handles.lock().contains_key(callback_id)
    }

    /// Dispatches `apiId="PerfTest.run"`: looks up `callback_id`, runs it on
    /// a worker thread passing a [`Finisher`], and blocks the calling thread
    /// until the callback resolves or `timeout` elapses.
    ///
    /// # Errors
    /// `CallbackFailed` if the id is unregistered, the callback times out,
    /// the callback reports an exception, or it resolves with `false`.
    pub fn invoke_run(&self, callback_id: &str, timeout: Duration) -> Result<(), ApiCallErr> {
        let handle = self.handles.lock().get(callback_id).cloned().ok_or_else(|| {
            ApiCallErr::callback_failed(format!("JsCallbackFunction is not referenced: {callback_id}"))
        })?;

        let inner = Arc::new((
            Mutex::new(LockState {
                ready: false,
                res: false,
                err_msg: String::new(),
            }),
            Condvar::new(),
        ));
        let finisher = Finisher {
            inner: Arc::clone(&inner),
        };

        tracing::debug!(callback_id, "dispatching callback to worker");
        std::thread::spawn(move || {
            handle(finisher);
        });

        let (lock, cvar) = &*inner;
        let mut state = lock.lock();
        let timed_out = if !state.ready {
            let wait_result = cvar.wait_for(&mut state, timeout);
            wait_result.timed_out() && !state.ready
        } else {
            false
        };

        if timed_out {
            tracing::warn!(callback_id, "callback execution timed out");
            return Err(ApiCallErr::callback_failed("Code execution has been timeout."));
        }
        if !state.err_msg.is_empty() {
            return Err(ApiCallErr::callback_failed(state.err_msg.clone()));
        }
        if !state.res {
            return Err(ApiCallErr::callback_failed("Callback execution return false"));
        }
        Ok(())
    }

    /// Dispatches `apiId="PerfTest.destroy"`: removes each id from the map,
    /// silently skipping ids already absent.
    pub fn destroy_callbacks(&self, callback_ids: &[String]) {
        let mut handles = self.handles.lock();
        for id in callback_ids {
            if handles.remove(id).is_none() {
                tracing::debug!(callback_id = %id, "destroy_callbacks: already absent");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unregistered_callback_id_fails() {
        let bridge = CallbackBridge::new();
        let err = bridge.invoke_run("missing#1", Duration::from_millis(50)).unwrap_err();
        assert!(err.message.contains("is not referenced"));
    }

    #[test]
    fn successful_finish_true_resolves_ok() {
        let bridge = CallbackBridge::new();
        bridge.register("cb#1", Arc::new(|finisher: Finisher| finisher.finish(true)));
        assert!(bridge.invoke_run("cb#1", Duration::from_millis(200)).is_ok());
    }

    #[test]
    fn finish_false_is_callback_failed() {
        let bridge = CallbackBridge::new();
        bridge.register("cb#1", Arc::new(|finisher: Finisher| finisher.finish(false)));
        let err = bridge.invoke_run("cb#1", Duration::from_millis(200)).unwrap_err();
        assert!(err.message.contains("return false"));
    }

    #[test]
    fn captured_exception_message_propagates() {
        let bridge = CallbackBridge::new();
        bridge.register("cb#1", Arc::new(|finisher: Finisher| finisher.fail("boom")));
        let err = bridge.invoke_run("cb#1", Duration::from_millis(200)).unwrap_err();
        assert_eq!(err.message, "boom");
    }

    #[test]
    fn never_resolving_callback_times_out() {
        let bridge = CallbackBridge::new();
        bridge.register("cb#1", Arc::new(|_finisher: Finisher| {
            std::thread::sleep(Duration::from_secs(10));
        }));
        let err = bridge.invoke_run("cb#1", Duration::from_millis(50)).unwrap_err();
        assert!(err.message.contains("timeout"));
    }

    #[test]
    fn destroy_callbacks_skips_absent_ids_without_panicking() {
        let bridge = CallbackBridge::new();
        bridge.register("cb#1", Arc::new(|finisher: Finisher| finisher.finish(true)));
        bridge.destroy_callbacks(&["cb#1".to_string(), "cb#missing".to_string()]);
        assert!(!bridge.contains("cb#1"));
    }
}
