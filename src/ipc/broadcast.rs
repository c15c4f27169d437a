//! The remote-object bus abstraction: a publish/subscribe broadcast used
//! only for peer discovery, and the remote endpoint a connected
//! [`super::transactor::Transactor`] forwards calls through.
//!
//! The real IPC substrate (the platform's common-event broadcast and
//! remote-object proxy/stub pair) is an external collaborator; these two
//! traits specify only the operations the transactor consumes, plus a
//! same-process, channel-backed implementation so discovery and transact
//! are independently testable.

use crate::error::ApiCallErr;
use crate::types::{ApiCallInfo, ApiReplyInfo};
use parking_lot::{Condvar, Mutex};
use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// A named publish/subscribe event bus used for peer discovery.
pub trait Broadcast: Send + Sync {
    /// Publishes `payload` under `event`, waking any subscriber.
    ///
    /// # Errors
    /// Implementation-defined; the reference implementation never fails.
    fn publish(&self, event: &str, payload: Value) -> Result<(), ApiCallErr>;

    /// Blocks up to `timeout` for `event` to be published, returning its
    /// most recent payload.
    ///
    /// # Errors
    /// `InitializeFailed` if `timeout` elapses with no publication.
    fn subscribe(&self, event: &str, timeout: Duration) -> Result<Value, ApiCallErr>;
}

/// A connected peer the transactor forwards calls to.
pub trait RemoteEndpoint: Send + Sync {
    /// Forwards one call to the peer and returns its reply.
    fn transact(&self, call: &ApiCallInfo) -> ApiReplyInfo;
}

/// A same-process [`Broadcast`] backed by a mutex-guarded map and a
/// condvar, standing in for the platform common-event bus in tests.
#[derive(Default)]
pub struct ChannelBroadcast {
    events: Mutex<HashMap<String, Value>>,
    cvar: Condvar,
}

impl ChannelBroadcast {
    /// Builds an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Broadcast for ChannelBroadcast {
    fn publish(&self, event: &str, payload: Value) -> Result<(), ApiCallErr> {
        self.events.lock().insert(event.to_string(), payload);
        self.cvar.notify_all();
        Ok(())
    }

    fn subscribe(&self, event: &str, timeout: Duration) -> Result<Value, ApiCallErr> {
        let mut events = self.events.lock();
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(value) = events.get(event) {
                return Ok(value.clone());
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(ApiCallErr::initialize_failed(format!("discovery timed out waiting for {event}")));
            }
            let result = self.cvar.wait_for(&mut events, remaining);
            if result.timed_out() && !events.contains_key(event) {
                return Err(ApiCallErr::initialize_failed(format!("discovery timed out waiting for {event}")));
            }
        }
    }
}

/// A [`RemoteEndpoint`] that forwards directly into an [`crate::api::ApiServer`].
pub struct ApiServerEndpoint(std::sync::Arc<crate::api::ApiServer>);

impl ApiServerEndpoint {
    /// Wraps `server` as a callable remote endpoint.
    #[must_use]
    pub fn new(server: std::sync::Arc<crate::api::ApiServer>) -> Self {
        Self(server)
    }
}

impl RemoteEndpoint for ApiServerEndpoint {
    fn transact(&self, call: &ApiCallInfo) -> ApiReplyInfo {
        self.0.call(call)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribe_before_publish_times_out() {
        let bus = ChannelBroadcast::new();
        let err = bus.subscribe("evt", Duration::from_millis(20)).unwrap_err();
        assert!(err.message.contains("timed out"));
    }

    #[test]
    fn publish_then_subscribe_returns_payload() {
        let bus = ChannelBroadcast::new();
        bus.publish("evt", serde_json::json!({"token": "abc"})).unwrap();
        let value = bus.subscribe("evt", Duration::from_millis(20)).unwrap();
        assert_eq!(value, serde_json::json!({"token": "abc"}));
    }

    #[test]
    fn publish_after_subscriber_waits_still_wakes_it() {
        let bus = std::sync::Arc::new(ChannelBroadcast::new());
        let bus2 = std::sync::Arc::clone(&bus);
        let handle = std::thread::spawn(move || bus2.subscribe("evt", Duration::from_secs(2)));
        std::thread::sleep(Duration::from_millis(20));
        bus.publish("evt", serde_json::json!(1)).unwrap();
        assert_eq!(handle.join().unwrap().unwrap(), serde_json::json!(1));
    }
}
