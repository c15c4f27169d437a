//! The connection state machine and the client/server transact path.

use super::broadcast::RemoteEndpoint;
use crate::error::ApiCallErr;
use crate::types::{ApiCallInfo, ApiReplyInfo};
use parking_lot::Mutex;
use std::sync::Arc;

/// The transactor's connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Before `init_and_connect_peer` has been called.
    Uninit,
    /// No live peer (either never connected, or the peer died).
    Disconnected,
    /// A peer proxy and death recipient are both in place.
    Connected,
}

/// One side of an IPC connection: a peer handle, connection state, and
/// (on the client side) the single-flight concurrency guard.
///
/// Both sides share this type; `enforce_concurrency_guard` distinguishes
/// them, matching the original's asymmetry between `ApiCallerClient` (which
/// serializes `transact`) and `ApiCallerServer` (which does not, since
/// handlers are expected to be re-entrant-safe).
pub struct Transactor {
    state: Mutex<ConnectionState>,
    peer: Mutex<Option<Arc<dyn RemoteEndpoint>>>,
    processing_api: Mutex<Option<String>>,
    death_callback: Mutex<Option<Arc<dyn Fn() + Send + Sync>>>,
    enforce_concurrency_guard: bool,
}

impl Transactor {
    /// Builds a transactor in [`ConnectionState::Uninit`].
    #[must_use]
    pub fn new(enforce_concurrency_guard: bool) -> Self {
        Self {
            state: Mutex::new(ConnectionState::Uninit),
            peer: Mutex::new(None),
            processing_api: Mutex::new(None),
            death_callback: Mutex::new(None),
            enforce_concurrency_guard,
        }
    }

    /// A client-side transactor: serializes `transact` calls.
    #[must_use]
    pub fn client() -> Self {
        Self::new(true)
    }

    /// A server-side transactor: does not serialize `transact`.
    #[must_use]
    pub fn server() -> Self {
        Self::new(false)
    }

    /// Completes discovery: installs the peer proxy and transitions to
    /// [`ConnectionState::Connected`]. Called once discovery (see
    /// [`super::discovery`]) has exchanged stubs with the peer.
    pub fn init_and_connect_peer(&self, peer: Arc<dyn RemoteEndpoint>) {
        *self.state.lock() = ConnectionState::Disconnected;
        *self.peer.lock() = Some(peer);
        *self.state.lock() = ConnectionState::Connected;
    }

    /// Installs the death callback invoked when the peer's death recipient
    /// fires.
    pub fn set_death_callback(&self, callback: Arc<dyn Fn() + Send + Sync>) {
        *self.death_callback.lock() = Some(callback);
    }

    /// The current connection state.
    #[must_use]
    pub fn get_connection_stat(&self) -> ConnectionState {
        *self.state.lock()
    }

    /// Simulates the peer's death recipient firing: transitions to
    /// [`ConnectionState::Disconnected`] and invokes the death callback, if
    /// one is installed. The death callback itself holds only a
    /// non-owning reference back to whatever owns this transactor, per the
    /// original's cyclic-ownership-avoidance design.
    pub fn notify_peer_death(&self) {
        *self.state.lock() = ConnectionState::Disconnected;
        let callback = self.death_callback.lock().clone();
        if let Some(callback) = callback {
            callback();
        }
    }

    /// Forwards `call` to the connected peer.
    ///
    /// On the client side (`enforce_concurrency_guard=true`), a second
    /// `transact` while one is in flight fails immediately with
    /// `ApiUsage`, naming both the in-flight and incoming `apiId`.
    pub fn transact(&self, call: ApiCallInfo) -> ApiReplyInfo {
        if self.enforce_concurrency_guard {
            let mut processing = self.processing_api.lock();
            if let Some(current) = processing.as_ref() {
                let reply = ApiReplyInfo::err(ApiCallErr::api_usage(format!(
                    "perftest-api does not allow calling concurrently, current processing: {current}, incoming: {}",
                    call.api_id
                )));
                return reply;
            }
            *processing = Some(call.api_id.clone());
        }

        let reply = self.dispatch(&call);

        if self.enforce_concurrency_guard {
            *self.processing_api.lock() = None;
        }
        reply
    }

    fn dispatch(&self, call: &ApiCallInfo) -> ApiReplyInfo {
        if *self.state.lock() != ConnectionState::Connected {
            return ApiReplyInfo::err(ApiCallErr::internal("ipc connection is dead"));
        }
        let peer = self.peer.lock().clone();
        match peer {
            Some(peer) => peer.transact(call),
            None => ApiReplyInfo::err(ApiCallErr::internal("ipc connection is dead")),
        }
    }
}
