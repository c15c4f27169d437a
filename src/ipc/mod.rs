//! The bidirectional IPC transactor: peer discovery, the connection state
//! machine, and the serialized client transact path.

pub mod broadcast;
pub mod transactor;

pub use broadcast::{Broadcast, ChannelBroadcast, RemoteEndpoint};
pub use transactor::{ConnectionState, Transactor};

use crate::error::ApiCallErr;
use serde_json::Value;
use std::time::Duration;

/// Prefix for the discovery broadcast event name; the full name appends
/// the connection token.
pub const PUBLISH_EVENT_PREFIX: &str = "perftest.api.caller.publish#";
/// Overall discovery timeout.
pub const WAIT_CONN_TIMEOUT_MS: u64 = 5000;
/// Maximum publish attempts while waiting for the client's back-caller
/// registration.
pub const PUBLISH_MAX_RETIES: u32 = 10;

fn event_name(token: &str) -> String {
    format!("{PUBLISH_EVENT_PREFIX}{token}")
}

fn back_caller_event_name(token: &str) -> String {
    format!("{}.backcaller", event_name(token))
}

/// Server-side discovery: publishes `stub_payload` under the token's event
/// and waits for the client to register its back-caller, retrying
/// publication up to [`PUBLISH_MAX_RETIES`] times at
/// `WAIT_CONN_TIMEOUT_MS / PUBLISH_MAX_RETIES` intervals.
///
/// # Errors
/// `InitializeFailed` if no back-caller registers within the full
/// discovery window.
pub fn publish_caller_and_wait_for_back_caller(
    broadcast: &dyn Broadcast,
    token: &str,
    stub_payload: Value,
) -> Result<Value, ApiCallErr> {
    let event = event_name(token);
    let back_caller_event = back_caller_event_name(token);
    let retry_interval = Duration::from_millis(WAIT_CONN_TIMEOUT_MS / u64::from(PUBLISH_MAX_RETIES));

    for attempt in 1..=PUBLISH_MAX_RETIES {
        broadcast.publish(&event, stub_payload.clone())?;
        match broadcast.subscribe(&back_caller_event, retry_interval) {
            Ok(back_caller_payload) => return Ok(back_caller_payload),
            Err(_) => {
                tracing::warn!(attempt, token, "discovery retry: no back-caller yet");
            }
        }
    }
    Err(ApiCallErr::initialize_failed(
        "no back-caller registered within the discovery window",
    ))
}

/// Client-side discovery: subscribes for the server's published stub and,
/// once received, immediately registers its own stub as the back-caller so
/// the server can invoke callbacks.
///
/// # Errors
/// `InitializeFailed` if the server's stub is not published within
/// [`WAIT_CONN_TIMEOUT_MS`].
pub fn wait_for_published_caller(
    broadcast: &dyn Broadcast,
    token: &str,
    local_stub_payload: Value,
) -> Result<Value, ApiCallErr> {
    let event = event_name(token);
    let server_stub = broadcast.subscribe(&event, Duration::from_millis(WAIT_CONN_TIMEOUT_MS))?;
    broadcast.publish(&back_caller_event_name(token), local_stub_payload)?;
    Ok(server_stub)
}
