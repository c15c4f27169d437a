//! IPC concurrency and callback-timeout scenarios driven through the real
//! `ApiServer`/`Transactor`/`CallbackBridge` stack rather than test doubles.

use perftest::api::ApiServer;
use perftest::callback::{CallbackBridge, Finisher};
use perftest::ipc::{ApiServerEndpoint, Transactor};
use perftest::perftest::{register_handlers, CollectionFactory};
use perftest::registry::Registry;
use perftest::types::ApiCallInfo;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn wired_client() -> (Arc<Transactor>, Arc<CallbackBridge>) {
    let api = Arc::new(ApiServer::new(Arc::new(Registry::new())));
    let bridge = Arc::new(CallbackBridge::new());
    register_handlers(&api, Arc::clone(&bridge), Arc::new(CollectionFactory::default()));

    let client = Arc::new(Transactor::client());
    client.init_and_connect_peer(Arc::new(ApiServerEndpoint::new(api)));
    (client, bridge)
}

#[test]
fn concurrent_transact_surfaces_api_usage_naming_both_calls() {
    let (client, bridge) = wired_client();
    bridge.register(
        "slow#1",
        Arc::new(|finisher: Finisher| {
            std::thread::sleep(Duration::from_millis(150));
            finisher.finish(true);
        }),
    );
    let create_reply = client.transact(ApiCallInfo::new(
        "PerfTest.create",
        vec![json!({"metrics": [0], "actionCode": "slow#1", "iterations": 1})],
    ));
    let obj_ref = create_reply.result_value.as_str().unwrap().to_string();

    let client2 = Arc::clone(&client);
    let obj_ref2 = obj_ref.clone();
    let first = std::thread::spawn(move || client2.transact(ApiCallInfo::on_object("PerfTest.run", &obj_ref2, vec![])));
    std::thread::sleep(Duration::from_millis(30));

    let second = client.transact(ApiCallInfo::on_object("PerfTest.getMeasureResult", &obj_ref, vec![json!(0)]));
    assert_eq!(second.exception.code, perftest::ErrCode::ApiUsage);
    assert!(second.exception.message.contains("PerfTest.run"));
    assert!(second.exception.message.contains("PerfTest.getMeasureResult"));

    assert!(first.join().unwrap().is_ok());
}

#[test]
fn action_callback_timeout_surfaces_as_callback_failed_with_exact_message() {
    let (client, bridge) = wired_client();
    bridge.register(
        "never#1",
        Arc::new(|_finisher: Finisher| {
            std::thread::sleep(Duration::from_secs(5));
        }),
    );

    let create_reply = client.transact(ApiCallInfo::new(
        "PerfTest.create",
        vec![json!({"metrics": [0], "actionCode": "never#1", "iterations": 1, "timeout": 200})],
    ));
    let obj_ref = create_reply.result_value.as_str().unwrap().to_string();

    let reply = client.transact(ApiCallInfo::on_object("PerfTest.run", &obj_ref, vec![]));
    assert_eq!(reply.exception.code, perftest::ErrCode::CallbackFailed);
    assert_eq!(reply.exception.message, "Code execution has been timeout.");
}

#[test]
fn peer_death_is_observable_and_blocks_further_transact() {
    let (client, _bridge) = wired_client();
    let create_reply = client.transact(ApiCallInfo::new(
        "PerfTest.create",
        vec![json!({"metrics": [0], "actionCode": "cb#1"})],
    ));
    assert!(create_reply.is_ok());

    client.notify_peer_death();
    assert_eq!(client.get_connection_stat(), perftest::ipc::ConnectionState::Disconnected);

    let reply = client.transact(ApiCallInfo::new("PerfTest.create", vec![json!({"metrics": [0], "actionCode": "cb#1"})]));
    assert_eq!(reply.exception.code, perftest::ErrCode::Internal);
    assert_eq!(reply.exception.message, "ipc connection is dead");
}
