//! Cross-cutting invariants from the dispatch and registry contracts that
//! aren't pinned to one specific handler.

use perftest::api::{ApiServer, MethodSignature, ParamType};
use perftest::registry::Registry;
use perftest::types::ApiCallInfo;
use perftest::ErrCode;
use serde_json::Value;
use std::sync::Arc;

#[test]
fn backend_object_ref_matches_type_hash_index_and_is_unique() {
    let registry = Registry::new();
    let refs: Vec<String> = (0..5).map(|i| registry.store("Widget", Arc::new(i), None)).collect();

    let re_pattern = |s: &str| {
        let Some((type_name, index)) = s.split_once('#') else {
            return false;
        };
        type_name == "Widget" && index.chars().all(|c| c.is_ascii_digit()) && !index.is_empty()
    };
    for r in &refs {
        assert!(re_pattern(r), "ref {r} must match ^Widget#\\d+$");
    }
    let unique: std::collections::HashSet<_> = refs.iter().collect();
    assert_eq!(unique.len(), refs.len(), "refs must be unique within process lifetime");
}

#[test]
fn two_concurrent_calls_do_not_corrupt_the_handler_map() {
    use std::sync::Barrier;
    let api = Arc::new(ApiServer::new(Arc::new(Registry::new())));
    for i in 0..8 {
        api.add_handler(
            format!("Echo.run{i}"),
            MethodSignature::required(vec![]),
            Arc::new(move |_, _| Ok(Value::from(i))),
        );
    }
    let barrier = Arc::new(Barrier::new(8));
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let api = Arc::clone(&api);
            let barrier = Arc::clone(&barrier);
            std::thread::spawn(move || {
                barrier.wait();
                api.call(&ApiCallInfo::new(format!("Echo.run{i}"), vec![]))
            })
        })
        .collect();
    for (i, handle) in handles.into_iter().enumerate() {
        let reply = handle.join().unwrap();
        assert!(reply.is_ok());
        assert_eq!(reply.result_value, Value::from(i));
    }
}

#[test]
fn wrong_arg_type_is_invalid_input() {
    let api = ApiServer::new(Arc::new(Registry::new()));
    api.add_handler(
        "Widget.use",
        MethodSignature::required(vec![ParamType::ClassRef("Widget")]),
        Arc::new(|_, _| Ok(Value::Bool(true))),
    );
    let reply = api.call(&ApiCallInfo::new("Widget.use", vec![Value::from(42)]));
    assert_eq!(reply.exception.code, ErrCode::InvalidInput);
}
