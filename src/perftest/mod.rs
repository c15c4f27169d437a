//! The `PerfTest` backend object: strategy validation, the iteration loop,
//! and result aggregation.

pub mod collection;

pub use collection::{CollectionFactory, DataCollection, DurationCollection, PerfMetric, INITIAL_VALUE, INVALID_VALUE};

use crate::api::{ApiServer, Handler, MethodSignature, ParamType};
use crate::callback::CallbackBridge;
use crate::error::ApiCallErr;
use crate::registry::Registry;
use crate::types::ApiCallInfo;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

/// Default iteration count when a strategy omits `iterations`.
pub const DEFAULT_ITERATIONS: u32 = 5;
/// Default per-callback timeout in milliseconds when a strategy omits
/// `timeout`.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// A validated `PerfTest.create` request.
#[derive(Debug, Clone)]
pub struct PerfTestStrategy {
    /// Metrics to collect, in the order the client requested them.
    pub metrics: Vec<PerfMetric>,
    /// Callback ref the client registered for the measured action.
    pub action_code: String,
    /// Optional callback ref invoked after each round to reset state.
    pub reset_code: Option<String>,
    /// Owning application bundle name.
    pub bundle_name: String,
    /// Number of rounds to run.
    pub iterations: u32,
    /// Per-callback timeout in milliseconds.
    pub timeout_ms: u64,
}

/// Parses and validates a `PerfTest.create` strategy payload.
///
/// # Errors
/// `InvalidInput` for a missing/empty `metrics`, an out-of-range metric
/// value, or a missing `actionCode`. `InitializeFailed` if `bundleName` is
/// absent from both the payload and `caller_bundle_hint`.
pub fn parse_strategy(json: &Value, caller_bundle_hint: Option<&str>) -> Result<PerfTestStrategy, ApiCallErr> {
    let metrics_json = json
        .get("metrics")
        .and_then(Value::as_array)
        .ok_or_else(|| ApiCallErr::invalid_input("Metrics cannot be empty"))?;
    if metrics_json.is_empty() {
        return Err(ApiCallErr::invalid_input("Metrics cannot be empty"));
    }
    let mut metrics = Vec::with_capacity(metrics_json.len());
    for raw in metrics_json {
        let value = raw
            .as_i64()
            .ok_or_else(|| ApiCallErr::invalid_input("metrics entries must be integers"))?;
        let metric = PerfMetric::from_i32(value as i32)
            .ok_or_else(|| ApiCallErr::invalid_input(format!("metric {value} is out of range")))?;
        metrics.push(metric);
    }

    let action_code = json
        .get("actionCode")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiCallErr::invalid_input("actionCode must be a non-empty callback ref"))?
        .to_string();

    let reset_code = json
        .get("resetCode")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let bundle_name = json
        .get("bundleName")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| caller_bundle_hint.map(str::to_string))
        .ok_or_else(|| ApiCallErr::initialize_failed("unable to resolve caller bundle name"))?;

    let iterations = json
        .get("iterations")
        .and_then(Value::as_u64)
        .map_or(DEFAULT_ITERATIONS, |v| v as u32);

    let timeout_ms = json.get("timeout").and_then(Value::as_u64).unwrap_or(DEFAULT_TIMEOUT_MS);

    Ok(PerfTestStrategy {
        metrics,
        action_code,
        reset_code,
        bundle_name,
        iterations,
        timeout_ms,
    })
}

/// The aggregated result of one metric's measurement.
#[derive(Debug, Clone, Serialize)]
pub struct MeasureResult {
    /// The metric these values were collected for.
    pub metric: PerfMetric,
    /// Raw per-round values, in round order, including invalid rounds.
    pub round_values: Vec<f64>,
    /// Maximum over valid (> [`INVALID_VALUE`]) rounds, or 0 if none.
    pub maximum: f64,
    /// Minimum over valid rounds, or 0 if none.
    pub minimum: f64,
    /// Mean over valid rounds, or 0 if none.
    pub average: f64,
}

/// The `PerfTest` backend object.
pub struct PerfTest {
    strategy: PerfTestStrategy,
    collections: Mutex<HashMap<PerfMetric, Box<dyn DataCollection>>>,
    results: Mutex<HashMap<PerfMetric, Vec<f64>>>,
    is_measure_running: Mutex<bool>,
    is_measure_complete: Mutex<bool>,
}

impl PerfTest {
    /// Builds a `PerfTest` from a validated strategy, instantiating one
    /// collector per requested metric from `factory`. Metrics with no
    /// registered factory are skipped with a warning rather than failing.
    #[must_use]
    pub fn new(strategy: PerfTestStrategy, factory: &CollectionFactory) -> Self {
        let mut collections = HashMap::new();
        for metric in &strategy.metrics {
            if let Some(collector) = factory.build(*metric) {
                collections.insert(*metric, collector);
            } else {
                tracing::warn!(?metric, "no collector factory registered; metric will be skipped");
            }
        }
        Self {
            strategy,
            collections: Mutex::new(collections),
            results: Mutex::new(HashMap::new()),
            is_measure_running: Mutex::new(false),
            is_measure_complete: Mutex::new(false),
        }
    }

    /// The validated strategy this instance was created with.
    #[must_use]
    pub fn strategy(&self) -> &PerfTestStrategy {
        &self.strategy
    }

    /// Runs the iteration loop once. Refuses if already running.
    ///
    /// # Errors
    /// `Internal` if a run is already in progress; `DataCollectionFailed`
    /// if a collector fails to start or (propagated, though individual
    /// stop failures degrade to [`INVALID_VALUE`] instead); `CallbackFailed`
    /// if the action or reset callback fails.
    pub fn run(&self, bridge: &CallbackBridge) -> Result<(), ApiCallErr> {
        {
            let mut running = self.is_measure_running.lock();
            if *running {
                return Err(ApiCallErr::internal("PerfTest is already running"));
            }
            *running = true;
        }
        let outcome = self.run_rounds(bridge);
        *self.is_measure_running.lock() = false;
        if outcome.is_ok() {
            *self.is_measure_complete.lock() = true;
        }
        outcome
    }

    fn run_rounds(&self, bridge: &CallbackBridge) -> Result<(), ApiCallErr> {
        let timeout = Duration::from_millis(self.strategy.timeout_ms);
        for round in 0..self.strategy.iterations {
            tracing::debug!(round, total = self.strategy.iterations, "perf round starting");
            {
                let mut collections = self.collections.lock();
                for metric in &self.strategy.metrics {
                    if let Some(collector) = collections.get_mut(metric) {
                        collector.start_collection()?;
                    }
                }
            }

            bridge.invoke_run(&self.strategy.action_code, timeout)?;

            {
                let mut collections = self.collections.lock();
                let mut results = self.results.lock();
                for metric in &self.strategy.metrics {
                    if let Some(collector) = collections.get_mut(metric) {
                        let value = collector.stop_collection().unwrap_or(INVALID_VALUE);
                        results.entry(*metric).or_default().push(value);
                    }
                }
            }

            if let Some(reset_code) = &self.strategy.reset_code {
                bridge.invoke_run(reset_code, timeout)?;
            }
        }
        Ok(())
    }

    /// Returns the aggregated result for `metric`.
    ///
    /// # Errors
    /// `InvalidInput` if `metric` was not in the requested set; `Internal`
    /// if a run is in progress; `GetResultFailed` if no run has completed
    /// or the recorded round count does not match `iterations`.
    pub fn get_measure_result(&self, metric: PerfMetric) -> Result<MeasureResult, ApiCallErr> {
        if !self.strategy.metrics.contains(&metric) {
            return Err(ApiCallErr::invalid_input(format!("metric {metric:?} was not requested")));
        }
        if *self.is_measure_running.lock() {
            return Err(ApiCallErr::internal("measurement is still running"));
        }
        if !*self.is_measure_complete.lock() {
            return Err(ApiCallErr::get_result_failed("measurement has not completed"));
        }
        let round_values = self.results.lock().get(&metric).cloned().unwrap_or_default();
        if round_values.len() != self.strategy.iterations as usize {
            return Err(ApiCallErr::get_result_failed("round count does not match iterations"));
        }
        let valid: Vec<f64> = round_values.iter().copied().filter(|v| *v > INVALID_VALUE).collect();
        let (maximum, minimum, average) = if valid.is_empty() {
            (0.0, 0.0, 0.0)
        } else {
            let maximum = valid.iter().copied().fold(f64::MIN, f64::max);
            let minimum = valid.iter().copied().fold(f64::MAX, f64::min);
            let average = valid.iter().sum::<f64>() / valid.len() as f64;
            (maximum, minimum, average)
        };
        Ok(MeasureResult {
            metric,
            round_values,
            maximum,
            minimum,
            average,
        })
    }

    /// The client-held code refs this instance still owns, for the
    /// destroy-time callback notification.
    #[must_use]
    pub fn live_code_refs(&self) -> Vec<String> {
        let mut refs = vec![self.strategy.action_code.clone()];
        if let Some(reset_code) = &self.strategy.reset_code {
            refs.push(reset_code.clone());
        }
        refs
    }

    /// Notifies the client (via `api`'s installed callback handler) of the
    /// code refs it may now release. Refuses while a run is in progress;
    /// the caller is responsible for the actual backend-object removal.
    ///
    /// # Errors
    /// `Internal` if still running, or if the callback notification fails.
    pub fn destroy(&self, api: &ApiServer) -> Result<(), ApiCallErr> {
        if *self.is_measure_running.lock() {
            return Err(ApiCallErr::internal("cannot destroy while measurement is running"));
        }
        let reply = api.callback(&ApiCallInfo::new(
            "PerfTest.destroy",
            vec![serde_json::json!(self.live_code_refs())],
        ));
        if reply.is_ok() {
            Ok(())
        } else {
            Err(reply.exception)
        }
    }
}

/// Registers the `PerfTest.create` / `.run` / `.getMeasureResult` /
/// `.destroy` handlers onto `api`, closing over `bridge` and `factory`.
pub fn register_handlers(api: &Arc<ApiServer>, bridge: Arc<CallbackBridge>, factory: Arc<CollectionFactory>) {
    register_create(api, factory);
    register_run(api, Arc::clone(&bridge));
    register_get_measure_result(api);
    register_destroy(api);
}

fn register_create(api: &Arc<ApiServer>, factory: Arc<CollectionFactory>) {
    let handler: Handler = Arc::new(move |call, registry| {
        let strategy_json = call.param_list.first().cloned().unwrap_or(Value::Null);
        let strategy = parse_strategy(&strategy_json, None)?;
        let perf_test = Arc::new(PerfTest::new(strategy, &factory));
        let obj_ref = registry.store("PerfTest", perf_test, None);
        Ok(Value::String(obj_ref))
    });
    api.add_handler(
        "PerfTest.create",
        MethodSignature::required(vec![ParamType::Json]),
        handler,
    );
}

fn register_run(api: &Arc<ApiServer>, bridge: Arc<CallbackBridge>) {
    let handler: Handler = Arc::new(move |call, registry| {
        let obj_ref = call
            .caller_obj_ref
            .as_deref()
            .ok_or_else(|| ApiCallErr::internal("PerfTest.run requires an object ref"))?;
        let perf_test = registry.get::<PerfTest>(obj_ref)?;
        perf_test.run(&bridge)?;
        Ok(Value::Null)
    });
    api.add_handler("PerfTest.run", MethodSignature::required(vec![]), handler);
}

fn register_get_measure_result(api: &Arc<ApiServer>) {
    let handler: Handler = Arc::new(|call, registry| {
        let obj_ref = call
            .caller_obj_ref
            .as_deref()
            .ok_or_else(|| ApiCallErr::internal("PerfTest.getMeasureResult requires an object ref"))?;
        let perf_test = registry.get::<PerfTest>(obj_ref)?;
        let metric_value = call
            .param_list
            .first()
            .and_then(Value::as_i64)
            .ok_or_else(|| ApiCallErr::invalid_input("metric must be an integer"))?;
        let metric = PerfMetric::from_i32(metric_value as i32)
            .ok_or_else(|| ApiCallErr::invalid_input("metric out of range"))?;
        let result = perf_test.get_measure_result(metric)?;
        Ok(serde_json::to_value(result).expect("MeasureResult always serializes"))
    });
    api.add_handler(
        "PerfTest.getMeasureResult",
        MethodSignature::required(vec![ParamType::Json]),
        handler,
    );
}

fn register_destroy(api: &Arc<ApiServer>) {
    let weak: Weak<ApiServer> = Arc::downgrade(api);
    let handler: Handler = Arc::new(move |call, registry| {
        let obj_ref = call
            .caller_obj_ref
            .clone()
            .ok_or_else(|| ApiCallErr::internal("PerfTest.destroy requires an object ref"))?;
        let perf_test = registry.get::<PerfTest>(&obj_ref)?;
        let api = weak
            .upgrade()
            .ok_or_else(|| ApiCallErr::internal("API server is no longer available"))?;
        perf_test.destroy(&api)?;
        registry.remove_cascade(&obj_ref);
        Ok(Value::Null)
    });
    api.add_handler("PerfTest.destroy", MethodSignature::required(vec![]), handler);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use serde_json::json;

    fn new_server() -> Arc<ApiServer> {
        Arc::new(ApiServer::new(Arc::new(Registry::new())))
    }

    #[test]
    fn create_with_empty_metrics_is_invalid_input() {
        let err = parse_strategy(&json!({"metrics": [], "actionCode": "cb#1"}), None).unwrap_err();
        assert_eq!(err.code, crate::error::ErrCode::InvalidInput);
        assert!(err.message.contains("Metrics cannot be empty"));
    }

    #[test]
    fn create_then_get_measure_result_before_run_fails() {
        let api = new_server();
        let bridge = Arc::new(CallbackBridge::new());
        register_handlers(&api, Arc::clone(&bridge), Arc::new(CollectionFactory::default()));

        let create_reply = api.call(&ApiCallInfo::new(
            "PerfTest.create",
            vec![json!({"metrics": [0], "actionCode": "cb#1"})],
        ));
        assert!(create_reply.is_ok());
        let obj_ref = create_reply.result_value.as_str().unwrap().to_string();

        let reply = api.call(&ApiCallInfo::on_object("PerfTest.getMeasureResult", &obj_ref, vec![json!(0)]));
        assert_eq!(reply.exception.code, crate::error::ErrCode::GetResultFailed);
    }

    #[test]
    fn aggregation_reports_max_min_average_over_valid_rounds() {
        let mut factory = CollectionFactory::empty();
        factory.register(PerfMetric::Duration, || {
            struct Fixed(std::cell::Cell<std::collections::VecDeque<f64>>);
            impl DataCollection for Fixed {
                fn start_collection(&mut self) -> Result<(), ApiCallErr> {
                    Ok(())
                }
                fn stop_collection(&mut self) -> Result<f64, ApiCallErr> {
                    let mut queue = self.0.take();
                    let value = queue.pop_front().unwrap_or(INVALID_VALUE);
                    self.0.set(queue);
                    Ok(value)
                }
            }
            Box::new(Fixed(std::cell::Cell::new(
                std::collections::VecDeque::from([10.0, 20.0, 30.0]),
            )))
        });

        let strategy = parse_strategy(
            &json!({"metrics": [0], "actionCode": "cb#1", "iterations": 3}),
            Some("com.example.app"),
        )
        .unwrap();
        let perf_test = PerfTest::new(strategy, &factory);

        let bridge = CallbackBridge::new();
        bridge.register("cb#1", Arc::new(|finisher| finisher.finish(true)));
        perf_test.run(&bridge).unwrap();

        let result = perf_test.get_measure_result(PerfMetric::Duration).unwrap();
        assert_eq!(result.round_values, vec![10.0, 20.0, 30.0]);
        assert_eq!(result.maximum, 30.0);
        assert_eq!(result.minimum, 10.0);
        assert_eq!(result.average, 20.0);
    }

    #[test]
    fn all_invalid_rounds_aggregate_to_zero() {
        struct AlwaysInvalid;
        impl DataCollection for AlwaysInvalid {
            fn start_collection(&mut self) -> Result<(), ApiCallErr> {
                Ok(())
            }
            fn stop_collection(&mut self) -> Result<f64, ApiCallErr> {
                Ok(INVALID_VALUE)
            }
        }
        let mut factory = CollectionFactory::empty();
        factory.register(PerfMetric::Duration, || Box::new(AlwaysInvalid));

        let strategy = parse_strategy(
            &json!({"metrics": [0], "actionCode": "cb#1", "iterations": 2}),
            Some("com.example.app"),
        )
        .unwrap();
        let perf_test = PerfTest::new(strategy, &factory);
        let bridge = CallbackBridge::new();
        bridge.register("cb#1", Arc::new(|finisher| finisher.finish(true)));
        perf_test.run(&bridge).unwrap();

        let result = perf_test.get_measure_result(PerfMetric::Duration).unwrap();
        assert_eq!(result.maximum, 0.0);
        assert_eq!(result.minimum, 0.0);
        assert_eq!(result.average, 0.0);
    }

    #[test]
    fn concurrent_run_is_refused() {
        let strategy = parse_strategy(
            &json!({"metrics": [0], "actionCode": "cb#1", "iterations": 1}),
            Some("com.example.app"),
        )
        .unwrap();
        let factory = CollectionFactory::default();
        let perf_test = Arc::new(PerfTest::new(strategy, &factory));
        *perf_test.is_measure_running.lock() = true;
        let bridge = CallbackBridge::new();
        let err = perf_test.run(&bridge).unwrap_err();
        assert_eq!(err.code, crate::error::ErrCode::Internal);
    }
}
