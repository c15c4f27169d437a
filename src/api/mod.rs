//! The API Server: central handler registry, pre-processors, schema
//! validation, and the `call`/`callback` dispatch entry points.

use crate::error::ApiCallErr;
use crate::registry::Registry;
use crate::types::{ApiCallInfo, ApiReplyInfo};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// A registered front-end method handler.
pub type Handler = Arc<dyn Fn(&ApiCallInfo, &Arc<Registry>) -> Result<Value, ApiCallErr> + Send + Sync>;

/// A common pre-processor run before every dispatch.
pub type PreProcessor = Arc<dyn Fn(&ApiCallInfo) -> Result<(), ApiCallErr> + Send + Sync>;

/// The handler invoked for server→client callback forwarding, installed by
/// [`ApiServer::set_callback_handler`].
pub type CallbackHandler = Arc<dyn Fn(&ApiCallInfo) -> Result<Value, ApiCallErr> + Send + Sync>;

/// One positional parameter's declared type, for overload resolution.
#[derive(Debug, Clone)]
pub enum ParamType {
    /// Any JSON value is accepted.
    Json,
    /// Must be a JSON string naming a live backend object of this type.
    ClassRef(&'static str),
}

/// One overload's signature: declared parameter types plus how many of the
/// trailing parameters are optional (may be omitted from the call).
#[derive(Debug, Clone)]
pub struct MethodSignature {
    /// Declared type of each parameter, in order.
    pub param_types: Vec<ParamType>,
    /// Count of trailing parameters that may be omitted from the call.
    pub defaulted_suffix: usize,
}

impl MethodSignature {
    /// Builds a signature with no optional trailing parameters.
    #[must_use]
    pub fn required(param_types: Vec<ParamType>) -> Self {
        Self {
            param_types,
            defaulted_suffix: 0,
        }
    }

    /// Builds a signature whose last `defaulted_suffix` parameters are
    /// optional.
    #[must_use]
    pub fn with_defaulted_suffix(param_types: Vec<ParamType>, defaulted_suffix: usize) -> Self {
        Self {
            param_types,
            defaulted_suffix,
        }
    }

    fn required_count(&self) -> usize {
        self.param_types.len() - self.defaulted_suffix
    }

    /// Checks `params` against this signature. `Ok(())` on match; `Err`
    /// names the first failing argument by position.
    fn check(&self, params: &[Value], registry: &Registry) -> Result<(), String> {
        if params.len() < self.required_count() || params.len() > self.param_types.len() {
            return Err(format!(
                "expected {}..={} arguments, got {}",
                self.required_count(),
                self.param_types.len(),
                params.len()
            ));
        }
        for (i, (param, ty)) in params.iter().zip(self.param_types.iter()).enumerate() {
            match ty {
                ParamType::Json => {}
                ParamType::ClassRef(type_name) => {
                    let Some(obj_ref) = param.as_str() else {
                        return Err(format!("argument {i} must be a string object ref"));
                    };
                    if !obj_ref.starts_with(&format!("{type_name}#")) || !registry.contains(obj_ref) {
                        return Err(format!("argument {i} is not a live {type_name} ref"));
                    }
                }
            }
        }
        Ok(())
    }
}

struct Overload {
    signature: MethodSignature,
    handler: Handler,
}

/// The process-wide front-end dispatcher.
pub struct ApiServer {
    handlers: Mutex<HashMap<String, Vec<Overload>>>,
    preprocessors: Mutex<Vec<(String, PreProcessor)>>,
    callback_handler: Mutex<Option<CallbackHandler>>,
    registry: Arc<Registry>,
}

impl ApiServer {
    /// Builds a server backed by `registry`.
    #[must_use]
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            handlers: Mutex::new(HashMap::new()),
            preprocessors: Mutex::new(Vec::new()),
            callback_handler: Mutex::new(None),
            registry,
        }
    }

    /// The backend-object table this server dispatches against.
    #[must_use]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Registers one overload of `api_id`. Multiple overloads may share an
    /// `api_id`; they are tried in registration order.
    pub fn add_handler(&self, api_id: impl Into<String>, signature: MethodSignature, handler: Handler) {
        self.handlers
            .lock()
            .entry(api_id.into())
            .or_default()
            .push(Overload { signature, handler });
    }

    /// Removes every overload registered for `api_id`.
    pub fn remove_handler(&self, api_id: &str) {
        self.handlers.lock().remove(api_id);
    }

    /// True iff at least one overload is registered for `api_id`.
    #[must_use]
    pub fn has_handler_for(&self, api_id: &str) -> bool {
        self.handlers.lock().get(api_id).is_some_and(|v| !v.is_empty())
    }

    /// Registers a named pre-processor, run before every `call`.
    pub fn add_common_preprocessor(&self, name: impl Into<String>, processor: PreProcessor) {
        self.preprocessors.lock().push((name.into(), processor));
    }

    /// Removes a pre-processor by name.
    pub fn remove_common_preprocessor(&self, name: &str) {
        self.preprocessors.lock().retain(|(n, _)| n != name);
    }

    /// Installs the single handler for server→client callback forwarding.
    pub fn set_callback_handler(&self, handler: CallbackHandler) {
        *self.callback_handler.lock() = Some(handler);
    }

    /// The dispatch entry point: runs pre-processors, resolves the best
    /// matching overload, and invokes its handler. Never panics out to the
    /// caller; a handler panic is caught and reported as `Internal`.
    #[must_use]
    pub fn call(&self, call_info: &ApiCallInfo) -> ApiReplyInfo {
        tracing::debug!(api_id = %call_info.api_id, "dispatch");

        for (name, processor) in self.preprocessors.lock().iter() {
            if let Err(mut err) = processor(call_info) {
                err.message = format!("(PreProcessing: {name}) {}", err.message);
                tracing::warn!(api_id = %call_info.api_id, preprocessor = %name, "rejected by pre-processor");
                return ApiReplyInfo::err(err);
            }
        }

        let overloads_guard = self.handlers.lock();
        let Some(overloads) = overloads_guard.get(&call_info.api_id) else {
            return ApiReplyInfo::err(ApiCallErr::internal(format!(
                "No handler registered for {}",
                call_info.api_id
            )));
        };

        let mut first_failure: Option<String> = None;
        for overload in overloads {
            match overload.signature.check(&call_info.param_list, &self.registry) {
                Ok(()) => {
                    let handler = Arc::clone(&overload.handler);
                    drop(overloads_guard);
                    let result = panic::catch_unwind(AssertUnwindSafe(|| handler(call_info, &self.registry)));
                    return match result {
                        Ok(Ok(value)) => ApiReplyInfo::ok(value),
                        Ok(Err(err)) => {
                            tracing::warn!(api_id = %call_info.api_id, %err, "handler failed");
                            ApiReplyInfo::err(err)
                        }
                        Err(_) => ApiReplyInfo::err(ApiCallErr::internal("handler panicked")),
                    };
                }
                Err(reason) => {
                    if first_failure.is_none() {
                        first_failure = Some(reason);
                    }
                }
            }
        }
        ApiReplyInfo::err(ApiCallErr::invalid_input(
            first_failure.unwrap_or_else(|| "no matching overload".to_string()),
        ))
    }

    /// Forwards a server-originated callback request to the installed
    /// callback handler.
    ///
    /// # Errors
    /// `Internal("No callback handler set")` if none is installed.
    #[must_use]
    pub fn callback(&self, call_info: &ApiCallInfo) -> ApiReplyInfo {
        let handler = self.callback_handler.lock().clone();
        match handler {
            Some(handler) => match handler(call_info) {
                Ok(value) => ApiReplyInfo::ok(value),
                Err(err) => ApiReplyInfo::err(err),
            },
            None => ApiReplyInfo::err(ApiCallErr::internal("No callback handler set")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server() -> ApiServer {
        ApiServer::new(Arc::new(Registry::new()))
    }

    #[test]
    fn add_then_remove_handler_restores_has_handler_for_false() {
        let server = server();
        server.add_handler(
            "Echo.run",
            MethodSignature::required(vec![ParamType::Json]),
            Arc::new(|call, _| Ok(call.param_list[0].clone())),
        );
        assert!(server.has_handler_for("Echo.run"));
        server.remove_handler("Echo.run");
        assert!(!server.has_handler_for("Echo.run"));
    }

    #[test]
    fn wrong_arg_count_is_invalid_input_and_handler_not_invoked() {
        let server = server();
        let invoked = Arc::new(Mutex::new(false));
        let invoked2 = Arc::clone(&invoked);
        server.add_handler(
            "Echo.run",
            MethodSignature::required(vec![ParamType::Json]),
            Arc::new(move |_, _| {
                *invoked2.lock() = true;
                Ok(Value::Null)
            }),
        );
        let reply = server.call(&ApiCallInfo::new("Echo.run", vec![]));
        assert_eq!(reply.exception.code, crate::error::ErrCode::InvalidInput);
        assert!(!*invoked.lock());
    }

    #[test]
    fn preprocessor_rejection_prefixes_message_and_skips_handler() {
        let server = server();
        server.add_handler(
            "Echo.run",
            MethodSignature::required(vec![]),
            Arc::new(|_, _| Ok(Value::Null)),
        );
        server.add_common_preprocessor(
            "authCheck",
            Arc::new(|_| Err(ApiCallErr::invalid_input("missing token"))),
        );
        let reply = server.call(&ApiCallInfo::new("Echo.run", vec![]));
        assert!(reply.exception.message.starts_with("(PreProcessing: authCheck)"));
    }

    #[test]
    fn class_ref_param_must_be_a_live_object() {
        let server = server();
        let reg = server.registry();
        let live_ref = reg.store("Widget", Arc::new(42_u32), None);
        server.add_handler(
            "Widget.use",
            MethodSignature::required(vec![ParamType::ClassRef("Widget")]),
            Arc::new(|_, _| Ok(Value::Bool(true))),
        );
        let ok = server.call(&ApiCallInfo::new("Widget.use", vec![Value::String(live_ref)]));
        assert!(ok.is_ok());
        let bad = server.call(&ApiCallInfo::new("Widget.use", vec![Value::String("Widget#999".into())]));
        assert_eq!(bad.exception.code, crate::error::ErrCode::InvalidInput);
    }

    #[test]
    fn missing_handler_is_internal_error() {
        let server = server();
        let reply = server.call(&ApiCallInfo::new("Nope.run", vec![]));
        assert_eq!(reply.exception.code, crate::error::ErrCode::Internal);
    }

    #[test]
    fn callback_without_handler_set_is_internal() {
        let server = server();
        let reply = server.callback(&ApiCallInfo::new("PerfTest.run", vec![]));
        assert_eq!(reply.exception.code, crate::error::ErrCode::Internal);
    }
}
