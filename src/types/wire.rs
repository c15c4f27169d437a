//! The language-neutral request/reply envelope carried over the IPC
//! transactor.

use crate::error::ApiCallErr;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One outbound call: `{api, this?, args:[…]}` on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiCallInfo {
    /// Dotted apiId naming the front-end method, e.g. `"PerfTest.run"`.
    pub api_id: String,
    /// The backend-object ref this call targets, if any (absent for
    /// static/constructor calls such as `PerfTest.create`).
    pub caller_obj_ref: Option<String>,
    /// Positional arguments.
    pub param_list: Vec<Value>,
}

impl ApiCallInfo {
    /// Builds a call with no target object ref (a static/constructor call).
    #[must_use]
    pub fn new(api_id: impl Into<String>, param_list: Vec<Value>) -> Self {
        Self {
            api_id: api_id.into(),
            caller_obj_ref: None,
            param_list,
        }
    }

    /// Builds a call targeting an existing backend object.
    #[must_use]
    pub fn on_object(
        api_id: impl Into<String>,
        caller_obj_ref: impl Into<String>,
        param_list: Vec<Value>,
    ) -> Self {
        Self {
            api_id: api_id.into(),
            caller_obj_ref: Some(caller_obj_ref.into()),
            param_list,
        }
    }
}

/// The reply to one [`ApiCallInfo`]: either a result value or an exception.
///
/// `{result: …}` or `{exception: {code, message}}` on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiReplyInfo {
    /// The call's return value, `Value::Null` when the call has no result
    /// or failed.
    pub result_value: Value,
    /// The error carrier. [`ApiCallErr::is_ok`] is true for a successful
    /// reply.
    pub exception: ApiCallErr,
}

impl ApiReplyInfo {
    /// A successful reply carrying `result`.
    #[must_use]
    pub fn ok(result: Value) -> Self {
        Self {
            result_value: result,
            exception: ApiCallErr::default(),
        }
    }

    /// A failed reply carrying `err`.
    #[must_use]
    pub fn err(err: ApiCallErr) -> Self {
        Self {
            result_value: Value::Null,
            exception: err,
        }
    }

    /// True iff this reply carries no exception.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.exception.is_ok()
    }
}

impl Default for ApiReplyInfo {
    fn default() -> Self {
        Self::ok(Value::Null)
    }
}
