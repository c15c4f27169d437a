//! The closed ABI error-code set and the error carrier type.
//!
//! Every fallible seam in this crate returns `Result<T, ApiCallErr>`. The
//! numeric values of [`ErrCode`] are part of the wire ABI and must never be
//! renumbered.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of error codes surfaced across the API, IPC, select, and
/// perf-test subsystems. Numbering is fixed for wire compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum ErrCode {
    /// No error; used as the zero-value placeholder in a fresh reply.
    NoError = 0,
    /// Unable to resolve the caller's identity (e.g. bundle name by pid).
    InitializeFailed = 32_400_001,
    /// Missing handler, bad object ref, or an otherwise-unexpected failure.
    Internal = 32_400_002,
    /// Schema validation or strategy-argument validation failed.
    InvalidInput = 32_400_003,
    /// A client callback timed out, threw, or returned false.
    CallbackFailed = 32_400_004,
    /// A `DataCollection` failed to start or stop.
    DataCollectionFailed = 32_400_005,
    /// A result was requested before the owning run completed.
    GetResultFailed = 32_400_006,
    /// A client attempted a second `transact` while one was in flight.
    ApiUsage = 32_400_007,
}

impl ErrCode {
    /// Returns the wire-stable numeric value.
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for ErrCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NoError => "NoError",
            Self::InitializeFailed => "InitializeFailed",
            Self::Internal => "Internal",
            Self::InvalidInput => "InvalidInput",
            Self::CallbackFailed => "CallbackFailed",
            Self::DataCollectionFailed => "DataCollectionFailed",
            Self::GetResultFailed => "GetResultFailed",
            Self::ApiUsage => "ApiUsage",
        };
        write!(f, "{name}")
    }
}

/// The error carrier type threaded through every subsystem.
///
/// Mirrors the original implementation's `ApiCallErr(code, message)` pair.
/// Implements [`std::error::Error`] so it composes with `?` the way the
/// rest of the crate's fallible code expects.
#[derive(Debug, Clone, thiserror::Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct ApiCallErr {
    /// The closed error code.
    pub code: ErrCode,
    /// Human-readable detail. Never matched on structurally by consumers;
    /// only `code` is part of the ABI contract.
    pub message: String,
}

impl ApiCallErr {
    /// Builds a new error from a code and a message.
    pub fn new(code: ErrCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Shorthand for [`ErrCode::InvalidInput`].
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrCode::InvalidInput, message)
    }

    /// Shorthand for [`ErrCode::Internal`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrCode::Internal, message)
    }

    /// Shorthand for [`ErrCode::CallbackFailed`].
    pub fn callback_failed(message: impl Into<String>) -> Self {
        Self::new(ErrCode::CallbackFailed, message)
    }

    /// Shorthand for [`ErrCode::DataCollectionFailed`].
    pub fn data_collection_failed(message: impl Into<String>) -> Self {
        Self::new(ErrCode::DataCollectionFailed, message)
    }

    /// Shorthand for [`ErrCode::GetResultFailed`].
    pub fn get_result_failed(message: impl Into<String>) -> Self {
        Self::new(ErrCode::GetResultFailed, message)
    }

    /// Shorthand for [`ErrCode::ApiUsage`].
    pub fn api_usage(message: impl Into<String>) -> Self {
        Self::new(ErrCode::ApiUsage, message)
    }

    /// Shorthand for [`ErrCode::InitializeFailed`].
    pub fn initialize_failed(message: impl Into<String>) -> Self {
        Self::new(ErrCode::InitializeFailed, message)
    }

    /// True for the sentinel "no error" value.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self.code, ErrCode::NoError)
    }
}

impl Default for ApiCallErr {
    /// The "no error" sentinel used to initialize a fresh reply.
    fn default() -> Self {
        Self::new(ErrCode::NoError, String::new())
    }
}
