//! Polyfill error types.

use alloc::string::String;
use core::fmt;

/// Result type for polyfill operations.
pub type JsResult<T> = Result<T, JsError>;

/// Errors raised by the polyfills.
///
/// Every variant is raised at the point where the precondition is violated
/// and is returned to the caller unchanged. Errors produced by user callbacks
/// pass through the iteration helpers untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum JsError {
    /// An argument expected to be callable is not.
    NotCallable(String),
    /// Fold over an empty (or fully sparse) array with no seed.
    EmptyReduction,
    /// Method invoked on `null` or `undefined`.
    NullishReceiver(String),
    /// `new` applied to something that cannot construct.
    NotConstructor(String),
    /// Any other type error.
    TypeError(String),
    /// A traversal would not terminate (flattening a cyclic array).
    RangeError(String),
    /// Generic error, typically raised by a callback.
    Error(String),
}

impl JsError {
    /// Create a not-callable error for the described value.
    pub fn not_callable<S: Into<String>>(what: S) -> Self {
        JsError::NotCallable(what.into())
    }

    /// Create a nullish-receiver error for the named method.
    pub fn nullish_receiver<S: Into<String>>(method: S) -> Self {
        JsError::NullishReceiver(method.into())
    }

    /// Create a not-a-constructor error.
    pub fn not_constructor<S: Into<String>>(what: S) -> Self {
        JsError::NotConstructor(what.into())
    }

    /// Create a type error.
    pub fn type_error<S: Into<String>>(msg: S) -> Self {
        JsError::TypeError(msg.into())
    }

    /// Create a range error.
    pub fn range_error<S: Into<String>>(msg: S) -> Self {
        JsError::RangeError(msg.into())
    }

    /// Create a generic error.
    pub fn error<S: Into<String>>(msg: S) -> Self {
        JsError::Error(msg.into())
    }

    /// Get the JavaScript error name.
    pub fn name(&self) -> &'static str {
        match self {
            JsError::NotCallable(_)
            | JsError::EmptyReduction
            | JsError::NullishReceiver(_)
            | JsError::NotConstructor(_)
            | JsError::TypeError(_) => "TypeError",
            JsError::RangeError(_) => "RangeError",
            JsError::Error(_) => "Error",
        }
    }

    /// Get the error message.
    pub fn message(&self) -> String {
        match self {
            JsError::NotCallable(what) => alloc::format!("{} is not a function", what),
            JsError::EmptyReduction => "Reduce of empty array with no initial value".into(),
            JsError::NullishReceiver(method) => {
                alloc::format!("{} called on null or undefined", method)
            }
            JsError::NotConstructor(what) => alloc::format!("{} is not a constructor", what),
            JsError::TypeError(msg) | JsError::RangeError(msg) | JsError::Error(msg) => {
                msg.clone()
            }
        }
    }
}

impl fmt::Display for JsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name(), self.message())
    }
}
