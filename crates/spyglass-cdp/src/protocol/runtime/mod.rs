//! Runtime domain: JavaScript evaluation, console API, exceptions.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Parameters for Runtime.evaluate.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateParams {
    /// Expression to evaluate.
    pub expression: String,
    /// Whether the result is expected to be a JSON object that should be
    /// sent by value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_by_value: Option<bool>,
    /// Whether execution should await for resulting promise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub await_promise: Option<bool>,
    /// In silent mode exceptions thrown during evaluation are not reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub silent: Option<bool>,
    /// Terminate execution after this many milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<f64>,
}

impl EvaluateParams {
    /// Evaluate an expression by value, awaiting promises — the shape every
    /// session-level eval uses.
    #[must_use]
    pub fn by_value(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            return_by_value: Some(true),
            await_promise: Some(true),
            silent: None,
            timeout: None,
        }
    }
}

/// Result of Runtime.evaluate.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateResult {
    /// Evaluation result.
    pub result: RemoteObject,
    /// Exception details if the evaluation threw.
    pub exception_details: Option<ExceptionDetails>,
}

/// Parameters for Runtime.releaseObject.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseObjectParams {
    /// Identifier of the object to release.
    pub object_id: String,
}

/// Mirror object referencing the original JavaScript object.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteObject {
    /// Object type (object, function, string, number, etc.).
    #[serde(rename = "type")]
    pub object_type: String,
    /// Object subtype (array, null, error, etc.).
    pub subtype: Option<String>,
    /// Object class name.
    pub class_name: Option<String>,
    /// Primitive value or serializable JSON representation.
    pub value: Option<Value>,
    /// String representation of the object.
    pub description: Option<String>,
    /// Unique object identifier for non-primitive values.
    pub object_id: Option<String>,
}

/// Stack trace captured at an interesting moment.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackTrace {
    /// Label of this stack trace.
    pub description: Option<String>,
    /// Call frames, topmost first.
    pub call_frames: Vec<CallFrame>,
}

/// One frame of a stack trace.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallFrame {
    /// Function name.
    pub function_name: String,
    /// Script URL.
    pub url: String,
    /// Line number (0-based).
    pub line_number: i64,
    /// Column number (0-based).
    pub column_number: i64,
}

/// Details about an exception.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionDetails {
    /// Short description, e.g. "Uncaught".
    pub text: String,
    /// Line number of the exception location (0-based).
    pub line_number: i64,
    /// Column number of the exception location (0-based).
    pub column_number: i64,
    /// URL of the script where the exception happened.
    pub url: Option<String>,
    /// Stack trace if available.
    pub stack_trace: Option<StackTrace>,
    /// The thrown value itself.
    pub exception: Option<RemoteObject>,
}

impl ExceptionDetails {
    /// Best human-readable rendering of the thrown value.
    pub fn message(&self) -> String {
        self.exception
            .as_ref()
            .and_then(|e| e.description.clone())
            .unwrap_or_else(|| self.text.clone())
    }
}

/// Console API call kind, as reported by Runtime.consoleAPICalled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConsoleApiType {
    /// console.log()
    Log,
    /// console.debug()
    Debug,
    /// console.info()
    Info,
    /// console.error()
    Error,
    /// console.warn()
    Warning,
    /// console.dir()
    Dir,
    /// console.dirxml()
    Dirxml,
    /// console.table()
    Table,
    /// console.trace()
    Trace,
    /// console.clear()
    Clear,
    /// console.count()
    Count,
    /// console.assert()
    Assert,
    /// console.profile()
    Profile,
    /// console.profileEnd()
    ProfileEnd,
    /// console.group()
    StartGroup,
    /// console.groupCollapsed()
    StartGroupCollapsed,
    /// console.groupEnd()
    EndGroup,
    /// console.timeEnd()
    TimeEnd,
}

/// Event: Runtime.consoleAPICalled
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleApiCalledEvent {
    /// Console call kind.
    #[serde(rename = "type")]
    pub call_type: ConsoleApiType,
    /// Call arguments.
    pub args: Vec<RemoteObject>,
    /// Execution context the call was made in.
    pub execution_context_id: i64,
    /// Call timestamp.
    pub timestamp: f64,
    /// Stack trace captured when the call was made.
    pub stack_trace: Option<StackTrace>,
}

/// Event: Runtime.exceptionThrown
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionThrownEvent {
    /// Exception timestamp.
    pub timestamp: f64,
    /// Exception details.
    pub exception_details: ExceptionDetails,
}
