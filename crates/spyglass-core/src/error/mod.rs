//! Error types for the session and telemetry core.
//!
//! Every public operation either succeeds or fails with a [`CoreError`].
//! Agent-facing failures are [`ToolError`] values carrying enough context
//! for an agent to pick its next move; the remaining kinds separate caller
//! bugs (validation), policy denials, and transport trouble, because only
//! some of them are worth retrying.

use serde_json::{Map, Value, json};
use thiserror::Error;

use spyglass_cdp::CdpError;

/// Structured error with context for AI agents.
#[derive(Debug, Clone, Error)]
#[error("[{tool}] {action} failed: {reason}. Suggestion: {suggestion}")]
pub struct ToolError {
    /// Tool that failed, e.g. "session", "page".
    pub tool: String,
    /// Action within the tool, e.g. "connect", "navigate".
    pub action: String,
    /// What went wrong.
    pub reason: String,
    /// What the agent should try instead.
    pub suggestion: String,
    /// Machine-readable context.
    pub details: Map<String, Value>,
}

impl ToolError {
    /// Build a tool error without details.
    #[must_use]
    pub fn new(
        tool: impl Into<String>,
        action: impl Into<String>,
        reason: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self {
            tool: tool.into(),
            action: action.into(),
            reason: reason.into(),
            suggestion: suggestion.into(),
            details: Map::new(),
        }
    }

    /// Attach a details entry.
    #[must_use]
    pub fn detail(mut self, key: impl Into<String>, value: Value) -> Self {
        self.details.insert(key.into(), value);
        self
    }

    /// Wire form of the error, as consumed by agents.
    pub fn to_value(&self) -> Value {
        json!({
            "error": true,
            "tool": self.tool,
            "action": self.action,
            "reason": self.reason,
            "suggestion": self.suggestion,
            "details": self.details,
        })
    }
}

/// All failure kinds surfaced by the core.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A structured agent-facing failure.
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// A transport, protocol, or timeout failure from the CDP layer.
    #[error(transparent)]
    Cdp(#[from] CdpError),

    /// Caller-supplied arguments were invalid. Never retried.
    #[error("validation error: {0}")]
    Validation(String),

    /// The safety layer refused the operation. Never retried.
    #[error("policy violation: {0}")]
    Policy(String),

    /// A required `eval_js` was refused because a JavaScript dialog is open.
    #[error("blocked by open JavaScript dialog")]
    DialogBlocked,
}

impl CoreError {
    /// Whether the retry primitive may re-attempt the failed operation.
    ///
    /// Transport-level trouble and structured tool errors are retryable;
    /// protocol errors, validation, policy denials, and dialog blocks are
    /// not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Tool(_) => true,
            Self::Cdp(err) => matches!(
                err,
                CdpError::ConnectionFailed(_)
                    | CdpError::ConnectionLost
                    | CdpError::SendFailed(_)
                    | CdpError::Timeout(_)
                    | CdpError::FrameTooLarge { .. }
                    | CdpError::HttpRequestFailed(_)
            ),
            Self::Validation(_) | Self::Policy(_) | Self::DialogBlocked => false,
        }
    }

    /// Wire form: tool errors keep their five fields, everything else is
    /// wrapped with a generic tool/action.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Tool(err) => err.to_value(),
            other => json!({
                "error": true,
                "tool": "core",
                "action": "call",
                "reason": other.to_string(),
                "suggestion": "Check the error reason and retry if it is transient",
                "details": {},
            }),
        }
    }
}
