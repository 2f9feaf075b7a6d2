//! Structured error types shared across SAL crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`SalError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (set indices, shapes, etc.).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for the SAL workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum SalError {
    /// Invalid acquisition or sampler parameters, reported before any model query.
    #[error("config error: {0}")]
    Config(ErrorInfo),
    /// The supplied model does not implement a required predictive operation.
    #[error("capability error: {0}")]
    Capability(ErrorInfo),
    /// Structurally invalid task (mismatched sets, missing values, incompatible tag).
    #[error("task error: {0}")]
    Task(ErrorInfo),
    /// Model-internal numeric failure, passed through unmodified.
    #[error("numeric error: {0}")]
    Numeric(ErrorInfo),
    /// Serialization and schema errors.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl SalError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            SalError::Config(info)
            | SalError::Capability(info)
            | SalError::Task(info)
            | SalError::Numeric(info)
            | SalError::Serde(info) => info,
        }
    }

    /// Shorthand for a [`SalError::Config`] with a fresh payload.
    pub fn config(code: impl Into<String>, message: impl Into<String>) -> Self {
        SalError::Config(ErrorInfo::new(code, message))
    }

    /// Shorthand for a [`SalError::Task`] with a fresh payload.
    pub fn task(code: impl Into<String>, message: impl Into<String>) -> Self {
        SalError::Task(ErrorInfo::new(code, message))
    }

    /// Builds the canonical [`SalError::Capability`] for an unimplemented model operation.
    pub fn missing_capability(operation: &str) -> Self {
        SalError::Capability(
            ErrorInfo::new(
                "unsupported-operation",
                format!("model does not implement `{operation}`"),
            )
            .with_context("operation", operation),
        )
    }
}
