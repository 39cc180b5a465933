//! Error types for the Cloud Debugger client core.
//!
//! # Design
//! The only failure native to request building is a missing required or path
//! parameter, and it is reported before any executor runs. Transport errors,
//! authorization failures and server status codes such as `ABORTED` or
//! `NOT_FOUND` travel inside the executor's handle and never surface here.

use thiserror::Error;

use crate::endpoint::Operation;

/// Errors returned while building or dispatching a request.
#[derive(Debug, Error)]
pub enum ApiError {
    /// One or more required or path parameters were absent or empty.
    #[error("{operation}: Missing required parameters: {}", .names.join(", "))]
    MissingParameters {
        operation: Operation,
        names: Vec<&'static str>,
    },

    /// No operation carries the given dotted name.
    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ApiError {
    /// Names of the missing parameters, empty for any other variant.
    pub fn missing_parameters(&self) -> &[&'static str] {
        match self {
            ApiError::MissingParameters { names, .. } => names.as_slice(),
            _ => &[],
        }
    }
}
