//! Backend error types.

use kinship_core::{CursorError, FilterError, PageSizeError, StoreError};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Stable classification of every backend error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidArgument,
    NotFound,
    AlreadyExists,
    Internal,
    Cancelled,
    DeadlineExceeded,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidArgument => "invalid_argument",
            Self::NotFound => "not_found",
            Self::AlreadyExists => "already_exists",
            Self::Internal => "internal",
            Self::Cancelled => "cancelled",
            Self::DeadlineExceeded => "deadline_exceeded",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The aggregation step an upstream failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Draining accepted relationships of the subject
    FriendRelationships,
    /// Draining every relationship the subject takes part in
    InvolvedRelationships,
    /// Fetching the entities of the friend set
    FriendEntities,
    /// Fetching every entity for exclusion
    AllEntities,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FriendRelationships => "failed to fetch friend data",
            Self::InvolvedRelationships => "failed to fetch user relationship data",
            Self::FriendEntities => "failed to fetch user friends",
            Self::AllEntities => "failed to fetch all users list",
        })
    }
}

/// Errors that can occur during backend operations.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Malformed request input (id, token, page size, filter)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Failure inside a source
    #[error("internal error: {0}")]
    Internal(String),

    /// An upstream source failed during aggregation; the cause is logged, not exposed
    #[error("{phase}")]
    Upstream { phase: Phase },

    #[error("operation cancelled")]
    Cancelled,

    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("configuration error: {0}")]
    Config(#[from] kinship_config::ConfigError),
}

impl BackendError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn upstream(phase: Phase) -> Self {
        Self::Upstream { phase }
    }

    /// The stable code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::AlreadyExists(_) => ErrorCode::AlreadyExists,
            Self::Internal(_) | Self::Upstream { .. } | Self::Config(_) => ErrorCode::Internal,
            Self::Cancelled => ErrorCode::Cancelled,
            Self::DeadlineExceeded => ErrorCode::DeadlineExceeded,
        }
    }

    /// Cancellation and deadline errors travel through aggregation unchanged.
    pub fn is_interruption(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }

    /// Hide an upstream failure behind the phase it happened in.
    pub(crate) fn during(self, phase: Phase) -> Self {
        if self.is_interruption() {
            self
        } else {
            Self::upstream(phase)
        }
    }
}

impl From<StoreError> for BackendError {
    fn from(err: StoreError) -> Self {
        if err.is_invalid_argument() {
            return Self::InvalidArgument(err.to_string());
        }
        match err {
            StoreError::NotFound(msg) => Self::NotFound(msg),
            StoreError::AlreadyExists(msg) => Self::AlreadyExists(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<CursorError> for BackendError {
    fn from(err: CursorError) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}

impl From<FilterError> for BackendError {
    fn from(err: FilterError) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}

impl From<PageSizeError> for BackendError {
    fn from(err: PageSizeError) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}
