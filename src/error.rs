// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types.
//!
//! Nothing in here is fatal: malformed documents are skipped and logged,
//! authorization failures become a sign-in prompt, and transport failures
//! are reported as transient messages (or ignored, for search).

/// Application error type shared by the store, cache and editor layers.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Malformed document {id:?}: {reason}")]
    MalformedDocument { id: String, reason: String },

    #[error("Editing requires a verified account")]
    NotAuthorized,

    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Invalid filter value: {0}")]
    InvalidFilter(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Shorthand for a malformed document error.
    pub fn malformed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::MalformedDocument {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Whether the presentation layer should answer this error with a
    /// sign-in prompt rather than a plain warning.
    pub fn requires_sign_in(&self) -> bool {
        matches!(self, AppError::NotAuthorized)
    }

    /// Whether a retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::Transport(_))
    }
}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AppError>;
