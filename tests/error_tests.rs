// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use metals_tracker::error::AppError;
use metals_tracker::services::{AuthError, AuthErrorKind};

#[test]
fn test_only_authorization_asks_for_sign_in() {
    assert!(AppError::NotAuthorized.requires_sign_in());

    let err = AppError::Transport("deadline exceeded".to_string());
    assert!(!err.requires_sign_in());

    let err = AppError::malformed("r1", "missing field `name`");
    assert!(!err.requires_sign_in());
}

#[test]
fn test_transport_errors_are_transient() {
    assert!(AppError::Transport("unavailable".to_string()).is_transient());
    assert!(!AppError::InvalidFilter("x".to_string()).is_transient());
    assert!(!AppError::NotAuthorized.is_transient());
}

#[test]
fn test_malformed_message_names_document() {
    let err = AppError::malformed("r1", "3 latitudes but 2 longitudes");
    let message = err.to_string();
    assert!(message.contains("\"r1\""), "{message}");
    assert!(message.contains("3 latitudes but 2 longitudes"), "{message}");
}

#[test]
fn test_internal_wraps_anyhow() {
    let err: AppError = anyhow::anyhow!("listener died").into();
    assert!(matches!(err, AppError::Internal(_)));
    assert!(err.to_string().contains("listener died"));
}

#[test]
fn test_auth_error_keeps_original_message() {
    let err = AuthError::from_message("TOO_MANY_ATTEMPTS_TRY_LATER : Access disabled");
    assert_eq!(err.kind, AuthErrorKind::Uncaught);
    assert!(err.to_string().contains("TOO_MANY_ATTEMPTS_TRY_LATER"));
}
