// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Signed-in account and its live verification flag.

use std::sync::Arc;

use tokio::sync::mpsc::error::TryRecvError;

use crate::db::{RegionStore, Snapshots};
use crate::models::UserRecord;
use crate::services::auth::{AuthErrorKind, AuthProvider};

/// Message attached to an email or password field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldMessage {
    EmptyEmail,
    EmptyPassword,
    Auth(AuthErrorKind),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    pub email: Option<FieldMessage>,
    pub password: Option<FieldMessage>,
}

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.password.is_none()
    }

    fn record(&mut self, kind: AuthErrorKind) {
        let message = Some(FieldMessage::Auth(kind));
        match kind {
            AuthErrorKind::EmailBadlyFormatted | AuthErrorKind::EmailNotRegistered => {
                self.email = message;
            }
            AuthErrorKind::WrongPassword | AuthErrorKind::InvalidPassword => {
                self.password = message;
            }
            AuthErrorKind::MalformedCredentials | AuthErrorKind::Uncaught => {
                self.email = message;
                self.password = message;
            }
        }
    }
}

/// Account state for one app session.
pub struct AccountSession {
    store: Arc<dyn RegionStore>,
    auth: Arc<dyn AuthProvider>,
    email: Option<String>,
    verified: Option<bool>,
    errors: FieldErrors,
    verification: Option<Snapshots<Option<UserRecord>>>,
}

impl AccountSession {
    pub fn new(store: Arc<dyn RegionStore>, auth: Arc<dyn AuthProvider>) -> Self {
        Self {
            store,
            auth,
            email: None,
            verified: None,
            errors: FieldErrors::default(),
            verification: None,
        }
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Verification flag; `None` until the user record has been read.
    pub fn verified(&self) -> Option<bool> {
        self.verified
    }

    pub fn is_verified(&self) -> bool {
        self.verified == Some(true)
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn reset_errors(&mut self) {
        self.errors = FieldErrors::default();
    }

    /// Pick up an account the auth provider still holds from earlier.
    pub async fn restore(&mut self) {
        if let Some(email) = self.auth.current_email() {
            self.email = Some(email);
            self.listen_verification().await;
        }
    }

    fn check_blank(&mut self, email: &str, password: &str) -> bool {
        if email.trim().is_empty() {
            self.errors.email = Some(FieldMessage::EmptyEmail);
            return false;
        }
        if password.trim().is_empty() {
            self.errors.password = Some(FieldMessage::EmptyPassword);
            return false;
        }
        true
    }

    /// Sign in. Returns whether the account is now signed in; failures
    /// are reported through [`errors`](Self::errors).
    pub async fn sign_in(&mut self, email: &str, password: &str) -> bool {
        if !self.check_blank(email, password) {
            return false;
        }

        match self.auth.sign_in(email, password).await {
            Ok(_) => {
                if self.email.as_deref() != Some(email) {
                    self.verification = None;
                    self.verified = None;
                }
                self.email = Some(email.to_string());
                self.listen_verification().await;
                true
            }
            Err(e) => {
                tracing::info!(error = %e, "Sign-in failed");
                self.errors.record(e.kind);
                false
            }
        }
    }

    /// Create the user record, register the account, then sign in.
    ///
    /// Sign-in is attempted whatever the registration outcome.
    pub async fn sign_up(&mut self, email: &str, password: &str) -> bool {
        if !self.check_blank(email, password) {
            return false;
        }

        if let Err(e) = self
            .store
            .create_user(email, &UserRecord::unverified())
            .await
        {
            tracing::warn!(error = %e, "Failed to create user record");
            return false;
        }

        if let Err(e) = self.auth.sign_up(email, password).await {
            tracing::info!(error = %e, "Sign-up failed, trying sign-in");
        }
        self.sign_in(email, password).await
    }

    pub async fn sign_out(&mut self) {
        self.verification = None;
        self.auth.sign_out().await;
        self.email = None;
        self.verified = None;
        tracing::info!("Signed out");
    }

    async fn listen_verification(&mut self) {
        let Some(email) = self.email.as_deref() else {
            return;
        };
        if self.verified.is_some() || self.verification.is_some() {
            return;
        }
        match self.store.watch_user(email).await {
            Ok(rx) => self.verification = Some(rx),
            Err(e) => tracing::warn!(error = %e, "Failed to watch user verification"),
        }
    }

    /// Apply pushed user records. Absent records leave the flag alone.
    pub fn apply_pending(&mut self) -> bool {
        let Some(verification) = self.verification.as_mut() else {
            return false;
        };
        let mut changed = false;
        loop {
            match verification.try_recv() {
                Ok(Some(record)) => {
                    changed |= self.verified != record.verified;
                    self.verified = record.verified;
                }
                Ok(None) => {}
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.verification = None;
                    break;
                }
            }
        }
        changed
    }

    /// Drop the verification watch without signing out.
    pub fn unsubscribe(&mut self) {
        self.verification = None;
    }
}
