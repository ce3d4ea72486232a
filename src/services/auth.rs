// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firebase Authentication client (Identity Toolkit REST API).
//!
//! Handles:
//! - Email/password sign-in and sign-up
//! - Mapping Identity Toolkit error codes to user-facing error kinds
//! - Remembering the signed-in account until sign-out

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde::Deserialize;

const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Why an authentication request failed, as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    EmailBadlyFormatted,
    WrongPassword,
    /// Password rejected by the password policy (sign-up)
    InvalidPassword,
    EmailNotRegistered,
    MalformedCredentials,
    Uncaught,
}

impl AuthErrorKind {
    /// Map an Identity Toolkit error message such as
    /// `"WEAK_PASSWORD : Password should be at least 6 characters"`.
    pub fn from_message(message: &str) -> Self {
        let code = message
            .split(|c: char| c == ':' || c.is_whitespace())
            .next()
            .unwrap_or_default();
        match code {
            "INVALID_EMAIL" => AuthErrorKind::EmailBadlyFormatted,
            "INVALID_PASSWORD" => AuthErrorKind::WrongPassword,
            "WEAK_PASSWORD" => AuthErrorKind::InvalidPassword,
            "EMAIL_NOT_FOUND" => AuthErrorKind::EmailNotRegistered,
            "INVALID_LOGIN_CREDENTIALS" => AuthErrorKind::MalformedCredentials,
            _ => AuthErrorKind::Uncaught,
        }
    }
}

/// Authentication failure.
#[derive(Debug, Clone, thiserror::Error)]
#[error("Authentication failed ({kind:?}): {message}")]
pub struct AuthError {
    pub kind: AuthErrorKind,
    pub message: String,
}

impl AuthError {
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            kind: AuthErrorKind::from_message(&message),
            message,
        }
    }

    fn transport(e: impl std::fmt::Display) -> Self {
        Self {
            kind: AuthErrorKind::Uncaught,
            message: e.to_string(),
        }
    }
}

/// The signed-in account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub email: String,
    pub local_id: String,
    pub id_token: String,
}

/// Email/password authentication backend.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, AuthError>;

    async fn sign_out(&self);

    /// Email of the account restored at startup, if any.
    fn current_email(&self) -> Option<String>;
}

/// Identity Toolkit REST client.
pub struct FirebaseAuthClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    current: Mutex<Option<AuthUser>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    email: Option<String>,
    local_id: String,
    id_token: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl FirebaseAuthClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, IDENTITY_TOOLKIT_URL.to_string())
    }

    /// Point the client at another endpoint (the Auth emulator, for one).
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            api_key,
            current: Mutex::new(None),
        }
    }

    async fn account_request(
        &self,
        endpoint: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthUser, AuthError> {
        let url = format!("{}/accounts:{}", self.base_url, endpoint);
        let body = serde_json::json!({
            "email": email,
            "password": password,
            "returnSecureToken": true,
        });

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(AuthError::transport)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(match serde_json::from_str::<ErrorEnvelope>(&body) {
                Ok(envelope) => AuthError::from_message(envelope.error.message),
                Err(_) => AuthError::transport(format!("HTTP {}: {}", status, body)),
            });
        }

        let account: AccountResponse = response
            .json()
            .await
            .map_err(|e| AuthError::transport(format!("JSON parse error: {}", e)))?;

        let user = AuthUser {
            email: account.email.unwrap_or_else(|| email.to_string()),
            local_id: account.local_id,
            id_token: account.id_token,
        };
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = Some(user.clone());
        Ok(user)
    }
}

#[async_trait]
impl AuthProvider for FirebaseAuthClient {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let user = self
            .account_request("signInWithPassword", email, password)
            .await?;
        tracing::info!(email = %user.email, "Signed in");
        Ok(user)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let user = self.account_request("signUp", email, password).await?;
        tracing::info!(email = %user.email, "Account created");
        Ok(user)
    }

    async fn sign_out(&self) {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    fn current_email(&self) -> Option<String> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|user| user.email.clone())
    }
}
