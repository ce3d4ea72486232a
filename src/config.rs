// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.

use std::env;

use crate::services::filter::RegionFilter;

/// Default collection holding region documents.
pub const DEFAULT_REGIONS_COLLECTION: &str = "Markers";
/// Default collection holding user verification records.
pub const DEFAULT_USERS_COLLECTION: &str = "Users";

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// GCP project hosting the Firestore database
    pub gcp_project_id: String,
    /// Firebase Web API key used for email/password auth (optional for
    /// read-only tools)
    pub firebase_api_key: Option<String>,
    /// Collection holding region documents
    pub regions_collection: String,
    /// Collection holding `{verified}` user records keyed by email
    pub users_collection: String,
    /// Raw filter bounds as typed by the user (empty = unbounded)
    pub filter: FilterSettings,
}

/// The six raw filter bounds, kept as text until parsed into a
/// [`RegionFilter`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSettings {
    pub zc_range_start: String,
    pub zc_range_end: String,
    pub containment_range_start: String,
    pub containment_range_end: String,
    pub coefficient_range_start: String,
    pub coefficient_range_end: String,
}

impl FilterSettings {
    /// Parse the raw bounds into a filter.
    pub fn to_filter(&self) -> crate::error::Result<RegionFilter> {
        RegionFilter::from_settings(self)
    }
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            gcp_project_id: "test-project".to_string(),
            firebase_api_key: None,
            regions_collection: DEFAULT_REGIONS_COLLECTION.to_string(),
            users_collection: DEFAULT_USERS_COLLECTION.to_string(),
            filter: FilterSettings::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is honoured for local
    /// development.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            gcp_project_id: env::var("GCP_PROJECT_ID")
                .map_err(|_| ConfigError::Missing("GCP_PROJECT_ID"))?,
            firebase_api_key: env::var("FIREBASE_API_KEY")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            regions_collection: env::var("REGIONS_COLLECTION")
                .unwrap_or_else(|_| DEFAULT_REGIONS_COLLECTION.to_string()),
            users_collection: env::var("USERS_COLLECTION")
                .unwrap_or_else(|_| DEFAULT_USERS_COLLECTION.to_string()),
            filter: FilterSettings {
                zc_range_start: env_or_empty("FILTER_ZC_MIN"),
                zc_range_end: env_or_empty("FILTER_ZC_MAX"),
                containment_range_start: env_or_empty("FILTER_CONTAINMENT_MIN"),
                containment_range_end: env_or_empty("FILTER_CONTAINMENT_MAX"),
                coefficient_range_start: env_or_empty("FILTER_COEFFICIENT_MIN"),
                coefficient_range_end: env_or_empty("FILTER_COEFFICIENT_MAX"),
            },
        })
    }

    /// Require the Firebase API key (needed by anything that signs in).
    pub fn require_firebase_api_key(&self) -> Result<&str, ConfigError> {
        self.firebase_api_key
            .as_deref()
            .ok_or(ConfigError::Missing("FIREBASE_API_KEY"))
    }
}

fn env_or_empty(name: &str) -> String {
    env::var(name).map(|v| v.trim().to_string()).unwrap_or_default()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
