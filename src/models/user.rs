//! User verification record.

use serde::{Deserialize, Serialize};

/// User record stored in Firestore, keyed by email.
///
/// Only verified users may edit regions. Accounts are created unverified
/// and flipped by an administrator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// `None` when the field is absent from the document
    #[serde(default)]
    pub verified: Option<bool>,
}

impl UserRecord {
    /// Record written on sign-up.
    pub fn unverified() -> Self {
        Self {
            verified: Some(false),
        }
    }

    pub fn is_verified(&self) -> bool {
        self.verified == Some(true)
    }
}
