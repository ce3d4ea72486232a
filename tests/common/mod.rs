// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use geo::Rect;
use metals_tracker::config::Config;
use metals_tracker::db::{FirestoreDb, MemoryDb};
use metals_tracker::error::Result;
use metals_tracker::models::{GeoPoint, Measurement, PollutionDegree, RegionDocument};
use metals_tracker::services::{AuthError, AuthProvider, AuthUser, GeoObject, Geocoder};
use metals_tracker::{MapSession, MapView, RenderedRegion};

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new(&Config::default())
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Region document with one `(element, containment, threshold)` entry per
/// measurement and a small triangle as its boundary.
#[allow(dead_code)]
pub fn region_doc(name: &str, measurements: &[(&str, f64, f64)]) -> RegionDocument {
    let elements: BTreeMap<String, Vec<f64>> = measurements
        .iter()
        .map(|(element, containment, threshold)| {
            let m = Measurement::new(*containment, *threshold, PollutionDegree::Average);
            (element.to_string(), m.to_wire())
        })
        .collect();
    RegionDocument {
        id: None,
        name: Some(name.to_string()),
        descriptions: Some(vec![]),
        elements: Some(elements),
        latitudes: Some(vec![67.60, 67.61, 67.59]),
        longitudes: Some(vec![33.10, 33.12, 33.13]),
    }
}

/// Geocoder returning one hit per query, named after the query.
#[derive(Default)]
pub struct FakeGeocoder {
    pub queries: Mutex<Vec<String>>,
}

#[async_trait]
impl Geocoder for FakeGeocoder {
    async fn search(
        &self,
        text: &str,
        _bounds: Rect<f64>,
        _page_size: usize,
    ) -> Result<Vec<GeoObject>> {
        self.queries.lock().unwrap().push(text.to_string());
        Ok(vec![GeoObject {
            name: text.to_string(),
            description: "Murmansk Oblast".to_string(),
            point: Some(GeoPoint::new(67.61, 33.67)),
        }])
    }
}

/// Auth provider backed by a fixed email → password table.
#[derive(Default)]
pub struct FakeAuth {
    accounts: Mutex<HashMap<String, String>>,
}

impl FakeAuth {
    #[allow(dead_code)]
    pub fn with_account(email: &str, password: &str) -> Self {
        let auth = Self::default();
        auth.accounts
            .lock()
            .unwrap()
            .insert(email.to_string(), password.to_string());
        auth
    }
}

fn auth_user(email: &str) -> AuthUser {
    AuthUser {
        email: email.to_string(),
        local_id: format!("uid-{email}"),
        id_token: "test-token".to_string(),
    }
}

#[async_trait]
impl AuthProvider for FakeAuth {
    async fn sign_in(&self, email: &str, password: &str) -> std::result::Result<AuthUser, AuthError> {
        match self.accounts.lock().unwrap().get(email) {
            Some(stored) if stored == password => Ok(auth_user(email)),
            Some(_) => Err(AuthError::from_message("INVALID_PASSWORD")),
            None => Err(AuthError::from_message("EMAIL_NOT_FOUND")),
        }
    }

    async fn sign_up(&self, email: &str, password: &str) -> std::result::Result<AuthUser, AuthError> {
        self.accounts
            .lock()
            .unwrap()
            .insert(email.to_string(), password.to_string());
        Ok(auth_user(email))
    }

    async fn sign_out(&self) {}

    fn current_email(&self) -> Option<String> {
        None
    }
}

/// Map view that keeps whatever was last rendered.
#[derive(Default)]
pub struct RecordingView {
    pub regions: Vec<RenderedRegion>,
    pub marker: Option<GeoPoint>,
}

impl MapView for RecordingView {
    fn render_regions(&mut self, regions: &[RenderedRegion]) {
        self.regions = regions.to_vec();
    }

    fn place_marker(&mut self, point: Option<GeoPoint>) {
        self.marker = point;
    }
}

/// Mounted session over an in-memory store.
#[allow(dead_code)]
pub async fn mounted_session(db: &MemoryDb, auth: FakeAuth) -> MapSession {
    let mut session = MapSession::new(
        &Config::default(),
        Arc::new(db.clone()),
        Arc::new(auth),
        Arc::new(FakeGeocoder::default()),
    )
    .expect("default filter parses");
    session.mount().await.expect("mount succeeds");
    session.poll();
    session
}
