// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Regions (explored locations with element measurements)
//! - Users (verification records keyed by email)
//! - Snapshot listeners for both, torn down when the receiver is dropped

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use firestore::{FirestoreListenEvent, FirestoreListenerTarget, FirestoreMemListenStateStorage};
use tokio::sync::mpsc;

use crate::config::Config;
use crate::db::{RegionStore, Snapshots};
use crate::error::{AppError, Result};
use crate::models::{RegionDocument, UserRecord};

const REGIONS_TARGET_ID: u32 = 1;
const USER_TARGET_ID: u32 = 2;

/// Quiet period after a change event before the target is re-read.
const REFRESH_DEBOUNCE: Duration = Duration::from_millis(100);

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
    regions_collection: String,
    users_collection: String,
}

fn transport(e: impl std::fmt::Display) -> AppError {
    AppError::Transport(e.to_string())
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(config: &Config) -> Result<Self> {
        let client = if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            Self::create_emulator_client(&config.gcp_project_id).await?
        } else {
            let client = firestore::FirestoreDb::new(&config.gcp_project_id)
                .await
                .map_err(|e| transport(format!("Failed to connect to Firestore: {}", e)))?;
            tracing::info!(project = %config.gcp_project_id, "Connected to Firestore");
            client
        };

        Ok(Self {
            client: Some(client),
            regions_collection: config.regions_collection.clone(),
            users_collection: config.users_collection.clone(),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<firestore::FirestoreDb> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| transport(format!("Failed to connect to Firestore Emulator: {}", e)))?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );
        Ok(client)
    }

    /// Create a disconnected client (offline mode).
    ///
    /// All database operations will return a transport error if called.
    pub fn new_mock() -> Self {
        let config = Config::default();
        Self {
            client: None,
            regions_collection: config.regions_collection,
            users_collection: config.users_collection,
        }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb> {
        self.client
            .as_ref()
            .ok_or_else(|| transport("Database not connected (offline mode)"))
    }
}

async fn fetch_regions(
    client: &firestore::FirestoreDb,
    collection: &str,
) -> Result<Vec<RegionDocument>> {
    client
        .fluent()
        .select()
        .from(collection)
        .obj()
        .query()
        .await
        .map_err(transport)
}

async fn fetch_user(
    client: &firestore::FirestoreDb,
    collection: &str,
    email: &str,
) -> Result<Option<UserRecord>> {
    client
        .fluent()
        .select()
        .by_id_in(collection)
        .obj()
        .one(email)
        .await
        .map_err(transport)
}

fn is_document_event(event: &FirestoreListenEvent) -> bool {
    matches!(
        event,
        FirestoreListenEvent::DocumentChange(_)
            | FirestoreListenEvent::DocumentDelete(_)
            | FirestoreListenEvent::DocumentRemove(_)
    )
}

/// Wait for a change event, then swallow the rest of its burst.
/// Returns `false` once the listener side has gone away.
async fn coalesce(dirty: &mut mpsc::UnboundedReceiver<()>) -> bool {
    if dirty.recv().await.is_none() {
        return false;
    }
    tokio::time::sleep(REFRESH_DEBOUNCE).await;
    while dirty.try_recv().is_ok() {}
    true
}

/// One re-read per burst of change events, pushed to `tx` until its
/// receiver is dropped.
async fn refresh_loop<T, F, Fut>(
    tx: &mpsc::UnboundedSender<T>,
    dirty: &mut mpsc::UnboundedReceiver<()>,
    mut fetch: F,
) where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    loop {
        let more = tokio::select! {
            _ = tx.closed() => false,
            more = coalesce(dirty) => more,
        };
        if !more {
            return;
        }
        match fetch().await {
            Ok(snapshot) => {
                if tx.send(snapshot).is_err() {
                    return;
                }
            }
            Err(e) => tracing::warn!(error = %e, "Failed to re-read after change"),
        }
    }
}

#[async_trait]
impl RegionStore for FirestoreDb {
    // ─── Region Operations ───────────────────────────────────────

    async fn get_region(&self, id: &str) -> Result<Option<RegionDocument>> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(self.regions_collection.as_str())
            .obj()
            .one(id)
            .await
            .map_err(transport)
    }

    async fn list_regions(&self) -> Result<Vec<RegionDocument>> {
        fetch_regions(self.get_client()?, &self.regions_collection).await
    }

    /// Listens on the whole collection and re-reads it once per burst of
    /// document events, so each push is a complete snapshot.
    async fn watch_regions(&self) -> Result<Snapshots<Vec<RegionDocument>>> {
        let client = self.get_client()?.clone();
        let collection = self.regions_collection.clone();
        let (tx, rx) = mpsc::unbounded_channel();

        tx.send(fetch_regions(&client, &collection).await?).ok();

        let mut listener = client
            .create_listener(FirestoreMemListenStateStorage::new())
            .await
            .map_err(transport)?;
        client
            .fluent()
            .select()
            .from(collection.as_str())
            .listen()
            .add_target(FirestoreListenerTarget::new(REGIONS_TARGET_ID), &mut listener)
            .map_err(transport)?;

        let (dirty_tx, mut dirty_rx) = mpsc::unbounded_channel();
        listener
            .start(move |event| {
                if is_document_event(&event) {
                    dirty_tx.send(()).ok();
                }
                async { Ok(()) }
            })
            .await
            .map_err(transport)?;

        tokio::spawn(async move {
            refresh_loop(&tx, &mut dirty_rx, || fetch_regions(&client, &collection)).await;
            if let Err(e) = listener.shutdown().await {
                tracing::warn!(error = %e, "Failed to shut down region listener");
            }
            tracing::debug!("Region listener shut down");
        });

        Ok(rx)
    }

    async fn create_region(&self, doc: &RegionDocument) -> Result<String> {
        let created: RegionDocument = self
            .get_client()?
            .fluent()
            .insert()
            .into(self.regions_collection.as_str())
            .generate_document_id()
            .object(doc)
            .execute()
            .await
            .map_err(transport)?;

        created
            .id
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Firestore returned no document ID")))
    }

    async fn replace_region(&self, id: &str, doc: &RegionDocument) -> Result<()> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(self.regions_collection.as_str())
            .document_id(id)
            .object(doc)
            .execute()
            .await
            .map_err(transport)?;
        Ok(())
    }

    async fn delete_region(&self, id: &str) -> Result<()> {
        self.get_client()?
            .fluent()
            .delete()
            .from(self.regions_collection.as_str())
            .document_id(id)
            .execute()
            .await
            .map_err(transport)?;
        Ok(())
    }

    // ─── User Operations ─────────────────────────────────────────

    async fn get_user(&self, email: &str) -> Result<Option<UserRecord>> {
        fetch_user(self.get_client()?, &self.users_collection, email).await
    }

    async fn create_user(&self, email: &str, record: &UserRecord) -> Result<()> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(self.users_collection.as_str())
            .document_id(email)
            .object(record)
            .execute()
            .await
            .map_err(transport)?;
        Ok(())
    }

    async fn watch_user(&self, email: &str) -> Result<Snapshots<Option<UserRecord>>> {
        let client = self.get_client()?.clone();
        let collection = self.users_collection.clone();
        let email = email.to_string();
        let (tx, rx) = mpsc::unbounded_channel();

        tx.send(fetch_user(&client, &collection, &email).await?).ok();

        let mut listener = client
            .create_listener(FirestoreMemListenStateStorage::new())
            .await
            .map_err(transport)?;
        client
            .fluent()
            .select()
            .by_id_in(collection.as_str())
            .batch_listen([email.clone()])
            .add_target(FirestoreListenerTarget::new(USER_TARGET_ID), &mut listener)
            .map_err(transport)?;

        let (dirty_tx, mut dirty_rx) = mpsc::unbounded_channel();
        listener
            .start(move |event| {
                if is_document_event(&event) {
                    dirty_tx.send(()).ok();
                }
                async { Ok(()) }
            })
            .await
            .map_err(transport)?;

        tokio::spawn(async move {
            refresh_loop(&tx, &mut dirty_rx, || fetch_user(&client, &collection, &email)).await;
            if let Err(e) = listener.shutdown().await {
                tracing::warn!(error = %e, "Failed to shut down user listener");
            }
        });

        Ok(rx)
    }
}
