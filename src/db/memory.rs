// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process document store.
//!
//! Behaves like the Firestore wrapper (generated IDs, full-collection
//! snapshot pushes) and additionally records every write so tests can assert
//! on exactly which remote calls were issued.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::db::{RegionStore, Snapshots};
use crate::error::{AppError, Result};
use crate::models::{RegionDocument, UserRecord};

/// A write issued against the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    CreateRegion(String),
    ReplaceRegion(String),
    DeleteRegion(String),
    CreateUser(String),
}

#[derive(Default)]
struct Inner {
    regions: BTreeMap<String, RegionDocument>,
    users: BTreeMap<String, UserRecord>,
    next_id: u64,
    ops: Vec<StoreOp>,
    fail_writes: bool,
    region_watchers: Vec<mpsc::UnboundedSender<Vec<RegionDocument>>>,
    user_watchers: Vec<(String, mpsc::UnboundedSender<Option<UserRecord>>)>,
}

impl Inner {
    fn region_snapshot(&self) -> Vec<RegionDocument> {
        self.regions
            .iter()
            .map(|(id, doc)| RegionDocument {
                id: Some(id.clone()),
                ..doc.clone()
            })
            .collect()
    }

    fn notify_regions(&mut self) {
        let snapshot = self.region_snapshot();
        self.region_watchers
            .retain(|tx| tx.send(snapshot.clone()).is_ok());
    }

    fn notify_user(&mut self, email: &str) {
        let record = self.users.get(email).cloned();
        self.user_watchers
            .retain(|(watched, tx)| watched != email || tx.send(record.clone()).is_ok());
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes {
            return Err(AppError::Transport("write rejected (simulated)".to_string()));
        }
        Ok(())
    }
}

/// Shared in-memory store; clones see the same data.
#[derive(Clone, Default)]
pub struct MemoryDb {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed a region without recording an operation.
    pub fn seed_region(&self, id: &str, doc: RegionDocument) {
        let mut inner = self.lock();
        inner.regions.insert(id.to_string(), doc);
        inner.notify_regions();
    }

    /// Seed or change a user record without recording an operation, as an
    /// administrator flipping `verified` would.
    pub fn seed_user(&self, email: &str, record: UserRecord) {
        let mut inner = self.lock();
        inner.users.insert(email.to_string(), record);
        inner.notify_user(email);
    }

    /// Make every subsequent write fail with a transport error.
    pub fn fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    /// Writes issued so far, in order.
    pub fn operations(&self) -> Vec<StoreOp> {
        self.lock().ops.clone()
    }

    /// Stored regions, with IDs filled in.
    pub fn regions(&self) -> Vec<RegionDocument> {
        self.lock().region_snapshot()
    }

    /// Number of region subscriptions whose receiver is still alive.
    pub fn active_region_watchers(&self) -> usize {
        let mut inner = self.lock();
        inner.region_watchers.retain(|tx| !tx.is_closed());
        inner.region_watchers.len()
    }

    pub fn active_user_watchers(&self) -> usize {
        let mut inner = self.lock();
        inner.user_watchers.retain(|(_, tx)| !tx.is_closed());
        inner.user_watchers.len()
    }
}

#[async_trait]
impl RegionStore for MemoryDb {
    async fn get_region(&self, id: &str) -> Result<Option<RegionDocument>> {
        Ok(self.lock().regions.get(id).map(|doc| RegionDocument {
            id: Some(id.to_string()),
            ..doc.clone()
        }))
    }

    async fn list_regions(&self) -> Result<Vec<RegionDocument>> {
        Ok(self.lock().region_snapshot())
    }

    async fn watch_regions(&self) -> Result<Snapshots<Vec<RegionDocument>>> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.lock();
        tx.send(inner.region_snapshot()).ok();
        inner.region_watchers.push(tx);
        Ok(rx)
    }

    async fn create_region(&self, doc: &RegionDocument) -> Result<String> {
        let mut inner = self.lock();
        inner.check_writable()?;
        inner.next_id += 1;
        let id = format!("region-{}", inner.next_id);
        inner.regions.insert(
            id.clone(),
            RegionDocument {
                id: None,
                ..doc.clone()
            },
        );
        inner.ops.push(StoreOp::CreateRegion(id.clone()));
        inner.notify_regions();
        Ok(id)
    }

    async fn replace_region(&self, id: &str, doc: &RegionDocument) -> Result<()> {
        let mut inner = self.lock();
        inner.check_writable()?;
        inner.regions.insert(
            id.to_string(),
            RegionDocument {
                id: None,
                ..doc.clone()
            },
        );
        inner.ops.push(StoreOp::ReplaceRegion(id.to_string()));
        inner.notify_regions();
        Ok(())
    }

    async fn delete_region(&self, id: &str) -> Result<()> {
        let mut inner = self.lock();
        inner.check_writable()?;
        inner.regions.remove(id);
        inner.ops.push(StoreOp::DeleteRegion(id.to_string()));
        inner.notify_regions();
        Ok(())
    }

    async fn get_user(&self, email: &str) -> Result<Option<UserRecord>> {
        Ok(self.lock().users.get(email).cloned())
    }

    async fn create_user(&self, email: &str, record: &UserRecord) -> Result<()> {
        let mut inner = self.lock();
        inner.check_writable()?;
        inner.users.insert(email.to_string(), record.clone());
        inner.ops.push(StoreOp::CreateUser(email.to_string()));
        inner.notify_user(email);
        Ok(())
    }

    async fn watch_user(&self, email: &str) -> Result<Snapshots<Option<UserRecord>>> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.lock();
        tx.send(inner.users.get(email).cloned()).ok();
        inner.user_watchers.push((email.to_string(), tx));
        Ok(rx)
    }
}
