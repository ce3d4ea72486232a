// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Local mirror of the remote regions collection.

use tokio::sync::mpsc::error::TryRecvError;

use crate::db::{RegionStore, Snapshots};
use crate::error::Result;
use crate::models::{Region, RegionDocument};

/// Parse a pushed snapshot. One bad document fails the whole snapshot.
pub fn sync(documents: Vec<RegionDocument>) -> Result<Vec<Region>> {
    documents.into_iter().map(Region::from_document).collect()
}

/// Incoming snapshots are held back while an edit session is active.
pub fn is_suspended(edit_mode_active: bool) -> bool {
    edit_mode_active
}

/// In-memory region list, kept in sync with the store through at most one
/// live subscription.
#[derive(Default)]
pub struct RegionCache {
    regions: Vec<Region>,
    subscription: Option<Snapshots<Vec<RegionDocument>>>,
    held: Option<Vec<RegionDocument>>,
}

impl RegionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// The working copy an edit session mutates.
    pub fn regions_mut(&mut self) -> &mut Vec<Region> {
        &mut self.regions
    }

    pub fn replace(&mut self, regions: Vec<Region>) {
        self.regions = regions;
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    /// Start (or restart) the collection subscription. Any previous
    /// subscription is dropped before the new one is opened.
    pub async fn subscribe<S: RegionStore + ?Sized>(&mut self, store: &S) -> Result<()> {
        self.unsubscribe();
        self.subscription = Some(store.watch_regions().await?);
        tracing::debug!("Subscribed to region snapshots");
        Ok(())
    }

    pub fn unsubscribe(&mut self) {
        self.held = None;
        if self.subscription.take().is_some() {
            tracing::debug!("Unsubscribed from region snapshots");
        }
    }

    /// Drain pushed snapshots and apply the newest one.
    ///
    /// While suspended the snapshots stay queued, so the newest one is
    /// applied as soon as editing ends. A malformed snapshot is logged and
    /// skipped; the current list is kept. Returns whether the list changed.
    pub fn apply_pending(&mut self, edit_mode_active: bool) -> bool {
        if is_suspended(edit_mode_active) {
            return false;
        }

        let mut latest = self.held.take();
        if let Some(subscription) = self.subscription.as_mut() {
            loop {
                match subscription.try_recv() {
                    Ok(snapshot) => latest = Some(snapshot),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        tracing::warn!("Region snapshot stream closed");
                        self.subscription = None;
                        break;
                    }
                }
            }
        }

        match latest {
            Some(documents) => self.apply(documents),
            None => false,
        }
    }

    /// Wait for the next pushed snapshot and apply it. While suspended the
    /// snapshot is held until [`apply_pending`](Self::apply_pending) runs
    /// with editing over. Returns `false` once the stream has ended.
    pub async fn next_snapshot(&mut self, edit_mode_active: bool) -> bool {
        if !is_suspended(edit_mode_active) {
            if let Some(documents) = self.held.take() {
                self.apply(documents);
                return true;
            }
        }
        let Some(subscription) = self.subscription.as_mut() else {
            return false;
        };
        let Some(documents) = subscription.recv().await else {
            self.subscription = None;
            return false;
        };
        if is_suspended(edit_mode_active) {
            self.held = Some(documents);
        } else {
            self.apply(documents);
        }
        true
    }

    fn apply(&mut self, documents: Vec<RegionDocument>) -> bool {
        match sync(documents) {
            Ok(regions) => {
                tracing::debug!(count = regions.len(), "Applied region snapshot");
                self.regions = regions;
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Skipping malformed region snapshot");
                false
            }
        }
    }
}
