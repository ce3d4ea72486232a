// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Region editing state machine.
//!
//! Editing works on the cache's working copy, one boundary point at a time:
//! 1. `enter_edit` snapshots the baseline (verified users only)
//! 2. taps extend the focus polygon, or start a new region after
//!    `begin_append`
//! 3. `commit` turns the touched regions into store writes; `cancel`
//!    restores the baseline

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use futures_util::{stream, StreamExt};
use tokio::task::JoinHandle;

use crate::db::RegionStore;
use crate::error::{AppError, Result};
use crate::models::{GeoPoint, Measurement, Region, RegionDocument};

const MAX_CONCURRENT_WRITES: usize = 8;

/// A store write produced by committing an edit session.
#[derive(Debug, Clone, PartialEq)]
pub enum RegionChange {
    /// New region, stored under a generated ID
    Created(RegionDocument),
    /// Existing region, replaced wholesale
    Updated { id: String, document: RegionDocument },
    /// Existing region that no longer forms a polygon
    Deleted { id: String },
}

impl RegionChange {
    /// Decide what a touched region needs. Unpersisted regions with fewer
    /// than three points are dropped without any remote call.
    fn for_region(region: &Region) -> Option<Self> {
        match (region.is_persisted(), region.is_polygon()) {
            (true, false) => Some(RegionChange::Deleted {
                id: region.id.clone(),
            }),
            (true, true) => Some(RegionChange::Updated {
                id: region.id.clone(),
                document: region.to_document(),
            }),
            (false, false) => None,
            (false, true) => Some(RegionChange::Created(region.to_document())),
        }
    }

    pub async fn persist<S: RegionStore + ?Sized>(&self, store: &S) -> Result<()> {
        match self {
            RegionChange::Created(document) => {
                let id = store.create_region(document).await?;
                tracing::info!(id = %id, "Region created");
            }
            RegionChange::Updated { id, document } => {
                store.replace_region(id, document).await?;
                tracing::info!(id = %id, "Region updated");
            }
            RegionChange::Deleted { id } => {
                store.delete_region(id).await?;
                tracing::info!(id = %id, "Region deleted");
            }
        }
        Ok(())
    }
}

/// Issue commit writes in the background.
///
/// The returned handle may be dropped; failures are logged and never
/// reported back to the session, and nothing is retried.
pub fn persist_changes<S>(store: Arc<S>, changes: Vec<RegionChange>) -> JoinHandle<()>
where
    S: RegionStore + ?Sized + 'static,
{
    tokio::spawn(async move {
        stream::iter(changes)
            .for_each_concurrent(MAX_CONCURRENT_WRITES, |change| {
                let store = Arc::clone(&store);
                async move {
                    if let Err(e) = change.persist(store.as_ref()).await {
                        tracing::warn!(error = %e, change = ?change, "Region write failed");
                    }
                }
            })
            .await;
    })
}

/// Bookkeeping for one edit session.
#[derive(Debug, Clone)]
struct EditSession {
    /// Collection as it was on entry; never aliased with the working copy
    baseline: Vec<Region>,
    focus: Option<usize>,
    last_point: Option<GeoPoint>,
    pending_append: bool,
    /// Indices of working regions mutated during the session
    touched: BTreeSet<usize>,
}

impl EditSession {
    fn touch(&mut self, index: usize) {
        self.touched.insert(index);
    }
}

/// Region picked on the map outside of edit mode, for the details screen.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub region: Region,
    pub point: GeoPoint,
}

#[derive(Debug, Clone, Default)]
enum EditorState {
    #[default]
    Viewing,
    Editing(EditSession),
}

/// Viewing/Editing state machine over a working region list.
#[derive(Debug, Default)]
pub struct RegionEditor {
    state: EditorState,
    selection: Option<Selection>,
}

impl RegionEditor {
    pub fn new() -> Self {
        Self::default()
    }

    fn session(&self) -> Option<&EditSession> {
        match &self.state {
            EditorState::Editing(session) => Some(session),
            EditorState::Viewing => None,
        }
    }

    fn session_mut(&mut self) -> Option<&mut EditSession> {
        match &mut self.state {
            EditorState::Editing(session) => Some(session),
            EditorState::Viewing => None,
        }
    }

    pub fn is_editing(&self) -> bool {
        self.session().is_some()
    }

    /// Whether the next tap starts a new region.
    pub fn is_appending(&self) -> bool {
        self.session().is_some_and(|s| s.pending_append)
    }

    /// Index of the region being drawn.
    pub fn focus(&self) -> Option<usize> {
        self.session().and_then(|s| s.focus)
    }

    pub fn focus_region<'a>(&self, working: &'a [Region]) -> Option<&'a Region> {
        self.focus().and_then(|i| working.get(i))
    }

    /// Last point added or tapped during the session.
    pub fn last_point(&self) -> Option<GeoPoint> {
        self.session().and_then(|s| s.last_point)
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// Enter edit mode. Only verified accounts may edit.
    pub fn enter_edit(&mut self, verified: bool, working: &[Region]) -> Result<()> {
        if self.is_editing() {
            return Ok(());
        }
        if !verified {
            tracing::debug!("Edit mode refused for unverified account");
            return Err(AppError::NotAuthorized);
        }

        self.state = EditorState::Editing(EditSession {
            baseline: working.to_vec(),
            focus: working.len().checked_sub(1),
            last_point: None,
            pending_append: false,
            touched: BTreeSet::new(),
        });
        tracing::info!(regions = working.len(), "Entered edit mode");
        Ok(())
    }

    /// Make the next tap start a new region.
    pub fn begin_append(&mut self) {
        if let Some(session) = self.session_mut() {
            session.pending_append = true;
        }
    }

    /// A tap on empty map. Starts a new region if one was requested,
    /// otherwise extends the focus polygon. Ignored outside edit mode.
    pub fn tap_point(&mut self, working: &mut Vec<Region>, point: GeoPoint) {
        let Some(session) = self.session_mut() else {
            return;
        };

        if session.pending_append {
            working.push(Region::starting_at(point));
            let index = working.len() - 1;
            session.focus = Some(index);
            session.pending_append = false;
            session.last_point = Some(point);
            session.touch(index);
            tracing::debug!(index, "Started new region");
            return;
        }

        Self::extend(session, working, point);
    }

    fn extend(session: &mut EditSession, working: &mut [Region], point: GeoPoint) {
        let Some(region) = session.focus.and_then(|i| working.get_mut(i)) else {
            return;
        };
        region.points.push(point);
        session.last_point = Some(point);
        if let Some(index) = session.focus {
            session.touch(index);
        }
    }

    /// A tap on a rendered polygon.
    ///
    /// While editing, tapping the focus polygon extends it and tapping any
    /// other polygon moves the focus there. While viewing, the region is
    /// remembered for the details screen.
    pub fn select_region(&mut self, working: &mut [Region], index: usize, point: GeoPoint) {
        let Some(region) = working.get(index) else {
            return;
        };
        match &mut self.state {
            EditorState::Viewing => {
                self.selection = Some(Selection {
                    region: region.clone(),
                    point,
                });
            }
            EditorState::Editing(session) if session.focus == Some(index) => {
                Self::extend(session, working, point);
            }
            EditorState::Editing(session) => {
                session.focus = Some(index);
                session.last_point = Some(point);
            }
        }
    }

    /// Long press: open the details editor for the focus region.
    pub fn long_press_point(&self) -> Option<usize> {
        self.focus()
    }

    /// Drop the focus region's last boundary point. Does nothing once the
    /// region has no points left.
    pub fn undo_last_point(&mut self, working: &mut [Region]) {
        let Some(session) = self.session_mut() else {
            return;
        };
        let Some(index) = session.focus else {
            return;
        };
        let Some(region) = working.get_mut(index) else {
            return;
        };
        if region.points.pop().is_some() {
            session.last_point = region.points.last().copied();
            session.touch(index);
        }
    }

    /// Replace the focus region's attributes. Returns `false` when nothing
    /// changed.
    pub fn update_attributes(
        &mut self,
        working: &mut [Region],
        name: String,
        elements: BTreeMap<String, Measurement>,
        descriptions: Vec<String>,
    ) -> bool {
        let Some(session) = self.session_mut() else {
            return false;
        };
        let Some(index) = session.focus else {
            return false;
        };
        let Some(region) = working.get_mut(index) else {
            return false;
        };
        if region.name == name && region.elements == elements && region.descriptions == descriptions
        {
            return false;
        }
        region.name = name;
        region.elements = elements;
        region.descriptions = descriptions;
        session.touch(index);
        true
    }

    /// Finish the session ("Done") and return the writes it requires.
    ///
    /// Only touched regions no longer present (by value) in the baseline
    /// are considered; an edited region is resubmitted in full.
    pub fn commit(&mut self, working: &[Region]) -> Vec<RegionChange> {
        let EditorState::Editing(session) = std::mem::take(&mut self.state) else {
            return Vec::new();
        };

        let changes: Vec<RegionChange> = session
            .touched
            .iter()
            .filter_map(|&index| {
                let region = working.get(index)?;
                if session.baseline.contains(region) {
                    return None;
                }
                RegionChange::for_region(region)
            })
            .collect();

        tracing::info!(
            touched = session.touched.len(),
            writes = changes.len(),
            "Committed edit session"
        );
        changes
    }

    /// Abandon the session, restoring the baseline.
    pub fn cancel(&mut self, working: &mut Vec<Region>) {
        if let EditorState::Editing(session) = std::mem::take(&mut self.state) {
            *working = session.baseline;
            tracing::info!("Edit session cancelled");
        }
    }
}
