// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Map screen session.
//!
//! [`MapSession`] is the single owner of all map state: the synced region
//! list, the edit state machine, the filter, the search and the account.
//! Everything runs on the owner's schedule through `&mut self`; pushed
//! snapshots and search results are queued and applied by [`MapSession::poll`].

use std::sync::Arc;

use geo::Rect;
use tokio::task::JoinHandle;

use crate::config::{Config, FilterSettings};
use crate::db::RegionStore;
use crate::error::{AppError, Result};
use crate::models::{CameraPose, GeoPoint, Region};
use crate::services::account::AccountSession;
use crate::services::auth::AuthProvider;
use crate::services::cache::RegionCache;
use crate::services::contamination::{self, ColorKey, Tier};
use crate::services::details::RegionDraft;
use crate::services::editor::{self, RegionEditor, Selection};
use crate::services::filter::{BoundSide, FilterMetric, RegionFilter};
use crate::services::search::{Geocoder, SearchHit, SearchSession};

/// Input from the map view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapEvent {
    /// Tap on empty map
    Tap(GeoPoint),
    /// Tap on a rendered polygon; `index` is [`RenderedRegion::index`]
    RegionTap { index: usize, point: GeoPoint },
    LongPress,
    CameraMoved(CameraPose),
}

/// A region ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedRegion {
    /// Position in the session's region list
    pub index: usize,
    pub points: Vec<GeoPoint>,
    pub contamination_index: f64,
    pub tier: Tier,
    pub color: ColorKey,
}

/// Drawing surface for the map.
pub trait MapView {
    fn render_regions(&mut self, regions: &[RenderedRegion]);

    /// Show the searched marker, or remove it when `None`.
    fn place_marker(&mut self, point: Option<GeoPoint>);
}

pub struct MapSession {
    store: Arc<dyn RegionStore>,
    cache: RegionCache,
    editor: RegionEditor,
    filter: RegionFilter,
    filter_settings: FilterSettings,
    search: SearchSession<dyn Geocoder>,
    account: AccountSession,
    camera: CameraPose,
    details: Option<RegionDraft>,
    sign_in_prompt: bool,
}

impl MapSession {
    pub fn new(
        config: &Config,
        store: Arc<dyn RegionStore>,
        auth: Arc<dyn AuthProvider>,
        geocoder: Arc<dyn Geocoder>,
    ) -> Result<Self> {
        Ok(Self {
            account: AccountSession::new(Arc::clone(&store), auth),
            store,
            cache: RegionCache::new(),
            editor: RegionEditor::new(),
            filter: config.filter.to_filter()?,
            filter_settings: config.filter.clone(),
            search: SearchSession::new(geocoder),
            camera: CameraPose::default(),
            details: None,
            sign_in_prompt: false,
        })
    }

    /// Start the region subscription and restore a remembered account.
    pub async fn mount(&mut self) -> Result<()> {
        self.cache.subscribe(self.store.as_ref()).await?;
        self.account.restore().await;
        tracing::info!("Map session mounted");
        Ok(())
    }

    /// Tear down every subscription and the in-flight search.
    pub fn unmount(&mut self) {
        self.cache.unsubscribe();
        self.account.unsubscribe();
        self.search.cancel();
    }

    /// Apply queued snapshots and search results. Returns whether anything
    /// visible changed.
    pub fn poll(&mut self) -> bool {
        let regions = self.cache.apply_pending(self.editor.is_editing());
        let account = self.account.apply_pending();
        let search = self.search.apply_pending();
        regions || account || search
    }

    /// Wait for the next region snapshot and apply it.
    pub async fn next_snapshot(&mut self) -> bool {
        self.cache.next_snapshot(self.editor.is_editing()).await
    }

    pub fn regions(&self) -> &[Region] {
        self.cache.regions()
    }

    pub fn camera(&self) -> CameraPose {
        self.camera
    }

    pub fn editor(&self) -> &RegionEditor {
        &self.editor
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.editor.selection()
    }

    pub fn account(&self) -> &AccountSession {
        &self.account
    }

    pub fn account_mut(&mut self) -> &mut AccountSession {
        &mut self.account
    }

    /// Dispatch one map input.
    pub fn handle(&mut self, event: MapEvent) {
        match event {
            MapEvent::Tap(point) => self.editor.tap_point(self.cache.regions_mut(), point),
            MapEvent::RegionTap { index, point } => {
                self.editor
                    .select_region(self.cache.regions_mut(), index, point)
            }
            MapEvent::LongPress => self.open_details(),
            MapEvent::CameraMoved(pose) => {
                self.camera.update(pose);
            }
        }
    }

    // ─── Editing ─────────────────────────────────────────────────

    /// Enter edit mode. An unverified account gets a sign-in prompt.
    /// Pending snapshots are applied before the baseline is taken.
    pub fn enter_edit(&mut self) -> Result<()> {
        if !self.editor.is_editing() {
            self.cache.apply_pending(false);
        }
        let verified = self.account.is_verified();
        match self.editor.enter_edit(verified, self.cache.regions()) {
            Err(e) if e.requires_sign_in() => {
                self.sign_in_prompt = true;
                Err(e)
            }
            other => other,
        }
    }

    /// Whether a sign-in prompt is pending; clears it.
    pub fn take_sign_in_prompt(&mut self) -> bool {
        std::mem::take(&mut self.sign_in_prompt)
    }

    pub fn begin_append(&mut self) {
        self.editor.begin_append();
    }

    pub fn undo_last_point(&mut self) {
        self.editor.undo_last_point(self.cache.regions_mut());
    }

    /// Finish editing and write the changes in the background.
    ///
    /// Returns the write task, if any writes were needed.
    pub fn commit(&mut self) -> Option<JoinHandle<()>> {
        self.details = None;
        let changes = self.editor.commit(self.cache.regions());
        if changes.is_empty() {
            return None;
        }
        Some(editor::persist_changes(Arc::clone(&self.store), changes))
    }

    pub fn cancel_edit(&mut self) {
        self.details = None;
        self.editor.cancel(self.cache.regions_mut());
    }

    fn open_details(&mut self) {
        let Some(index) = self.editor.long_press_point() else {
            return;
        };
        if let Some(region) = self.cache.regions().get(index) {
            self.details = Some(RegionDraft::from_region(region));
        }
    }

    /// The open details draft, if a long press opened one.
    pub fn details(&self) -> Option<&RegionDraft> {
        self.details.as_ref()
    }

    pub fn details_mut(&mut self) -> Option<&mut RegionDraft> {
        self.details.as_mut()
    }

    /// Close the details draft, writing it into the focus region. Returns
    /// whether the region changed.
    pub fn apply_details(&mut self) -> bool {
        let Some(draft) = self.details.take() else {
            return false;
        };
        let (name, elements, descriptions) = draft.into_parts();
        self.editor
            .update_attributes(self.cache.regions_mut(), name, elements, descriptions)
    }

    pub fn close_details(&mut self) {
        self.details = None;
    }

    // ─── Filter ──────────────────────────────────────────────────

    pub fn filter(&self) -> &RegionFilter {
        &self.filter
    }

    /// Current filter text, as typed.
    pub fn filter_settings(&self) -> &FilterSettings {
        &self.filter_settings
    }

    /// Change one filter bound from user text.
    pub fn set_filter(&mut self, metric: FilterMetric, side: BoundSide, text: &str) -> Result<()> {
        self.filter.set_bound(metric, side, text)?;
        let settings = &mut self.filter_settings;
        let field = match (metric, side) {
            (FilterMetric::ContaminationIndex, BoundSide::Start) => &mut settings.zc_range_start,
            (FilterMetric::ContaminationIndex, BoundSide::End) => &mut settings.zc_range_end,
            (FilterMetric::Containment, BoundSide::Start) => &mut settings.containment_range_start,
            (FilterMetric::Containment, BoundSide::End) => &mut settings.containment_range_end,
            (FilterMetric::Coefficient, BoundSide::Start) => &mut settings.coefficient_range_start,
            (FilterMetric::Coefficient, BoundSide::End) => &mut settings.coefficient_range_end,
        };
        *field = text.to_string();
        Ok(())
    }

    // ─── Rendering ───────────────────────────────────────────────

    /// Regions passing the filter, with their assessment.
    pub fn visible_regions(&self) -> Vec<RenderedRegion> {
        self.filter
            .apply(self.cache.regions())
            .map(|(index, region)| {
                let assessment = contamination::assess(region);
                RenderedRegion {
                    index,
                    points: region.points.clone(),
                    contamination_index: assessment.index,
                    tier: assessment.tier,
                    color: assessment.tier.color(),
                }
            })
            .collect()
    }

    pub fn render(&self, view: &mut dyn MapView) {
        view.render_regions(&self.visible_regions());
        view.place_marker(self.search.searched_point());
    }

    // ─── Search ──────────────────────────────────────────────────

    pub fn search(&mut self, text: &str, bounds: Rect<f64>) {
        self.search.search(text, bounds);
    }

    pub async fn settle_search(&mut self) -> bool {
        self.search.settle().await
    }

    pub fn search_results(&self) -> &[SearchHit] {
        self.search.results()
    }

    /// Pick a search hit: mark it and move the camera there.
    pub fn choose_search_hit(&mut self, index: usize) -> Result<GeoPoint> {
        let point = self
            .search
            .choose(index)
            .ok_or_else(|| AppError::NotFound(format!("search result {index}")))?;
        self.camera.focus_on(point);
        Ok(point)
    }

    pub fn clear_search_marker(&mut self) {
        self.search.clear_marker();
    }
}

impl Drop for MapSession {
    fn drop(&mut self) {
        self.unmount();
    }
}
