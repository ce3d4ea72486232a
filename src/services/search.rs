// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Place search with at most one live request.
//!
//! Every new query aborts the previous request and bumps a generation
//! counter; results tagged with an older generation are discarded.

use std::sync::Arc;

use async_trait::async_trait;
use geo::Rect;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::models::GeoPoint;

/// Maximum number of hits requested per query.
pub const SEARCH_PAGE_SIZE: usize = 8;

/// A geocoder match. Not every match has a usable point.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoObject {
    pub name: String,
    pub description: String,
    pub point: Option<GeoPoint>,
}

/// A search result shown to the user.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub name: String,
    pub description: String,
    pub point: GeoPoint,
}

impl SearchHit {
    fn from_object(object: GeoObject) -> Option<Self> {
        Some(Self {
            point: object.point?,
            name: object.name,
            description: object.description,
        })
    }
}

/// Text search restricted to a bounding box (the visible map area).
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn search(&self, text: &str, bounds: Rect<f64>, page_size: usize)
        -> Result<Vec<GeoObject>>;
}

type Tagged = (u64, Vec<SearchHit>);

/// Owner of the current search results and the single in-flight request.
pub struct SearchSession<G: Geocoder + ?Sized> {
    geocoder: Arc<G>,
    generation: u64,
    in_flight: Option<JoinHandle<()>>,
    tx: mpsc::UnboundedSender<Tagged>,
    rx: mpsc::UnboundedReceiver<Tagged>,
    results: Vec<SearchHit>,
    searched_point: Option<GeoPoint>,
}

impl<G: Geocoder + ?Sized + 'static> SearchSession<G> {
    pub fn new(geocoder: Arc<G>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            geocoder,
            generation: 0,
            in_flight: None,
            tx,
            rx,
            results: Vec::new(),
            searched_point: None,
        }
    }

    pub fn results(&self) -> &[SearchHit] {
        &self.results
    }

    /// Point of the hit the user picked, shown as a marker.
    pub fn searched_point(&self) -> Option<GeoPoint> {
        self.searched_point
    }

    pub fn is_searching(&self) -> bool {
        self.in_flight.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Start a search, superseding any request still in flight.
    ///
    /// Empty text clears the results without contacting the geocoder.
    pub fn search(&mut self, text: &str, bounds: Rect<f64>) {
        self.cancel();
        if text.is_empty() {
            self.results.clear();
            return;
        }

        let generation = self.generation;
        let geocoder = Arc::clone(&self.geocoder);
        let tx = self.tx.clone();
        let text = text.to_string();

        self.in_flight = Some(tokio::spawn(async move {
            match geocoder.search(&text, bounds, SEARCH_PAGE_SIZE).await {
                Ok(objects) => {
                    let hits: Vec<SearchHit> = objects
                        .into_iter()
                        .take(SEARCH_PAGE_SIZE)
                        .filter_map(SearchHit::from_object)
                        .collect();
                    tracing::debug!(query = %text, hits = hits.len(), generation, "Search completed");
                    tx.send((generation, hits)).ok();
                }
                Err(e) => {
                    tracing::debug!(query = %text, error = %e, "Search failed");
                }
            }
        }));
    }

    /// Abort the in-flight request; anything it already produced is stale.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
        self.generation += 1;
    }

    /// Apply results of the current generation. Returns whether the
    /// results changed.
    pub fn apply_pending(&mut self) -> bool {
        let mut applied = false;
        while let Ok((generation, hits)) = self.rx.try_recv() {
            if generation == self.generation {
                self.results = hits;
                applied = true;
            }
        }
        applied
    }

    /// Wait for the in-flight request to finish, then apply its results.
    pub async fn settle(&mut self) -> bool {
        if let Some(handle) = self.in_flight.take() {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    tracing::warn!(error = %e, "Search task failed");
                }
            }
        }
        self.apply_pending()
    }

    /// Pick a hit; its point becomes the searched marker.
    pub fn choose(&mut self, index: usize) -> Option<GeoPoint> {
        let point = self.results.get(index)?.point;
        self.searched_point = Some(point);
        Some(point)
    }

    pub fn clear_marker(&mut self) {
        self.searched_point = None;
    }
}

impl<G: Geocoder + ?Sized> Drop for SearchSession<G> {
    fn drop(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
    }
}
