// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Metals-Tracker: map heavy-metal contamination of surveyed regions
//!
//! This crate provides the region model, contamination scoring, Firestore
//! sync and the editing, filtering and search state behind the map screen.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod session;

pub use session::{MapEvent, MapSession, MapView, RenderedRegion};
