// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod account;
pub mod auth;
pub mod cache;
pub mod contamination;
pub mod details;
pub mod editor;
pub mod filter;
pub mod search;

pub use account::{AccountSession, FieldErrors, FieldMessage};
pub use auth::{AuthError, AuthErrorKind, AuthProvider, AuthUser, FirebaseAuthClient};
pub use cache::RegionCache;
pub use contamination::{Assessment, ColorKey, LabelKey, Tier};
pub use details::RegionDraft;
pub use editor::{RegionChange, RegionEditor, Selection};
pub use filter::{BoundSide, FilterMetric, RangeBound, RegionFilter};
pub use search::{GeoObject, Geocoder, SearchHit, SearchSession};
