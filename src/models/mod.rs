// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod camera;
pub mod region;
pub mod user;

pub use camera::CameraPose;
pub use region::{GeoPoint, Measurement, PollutionDegree, Region, RegionDocument};
pub use user::UserRecord;
