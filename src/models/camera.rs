// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Map camera pose as reported by the map view.

use super::GeoPoint;

/// Moves smaller than this (in degrees, on both axes) are ignored.
const CAMERA_EPSILON_DEGREES: f64 = 0.00001;

/// Zoom used when jumping to the device's own location.
pub const REAL_LOCATION_ZOOM: f32 = 12.0;

/// Camera position, zoom and orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub center: GeoPoint,
    pub zoom: f32,
    /// Bearing in degrees
    pub azimuth: f32,
    pub tilt: f32,
}

impl Default for CameraPose {
    /// Central Moscow at country-level zoom.
    fn default() -> Self {
        Self {
            center: GeoPoint::new(55.754581, 37.625348),
            zoom: 5.0,
            azimuth: 0.0,
            tilt: 0.0,
        }
    }
}

impl CameraPose {
    /// Apply a reported pose. Returns `false` when the center moved by less
    /// than the jitter threshold, in which case nothing is updated.
    pub fn update(&mut self, reported: CameraPose) -> bool {
        let d_lat = (self.center.latitude - reported.center.latitude).abs();
        let d_lon = (self.center.longitude - reported.center.longitude).abs();
        if d_lat < CAMERA_EPSILON_DEGREES && d_lon < CAMERA_EPSILON_DEGREES {
            return false;
        }
        *self = reported;
        true
    }

    /// Center on a device fix, keeping the current orientation.
    pub fn focus_on(&mut self, point: GeoPoint) -> bool {
        self.update(CameraPose {
            center: point,
            zoom: REAL_LOCATION_ZOOM,
            ..*self
        })
    }
}
