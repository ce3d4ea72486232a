// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Contamination index (Zc) and severity tiers.
//!
//! The index is the sum of containment/threshold ratios over all measured
//! elements, offset by `n - 1`; it is not averaged over the element count.

use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::Region;

/// Lower bounds of the Moderate, High and VeryHigh tiers.
const MODERATE_FROM: f64 = 16.0;
const HIGH_FROM: f64 = 32.0;
const VERY_HIGH_FROM: f64 = 128.0;

/// Severity tier derived from the contamination index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Tier {
    Low,
    Moderate,
    High,
    VeryHigh,
}

/// Polygon fill color, by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum ColorKey {
    AcceptablePlace,
    ModeratelyDangerousPlace,
    DangerousPlace,
    VeryDangerousPlace,
}

/// Localizable severity label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum LabelKey {
    Level1,
    Level2,
    Level3,
    Level4,
}

impl Tier {
    pub fn color(self) -> ColorKey {
        match self {
            Tier::Low => ColorKey::AcceptablePlace,
            Tier::Moderate => ColorKey::ModeratelyDangerousPlace,
            Tier::High => ColorKey::DangerousPlace,
            Tier::VeryHigh => ColorKey::VeryDangerousPlace,
        }
    }

    pub fn label(self) -> LabelKey {
        match self {
            Tier::Low => LabelKey::Level1,
            Tier::Moderate => LabelKey::Level2,
            Tier::High => LabelKey::Level3,
            Tier::VeryHigh => LabelKey::Level4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Low => "low",
            Tier::Moderate => "moderate",
            Tier::High => "high",
            Tier::VeryHigh => "very_high",
        }
    }
}

impl ColorKey {
    /// RGB hex used for exported GeoJSON `fill` properties.
    pub fn hex(self) -> &'static str {
        match self {
            ColorKey::AcceptablePlace => "#4caf50",
            ColorKey::ModeratelyDangerousPlace => "#ffeb3b",
            ColorKey::DangerousPlace => "#ff9800",
            ColorKey::VeryDangerousPlace => "#f44336",
        }
    }
}

/// Index and tier computed together.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Assessment {
    pub index: f64,
    pub tier: Tier,
}

/// Contamination index: `Σ(containment / threshold) - (n - 1)`.
///
/// An empty element map scores exactly 1.
pub fn compute_index(region: &Region) -> f64 {
    let sum: f64 = region.elements.values().map(|m| m.ratio()).sum();
    sum - (region.elements.len() as f64 - 1.0)
}

/// Map an index onto its half-open tier interval.
///
/// Negative values and NaN have no interval of their own and fall through
/// to `VeryHigh`.
pub fn classify(index: f64) -> Tier {
    if (0.0..MODERATE_FROM).contains(&index) {
        Tier::Low
    } else if (MODERATE_FROM..HIGH_FROM).contains(&index) {
        Tier::Moderate
    } else if (HIGH_FROM..VERY_HIGH_FROM).contains(&index) {
        Tier::High
    } else {
        Tier::VeryHigh
    }
}

pub fn color_for(tier: Tier) -> ColorKey {
    tier.color()
}

pub fn label_for(tier: Tier) -> LabelKey {
    tier.label()
}

/// Compute the index and classify it.
pub fn assess(region: &Region) -> Assessment {
    let index = compute_index(region);
    Assessment {
        index,
        tier: classify(index),
    }
}
