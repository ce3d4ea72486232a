// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Explored region model and its Firestore wire encoding.

use std::collections::BTreeMap;

use geo::{Coord, LineString, Polygon};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::services::contamination;

/// A polygon needs at least a triangle before it may be persisted.
pub const MIN_POLYGON_POINTS: usize = 3;

/// A geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl From<GeoPoint> for Coord<f64> {
    fn from(point: GeoPoint) -> Self {
        Coord {
            x: point.longitude,
            y: point.latitude,
        }
    }
}

impl From<Coord<f64>> for GeoPoint {
    fn from(coord: Coord<f64>) -> Self {
        GeoPoint::new(coord.y, coord.x)
    }
}

/// Qualitative pollution class recorded alongside a measurement.
///
/// Stored on the wire as a float code 1..=4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum PollutionDegree {
    #[default]
    Low = 1,
    Average = 2,
    High = 3,
    VeryHigh = 4,
}

impl PollutionDegree {
    pub const ALL: [PollutionDegree; 4] = [
        PollutionDegree::Low,
        PollutionDegree::Average,
        PollutionDegree::High,
        PollutionDegree::VeryHigh,
    ];

    /// Integer code as stored in Firestore.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Decode a wire value. Only exact integer codes 1..=4 are accepted.
    pub fn from_code(value: f64) -> Option<Self> {
        if value.fract() != 0.0 {
            return None;
        }
        Self::ALL.into_iter().find(|d| f64::from(d.code()) == value)
    }
}

/// One element's measurement: `[containment, threshold, degree]` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Measurement {
    /// Measured concentration
    pub containment: f64,
    /// Maximum permissible concentration
    pub threshold: f64,
    pub degree: PollutionDegree,
}

impl Measurement {
    pub fn new(containment: f64, threshold: f64, degree: PollutionDegree) -> Self {
        Self {
            containment,
            threshold,
            degree,
        }
    }

    /// Containment relative to the permissible threshold.
    pub fn ratio(&self) -> f64 {
        self.containment / self.threshold
    }

    pub fn to_wire(&self) -> Vec<f64> {
        vec![
            self.containment,
            self.threshold,
            f64::from(self.degree.code()),
        ]
    }

    pub fn from_wire(values: &[f64]) -> std::result::Result<Self, String> {
        let [containment, threshold, degree] = values else {
            return Err(format!("expected 3 values, got {}", values.len()));
        };
        let degree = PollutionDegree::from_code(*degree)
            .ok_or_else(|| format!("invalid pollution degree {}", degree))?;
        Ok(Self::new(*containment, *threshold, degree))
    }
}

/// A user-drawn region with its element measurements.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Region {
    /// Firestore document ID; empty until the region is first written
    pub id: String,
    pub name: String,
    pub elements: BTreeMap<String, Measurement>,
    /// Boundary ring, in drawing order
    pub points: Vec<GeoPoint>,
    pub descriptions: Vec<String>,
}

impl Region {
    /// A fresh, unpersisted region seeded with its first boundary point.
    pub fn starting_at(point: GeoPoint) -> Self {
        Self {
            points: vec![point],
            ..Default::default()
        }
    }

    pub fn is_persisted(&self) -> bool {
        !self.id.is_empty()
    }

    /// Whether the boundary is large enough to be stored.
    pub fn is_polygon(&self) -> bool {
        self.points.len() >= MIN_POLYGON_POINTS
    }

    /// The boundary as a closed polygon, if it has at least three points.
    pub fn polygon(&self) -> Option<Polygon<f64>> {
        if !self.is_polygon() {
            return None;
        }
        let ring: LineString<f64> = self.points.iter().map(|p| Coord::from(*p)).collect();
        Some(Polygon::new(ring, vec![]))
    }

    /// Encode for storage. `latitudes[i]`/`longitudes[i]` form point `i`.
    pub fn to_document(&self) -> RegionDocument {
        RegionDocument {
            id: self.is_persisted().then(|| self.id.clone()),
            name: Some(self.name.clone()),
            descriptions: Some(self.descriptions.clone()),
            elements: Some(
                self.elements
                    .iter()
                    .map(|(name, m)| (name.clone(), m.to_wire()))
                    .collect(),
            ),
            latitudes: Some(self.points.iter().map(|p| p.latitude).collect()),
            longitudes: Some(self.points.iter().map(|p| p.longitude).collect()),
        }
    }

    /// Decode a stored document; every field is required.
    pub fn from_document(doc: RegionDocument) -> Result<Self> {
        let id = doc.id.unwrap_or_default();
        let missing = |field: &str| AppError::malformed(&id, format!("missing field `{field}`"));

        let name = doc.name.ok_or_else(|| missing("name"))?;
        let descriptions = doc.descriptions.ok_or_else(|| missing("descriptions"))?;
        let raw_elements = doc.elements.ok_or_else(|| missing("elements"))?;
        let latitudes = doc.latitudes.ok_or_else(|| missing("latitudes"))?;
        let longitudes = doc.longitudes.ok_or_else(|| missing("longitudes"))?;

        if latitudes.len() != longitudes.len() {
            return Err(AppError::malformed(
                &id,
                format!(
                    "{} latitudes but {} longitudes",
                    latitudes.len(),
                    longitudes.len()
                ),
            ));
        }

        let mut elements = BTreeMap::new();
        for (element, values) in raw_elements {
            let measurement = Measurement::from_wire(&values)
                .map_err(|reason| AppError::malformed(&id, format!("element `{element}`: {reason}")))?;
            elements.insert(element, measurement);
        }

        let points = latitudes
            .into_iter()
            .zip(longitudes)
            .map(|(lat, lon)| GeoPoint::new(lat, lon))
            .collect();

        Ok(Self {
            id,
            name,
            elements,
            points,
            descriptions,
        })
    }

    /// GeoJSON feature with the computed index, tier and fill color as
    /// properties. `None` while the boundary is not yet a polygon.
    pub fn to_feature(&self) -> Option<geojson::Feature> {
        let polygon = self.polygon()?;
        let assessment = contamination::assess(self);

        let mut properties = serde_json::Map::new();
        properties.insert("id".to_string(), self.id.clone().into());
        properties.insert("name".to_string(), self.name.clone().into());
        properties.insert(
            "contamination_index".to_string(),
            serde_json::Number::from_f64(assessment.index)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
        );
        properties.insert("tier".to_string(), assessment.tier.as_str().into());
        properties.insert("fill".to_string(), assessment.tier.color().hex().into());

        Some(geojson::Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(geojson::Value::from(&polygon))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        })
    }
}

/// Region document as stored in the regions collection.
///
/// Every field is optional; incomplete documents still deserialize and are
/// rejected by [`Region::from_document`] with a reason.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionDocument {
    /// Document ID (not stored as a field)
    #[serde(alias = "_firestore_id", default, skip_serializing)]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descriptions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elements: Option<BTreeMap<String, Vec<f64>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitudes: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitudes: Option<Vec<f64>>,
}
