// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Range filters over computed and measured region metrics.

use crate::config::FilterSettings;
use crate::error::{AppError, Result};
use crate::models::Region;
use crate::services::contamination::compute_index;

/// Which metric a bound applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMetric {
    /// Computed contamination index (Zc)
    ContaminationIndex,
    /// Per-element measured containment
    Containment,
    /// Per-element permissible threshold ("coefficient")
    Coefficient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundSide {
    Start,
    End,
}

/// An inclusive `[start, end]` range; either side may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RangeBound {
    pub start: Option<f64>,
    pub end: Option<f64>,
}

impl RangeBound {
    /// Parse both sides from user text. Blank text leaves that side open.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Ok(Self {
            start: parse_bound(start)?,
            end: parse_bound(end)?,
        })
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// A span of observed values passes when its lowest value clears the
    /// start and its highest value stays under the end.
    fn admits(&self, lowest: f64, highest: f64) -> bool {
        self.start.map_or(true, |start| lowest >= start)
            && self.end.map_or(true, |end| highest <= end)
    }
}

fn parse_bound(text: &str) -> Result<Option<f64>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    text.parse::<f64>()
        .map(Some)
        .map_err(|_| AppError::InvalidFilter(format!("`{text}` is not a number")))
}

/// Conjunction of the three metric ranges.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RegionFilter {
    pub index: RangeBound,
    pub containment: RangeBound,
    pub coefficient: RangeBound,
}

impl RegionFilter {
    pub fn from_settings(settings: &FilterSettings) -> Result<Self> {
        Ok(Self {
            index: RangeBound::parse(&settings.zc_range_start, &settings.zc_range_end)?,
            containment: RangeBound::parse(
                &settings.containment_range_start,
                &settings.containment_range_end,
            )?,
            coefficient: RangeBound::parse(
                &settings.coefficient_range_start,
                &settings.coefficient_range_end,
            )?,
        })
    }

    /// Replace one side of one range. Invalid text leaves the filter as is.
    pub fn set_bound(&mut self, metric: FilterMetric, side: BoundSide, text: &str) -> Result<()> {
        let value = parse_bound(text)?;
        let range = match metric {
            FilterMetric::ContaminationIndex => &mut self.index,
            FilterMetric::Containment => &mut self.containment,
            FilterMetric::Coefficient => &mut self.coefficient,
        };
        match side {
            BoundSide::Start => range.start = value,
            BoundSide::End => range.end = value,
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_unbounded()
            && self.containment.is_unbounded()
            && self.coefficient.is_unbounded()
    }

    /// Whether a region stays visible under this filter.
    ///
    /// Regions without elements have no per-element span and fail any set
    /// containment or coefficient range.
    pub fn matches(&self, region: &Region) -> bool {
        if !self.index.is_unbounded() {
            let index = compute_index(region);
            if !self.index.admits(index, index) {
                return false;
            }
        }

        let per_element = [
            (&self.containment, FilterMetric::Containment),
            (&self.coefficient, FilterMetric::Coefficient),
        ];
        per_element.into_iter().all(|(range, metric)| {
            range.is_unbounded()
                || span(region, metric).is_some_and(|(lo, hi)| range.admits(lo, hi))
        })
    }

    /// Visible regions together with their position in `regions`.
    pub fn apply<'a>(
        &'a self,
        regions: &'a [Region],
    ) -> impl Iterator<Item = (usize, &'a Region)> + 'a {
        regions
            .iter()
            .enumerate()
            .filter(move |(_, region)| self.matches(region))
    }
}

/// Lowest and highest per-element value of a metric.
fn span(region: &Region, metric: FilterMetric) -> Option<(f64, f64)> {
    let mut values = region.elements.values().map(|m| match metric {
        FilterMetric::Coefficient => m.threshold,
        _ => m.containment,
    });
    let first = values.next()?;
    Some(values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
}
