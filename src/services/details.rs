// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Editable draft of a region's attributes (name, elements, descriptions).

use std::collections::BTreeMap;

use crate::models::{Measurement, PollutionDegree, Region};

/// Working copy of the details form. Nothing reaches the region until the
/// draft is applied through the editor.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RegionDraft {
    pub name: String,
    pub elements: BTreeMap<String, Measurement>,
    pub descriptions: Vec<String>,
}

/// First key made only of spaces that `elements` does not use yet.
fn unused_blank_key(elements: &BTreeMap<String, Measurement>) -> String {
    (0..)
        .map(|n| " ".repeat(n))
        .find(|key| !elements.contains_key(key))
        .unwrap_or_default()
}

impl RegionDraft {
    pub fn from_region(region: &Region) -> Self {
        Self {
            name: region.name.clone(),
            elements: region.elements.clone(),
            descriptions: region.descriptions.clone(),
        }
    }

    pub fn into_parts(self) -> (String, BTreeMap<String, Measurement>, Vec<String>) {
        (self.name, self.elements, self.descriptions)
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Rename an element. An empty name becomes a single space, and a name
    /// already in use gets spaces appended until it is unique.
    pub fn rename_element(&mut self, key: &str, new_key: &str) {
        if key == new_key {
            return;
        }
        let Some(measurement) = self.elements.remove(key) else {
            return;
        };
        let mut target = if new_key.is_empty() {
            " ".to_string()
        } else {
            new_key.to_string()
        };
        while self.elements.contains_key(&target) {
            target.push(' ');
        }
        self.elements.insert(target, measurement);
    }

    pub fn set_containment(&mut self, key: &str, containment: f64) {
        if let Some(m) = self.elements.get_mut(key) {
            m.containment = containment;
        }
    }

    pub fn set_threshold(&mut self, key: &str, threshold: f64) {
        if let Some(m) = self.elements.get_mut(key) {
            m.threshold = threshold;
        }
    }

    pub fn set_degree(&mut self, key: &str, degree: PollutionDegree) {
        if let Some(m) = self.elements.get_mut(key) {
            m.degree = degree;
        }
    }

    pub fn remove_element(&mut self, key: &str) {
        self.elements.remove(key);
    }

    /// Add an empty `[0, 0, Low]` element under a blank key. Returns the key.
    pub fn add_element(&mut self) -> String {
        let key = unused_blank_key(&self.elements);
        self.elements.insert(
            key.clone(),
            Measurement::new(0.0, 0.0, PollutionDegree::Low),
        );
        key
    }

    pub fn add_description(&mut self) {
        self.descriptions.push(String::new());
    }

    pub fn edit_description(&mut self, index: usize, text: impl Into<String>) {
        if let Some(description) = self.descriptions.get_mut(index) {
            *description = text.into();
        }
    }

    pub fn remove_description(&mut self, index: usize) {
        if index < self.descriptions.len() {
            self.descriptions.remove(index);
        }
    }
}
