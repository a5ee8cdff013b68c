//! Per-dimension inclusion flags and the active series subset.
//!
//! Only user toggles mutate the state. Narrative steps decide whether the
//! filter controls are visible, never what they hold.

use serde::Serialize;

use crate::data::Series;
use crate::dimension::DimensionKey;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterToggle {
    pub value: String,
    pub included: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterGroup {
    pub dimension: DimensionKey,
    pub toggles: Vec<FilterToggle>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterState {
    groups: Vec<FilterGroup>,
}

impl Default for FilterState {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterState {
    /// Every enumerated value included.
    pub fn new() -> Self {
        let groups = DimensionKey::DISPLAY_ORDER
            .iter()
            .map(|&dimension| FilterGroup {
                dimension,
                toggles: dimension
                    .values()
                    .iter()
                    .map(|v| FilterToggle {
                        value: (*v).to_string(),
                        included: true,
                    })
                    .collect(),
            })
            .collect();
        Self { groups }
    }

    pub fn groups(&self) -> &[FilterGroup] {
        &self.groups
    }

    /// `None` when the value has no entry in the state.
    pub fn flag(&self, dimension: DimensionKey, value: &str) -> Option<bool> {
        self.group(dimension)?
            .toggles
            .iter()
            .find(|t| t.value == value)
            .map(|t| t.included)
    }

    /// AND over every dimension. Unknown values and missing properties exclude.
    pub fn is_included(&self, series: &Series) -> bool {
        DimensionKey::ALL.iter().all(|&dim| {
            series
                .property(dim)
                .and_then(|value| self.flag(dim, value))
                .unwrap_or(false)
        })
    }

    /// Flip one flag and return its new value. Unknown values are left alone.
    pub fn toggle(&mut self, dimension: DimensionKey, value: &str) -> Option<bool> {
        let toggle = self
            .groups
            .iter_mut()
            .find(|g| g.dimension == dimension)?
            .toggles
            .iter_mut()
            .find(|t| t.value == value)?;
        toggle.included = !toggle.included;
        Some(toggle.included)
    }

    /// Included series, original order preserved.
    pub fn active_series<'a>(&self, all: &'a [Series]) -> Vec<&'a Series> {
        all.iter().filter(|s| self.is_included(s)).collect()
    }

    pub fn all_included(&self) -> bool {
        self.groups
            .iter()
            .all(|g| g.toggles.iter().all(|t| t.included))
    }

    fn group(&self, dimension: DimensionKey) -> Option<&FilterGroup> {
        self.groups.iter().find(|g| g.dimension == dimension)
    }
}
