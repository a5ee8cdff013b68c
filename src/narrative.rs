//! Guided walkthrough configuration.
//!
//! Steps are plain data: loaded once, validated against the loaded series
//! before the first render, never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::annotation::{match_series, AnnotationSpec};
use crate::data::Dataset;
use crate::error::{ChartError, Result};

const EMBEDDED: &str = include_str!("../narrative/unemployment.json");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NarrativeStep {
    /// Button label.
    pub step: String,
    pub explainer: Vec<String>,
    #[serde(default)]
    pub annotations: Vec<AnnotationSpec>,
    #[serde(default)]
    pub show_filter: bool,
    #[serde(default)]
    pub show_tooltip: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Narrative {
    steps: Vec<NarrativeStep>,
}

impl Narrative {
    pub fn new(steps: Vec<NarrativeStep>) -> Self {
        Self { steps }
    }

    /// The four-step unemployment walkthrough shipped with the crate.
    pub fn embedded() -> Result<Self> {
        Self::from_json_str(EMBEDDED)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| ChartError::InvalidNarrative(e.to_string()))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ChartError::InvalidNarrative(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&text)
    }

    pub fn steps(&self) -> &[NarrativeStep] {
        &self.steps
    }

    pub fn get(&self, index: usize) -> Option<&NarrativeStep> {
        self.steps.get(index)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Check every step against the loaded data. Stops at the first defect.
    pub fn validate(&self, dataset: &Dataset) -> Result<()> {
        if self.steps.is_empty() {
            return Err(ChartError::InvalidNarrative("no steps".to_string()));
        }
        for step in &self.steps {
            for spec in &step.annotations {
                for (key, value) in &spec.properties {
                    if !key.accepts(value) {
                        return Err(ChartError::InvalidNarrative(format!(
                            "step {:?}: annotation {:?} uses unknown {} value {:?}",
                            step.step, spec.name, key, value
                        )));
                    }
                }
                match_series(&step.step, spec, &dataset.series)?;
                let label = spec.label_position;
                if label.date >= dataset.dates.len() || !label.value.is_finite() {
                    return Err(ChartError::InvalidNarrative(format!(
                        "step {:?}: annotation {:?} label position is off the chart",
                        step.step, spec.name
                    )));
                }
            }
        }
        Ok(())
    }
}
