//! Narrative annotations: selector resolution and label placement.
//!
//! A selector names a demographic combination (omitted dimensions are
//! wildcards) and must match exactly one series. Value labels sit at the left
//! and right edges of the plot next to the first and last values; their
//! vertical nudges come from a [`LabelLayout`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::Margin;
use crate::data::{Dataset, Series};
use crate::dimension::DimensionKey;
use crate::error::{ChartError, Result};
use crate::format::format_percentage;
use crate::logging::log_annotation_resolved;
use crate::narrative::NarrativeStep;
use crate::path::{MonotoneX, PathGenerator};
use crate::scale::Scales;

/// Partial mapping of dimension to required value.
pub type Selector = BTreeMap<DimensionKey, String>;

/// Gap between the plot edge and a value label.
pub const VALUE_LABEL_INSET: f64 = 9.0;
/// Half the height of the background box behind a value label.
pub const VALUE_LABEL_HALF_HEIGHT: f64 = 8.0;

/// Hand-tuned vertical pixel nudges for the first/last value labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValueOffsets {
    pub first: f64,
    pub last: f64,
}

/// Free-floating label anchor in data space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LabelPosition {
    /// Index into the date axis.
    pub date: usize,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AnnotationSpec {
    pub name: String,
    pub properties: Selector,
    #[serde(default)]
    pub value_y_offset: ValueOffsets,
    pub label_position: LabelPosition,
}

impl AnnotationSpec {
    pub fn matches(&self, series: &Series) -> bool {
        self.properties
            .iter()
            .all(|(key, value)| series.property(*key) == Some(value.as_str()))
    }
}

// =============================================================================
// Layout
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelEdge {
    First,
    Last,
}

/// Vertical adjustment applied to a value label before it is drawn.
pub trait LabelLayout {
    fn offset(&self, spec: &AnnotationSpec, edge: LabelEdge) -> f64;
}

impl<L: LabelLayout + ?Sized> LabelLayout for &L {
    fn offset(&self, spec: &AnnotationSpec, edge: LabelEdge) -> f64 {
        (**self).offset(spec, edge)
    }
}

/// Uses the offsets written into each annotation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManualOffsets;

impl LabelLayout for ManualOffsets {
    fn offset(&self, spec: &AnnotationSpec, edge: LabelEdge) -> f64 {
        match edge {
            LabelEdge::First => spec.value_y_offset.first,
            LabelEdge::Last => spec.value_y_offset.last,
        }
    }
}

// =============================================================================
// Resolution
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueLabel {
    pub value: f64,
    pub text: String,
    pub x: f64,
    pub y: f64,
    /// Top of the background box.
    pub rect_y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedAnnotation {
    pub index: usize,
    /// Stable element key, `annotation-{index}`.
    pub key: String,
    pub name: String,
    pub series_id: usize,
    pub path: String,
    pub first: Option<ValueLabel>,
    pub last: Option<ValueLabel>,
    /// Label position in container pixels (margins included).
    pub label_anchor: (f64, f64),
}

/// The single series a selector names.
pub fn match_series<'a>(
    step: &str,
    spec: &AnnotationSpec,
    all: &'a [Series],
) -> Result<&'a Series> {
    let mut matches = all.iter().filter(|s| spec.matches(s));
    let first = matches.next().ok_or_else(|| ChartError::UnresolvedAnnotation {
        step: step.to_string(),
        annotation: spec.name.clone(),
    })?;
    let extra = matches.count();
    if extra > 0 {
        return Err(ChartError::AmbiguousAnnotation {
            step: step.to_string(),
            annotation: spec.name.clone(),
            matches: extra + 1,
        });
    }
    Ok(first)
}

pub struct AnnotationResolver<'a, L = ManualOffsets, P = MonotoneX> {
    dataset: &'a Dataset,
    scales: &'a Scales,
    margin: Margin,
    layout: L,
    paths: P,
}

impl<'a> AnnotationResolver<'a> {
    pub fn new(dataset: &'a Dataset, scales: &'a Scales, margin: Margin) -> Self {
        Self::with_layout(dataset, scales, margin, ManualOffsets, MonotoneX)
    }
}

impl<'a, L: LabelLayout, P: PathGenerator> AnnotationResolver<'a, L, P> {
    pub fn with_layout(
        dataset: &'a Dataset,
        scales: &'a Scales,
        margin: Margin,
        layout: L,
        paths: P,
    ) -> Self {
        Self {
            dataset,
            scales,
            margin,
            layout,
            paths,
        }
    }

    /// Series for each annotation of `step`, in annotation order.
    pub fn bind(&self, step: &NarrativeStep) -> Result<Vec<&'a Series>> {
        step.annotations
            .iter()
            .map(|spec| match_series(&step.step, spec, &self.dataset.series))
            .collect()
    }

    pub fn resolve(&self, step: &NarrativeStep) -> Result<Vec<ResolvedAnnotation>> {
        let bound = self.bind(step)?;
        let mut out = Vec::with_capacity(bound.len());
        for (index, (spec, series)) in step.annotations.iter().zip(bound).enumerate() {
            out.push(self.place(index, &step.step, spec, series)?);
            log_annotation_resolved(&step.step, &spec.name, series.id);
        }
        Ok(out)
    }

    fn place(
        &self,
        index: usize,
        step: &str,
        spec: &AnnotationSpec,
        series: &Series,
    ) -> Result<ResolvedAnnotation> {
        let anchor_date = self.dataset.dates.get(spec.label_position.date).ok_or_else(|| {
            ChartError::InvalidNarrative(format!(
                "step {:?}: annotation {:?} label date index {} is outside the {} month axis",
                step,
                spec.name,
                spec.label_position.date,
                self.dataset.dates.len()
            ))
        })?;

        Ok(ResolvedAnnotation {
            index,
            key: format!("annotation-{}", index),
            name: spec.name.clone(),
            series_id: series.id,
            path: self.paths.series_path(&series.values, &self.dataset.dates, self.scales),
            first: series.first_value().map(|v| {
                self.value_label(v, -VALUE_LABEL_INSET, self.layout.offset(spec, LabelEdge::First))
            }),
            last: series.last_value().map(|v| {
                self.value_label(
                    v,
                    self.scales.width + VALUE_LABEL_INSET,
                    self.layout.offset(spec, LabelEdge::Last),
                )
            }),
            label_anchor: (
                self.margin.left + self.scales.x.apply(anchor_date),
                self.margin.top + self.scales.y.apply(spec.label_position.value),
            ),
        })
    }

    fn value_label(&self, value: f64, x: f64, offset: f64) -> ValueLabel {
        edge_label(self.scales, value, x, offset)
    }
}

/// Value label at plot-local `x`, shifted down by `offset` pixels.
pub fn edge_label(scales: &Scales, value: f64, x: f64, offset: f64) -> ValueLabel {
    let y = scales.y.apply(value) + offset;
    ValueLabel {
        value,
        text: format_percentage(value),
        x,
        y,
        rect_y: y - VALUE_LABEL_HALF_HEIGHT,
    }
}
