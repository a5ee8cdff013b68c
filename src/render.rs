//! Boundary to the drawing layer.
//!
//! The session hands finished, pixel-space views to a [`Renderer`]; the
//! renderer owns element lifecycle. [`reconcile`] is the keyed join a
//! renderer uses to turn a new target list into enter/update/exit sets.

use serde::Serialize;
use std::collections::HashSet;

use crate::annotation::{ResolvedAnnotation, ValueLabel};
use crate::dimension::DimensionKey;

/// One drawn line of the main chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesLine {
    pub series_id: usize,
    pub path: String,
}

/// Hover highlight for the series under the pointer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tooltip {
    pub series_id: usize,
    pub name: String,
    pub date_index: usize,
    pub path: String,
    pub first: Option<ValueLabel>,
    pub last: Option<ValueLabel>,
    /// Top-left of the floating name box, container pixels.
    pub position: (f64, f64),
}

pub trait Renderer {
    fn draw_lines(&mut self, lines: &[SeriesLine]);
    fn draw_annotations(&mut self, annotations: &[ResolvedAnnotation]);
    fn show_explainer(&mut self, paragraphs: &[String]);
    fn show_tooltip(&mut self, tooltip: Option<&Tooltip>);
    fn set_filters_visible(&mut self, visible: bool);
    fn set_pointer_enabled(&mut self, enabled: bool);
    fn set_active_step(&mut self, index: usize);
    fn set_filter_button(&mut self, dimension: DimensionKey, value: &str, active: bool);
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JoinPlan {
    pub enter: Vec<String>,
    pub update: Vec<String>,
    pub exit: Vec<String>,
}

/// Diff displayed keys against target keys. `enter`/`update` follow target
/// order, `exit` follows current order.
pub fn reconcile<S: AsRef<str>, T: AsRef<str>>(current: &[S], target: &[T]) -> JoinPlan {
    let shown: HashSet<&str> = current.iter().map(AsRef::as_ref).collect();
    let wanted: HashSet<&str> = target.iter().map(AsRef::as_ref).collect();
    let mut plan = JoinPlan::default();
    for key in target.iter().map(AsRef::as_ref) {
        if shown.contains(key) {
            plan.update.push(key.to_string());
        } else {
            plan.enter.push(key.to_string());
        }
    }
    plan.exit = current
        .iter()
        .map(AsRef::as_ref)
        .filter(|k| !wanted.contains(k))
        .map(str::to_string)
        .collect();
    plan
}

/// Snapshot of everything currently on screen.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Frame {
    pub active_step: usize,
    pub explainer: Vec<String>,
    pub lines: Vec<SeriesLine>,
    pub annotations: Vec<ResolvedAnnotation>,
    pub tooltip: Option<Tooltip>,
    pub filters_visible: bool,
    pub pointer_enabled: bool,
    pub inactive_filters: Vec<(DimensionKey, String)>,
}

/// Renderer that keeps the latest [`Frame`] instead of drawing.
#[derive(Debug, Clone, Default)]
pub struct FrameRecorder {
    pub frame: Frame,
    /// Join plan of the most recent annotation update.
    pub last_annotation_join: JoinPlan,
    pub draws: usize,
}

impl Renderer for FrameRecorder {
    fn draw_lines(&mut self, lines: &[SeriesLine]) {
        self.frame.lines = lines.to_vec();
        self.draws += 1;
    }

    fn draw_annotations(&mut self, annotations: &[ResolvedAnnotation]) {
        let current: Vec<&str> = self.frame.annotations.iter().map(|a| a.key.as_str()).collect();
        let target: Vec<&str> = annotations.iter().map(|a| a.key.as_str()).collect();
        self.last_annotation_join = reconcile(&current, &target);
        self.frame.annotations = annotations.to_vec();
        self.draws += 1;
    }

    fn show_explainer(&mut self, paragraphs: &[String]) {
        self.frame.explainer = paragraphs.to_vec();
    }

    fn show_tooltip(&mut self, tooltip: Option<&Tooltip>) {
        self.frame.tooltip = tooltip.cloned();
    }

    fn set_filters_visible(&mut self, visible: bool) {
        self.frame.filters_visible = visible;
    }

    fn set_pointer_enabled(&mut self, enabled: bool) {
        self.frame.pointer_enabled = enabled;
    }

    fn set_active_step(&mut self, index: usize) {
        self.frame.active_step = index;
    }

    fn set_filter_button(&mut self, dimension: DimensionKey, value: &str, active: bool) {
        self.frame
            .inactive_filters
            .retain(|(d, v)| !(*d == dimension && v == value));
        if !active {
            self.frame.inactive_filters.push((dimension, value.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reconcile_splits_keys() {
        let plan = reconcile(&["a", "b", "c"], &["c", "d"]);
        assert_eq!(plan.update, vec!["c"]);
        assert_eq!(plan.enter, vec!["d"]);
        assert_eq!(plan.exit, vec!["a", "b"]);
    }

    #[test]
    fn reconcile_from_empty() {
        let none: [&str; 0] = [];
        let plan = reconcile(&none, &["annotation-0"]);
        assert_eq!(plan.enter, vec!["annotation-0"]);
        assert!(plan.exit.is_empty() && plan.update.is_empty());
    }

    #[test]
    fn recorder_tracks_filter_buttons() {
        let mut r = FrameRecorder::default();
        r.set_filter_button(DimensionKey::Race, "White", false);
        r.set_filter_button(DimensionKey::Race, "White", false);
        assert_eq!(r.frame.inactive_filters.len(), 1);
        r.set_filter_button(DimensionKey::Race, "White", true);
        assert!(r.frame.inactive_filters.is_empty());
    }
}
