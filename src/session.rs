//! Step/narrative controller and the session context it owns.
//!
//! All state lives here instead of in globals: dataset, scales, filter flags,
//! current step, resolved annotations, hover state and the renderer. Every
//! handler runs to completion before the next one is called.

use crate::annotation::{
    edge_label, AnnotationResolver, LabelLayout, ManualOffsets, ResolvedAnnotation,
    VALUE_LABEL_INSET,
};
use crate::config::{ChartConfig, Margin};
use crate::data::{Dataset, Series};
use crate::dimension::DimensionKey;
use crate::error::Result;
use crate::filter::FilterState;
use crate::locator;
use crate::logging::{
    log, log_filter_toggle, log_step, log_tooltip, obj, v_num, v_str, Domain, Level,
};
use crate::narrative::{Narrative, NarrativeStep};
use crate::path::{MonotoneX, PathGenerator};
use crate::render::{Renderer, SeriesLine, Tooltip};
use crate::scale::Scales;

/// Horizontal gap between pointer and tooltip box when the box sits right of it.
pub const TOOLTIP_GAP: f64 = 10.0;
/// Shift applied when the box has to sit left of the pointer.
pub const TOOLTIP_FLIP: f64 = 220.0;

pub struct StorySession<R: Renderer, L: LabelLayout = ManualOffsets> {
    dataset: Dataset,
    narrative: Narrative,
    scales: Scales,
    margin: Margin,
    svg_width: f64,
    layout: L,
    filters: FilterState,
    current: usize,
    active: Vec<usize>,
    annotations: Vec<ResolvedAnnotation>,
    tooltip: Option<Tooltip>,
    renderer: R,
}

impl<R: Renderer> StorySession<R> {
    pub fn start(
        dataset: Dataset,
        narrative: Narrative,
        config: &ChartConfig,
        renderer: R,
    ) -> Result<Self> {
        Self::start_with_layout(dataset, narrative, config, renderer, ManualOffsets)
    }
}

impl<R: Renderer, L: LabelLayout> StorySession<R, L> {
    /// Validate the narrative against the data, draw the lines and enter step 0.
    pub fn start_with_layout(
        dataset: Dataset,
        narrative: Narrative,
        config: &ChartConfig,
        renderer: R,
        layout: L,
    ) -> Result<Self> {
        narrative.validate(&dataset)?;
        let scales = Scales::for_dataset(&dataset, config.plot_width(), config.plot_height());

        let mut session = Self {
            dataset,
            narrative,
            scales,
            margin: config.margin,
            svg_width: config.svg_width,
            layout,
            filters: FilterState::new(),
            current: 0,
            active: Vec::new(),
            annotations: Vec::new(),
            tooltip: None,
            renderer,
        };
        session.refresh_lines();
        session.enter_step(0)?;
        Ok(session)
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Switch to step `index`. Returns false (and changes nothing) when out of range.
    pub fn go_to(&mut self, index: usize) -> bool {
        if index >= self.narrative.len() {
            return false;
        }
        // Every selector and label position was checked in `start`.
        match self.enter_step(index) {
            Ok(()) => true,
            Err(e) => {
                log(
                    Level::Error,
                    Domain::Narrative,
                    "step_failed",
                    obj(&[("index", v_num(index as f64)), ("error", v_str(&e.to_string()))]),
                );
                false
            }
        }
    }

    fn enter_step(&mut self, index: usize) -> Result<()> {
        let step = match self.narrative.get(index) {
            Some(step) => step.clone(),
            None => return Ok(()),
        };
        let annotations = self.resolver().resolve(&step)?;

        self.current = index;
        self.renderer.set_active_step(index);
        self.renderer.show_explainer(&step.explainer);
        self.annotations = annotations;
        self.renderer.draw_annotations(&self.annotations);
        self.renderer.set_pointer_enabled(step.show_tooltip);
        if !step.show_tooltip {
            self.clear_tooltip();
        }
        self.renderer.set_filters_visible(step.show_filter);

        log_step(index, &step.step, self.annotations.len(), step.show_filter, step.show_tooltip);
        Ok(())
    }

    fn resolver(&self) -> AnnotationResolver<'_, &L, MonotoneX> {
        AnnotationResolver::with_layout(
            &self.dataset,
            &self.scales,
            self.margin,
            &self.layout,
            MonotoneX,
        )
    }

    // =========================================================================
    // Filters
    // =========================================================================

    /// Flip one filter value and redraw. `None` for a value with no button.
    pub fn toggle_filter(&mut self, dimension: DimensionKey, value: &str) -> Option<bool> {
        let included = self.filters.toggle(dimension, value)?;
        self.renderer.set_filter_button(dimension, value, included);
        self.refresh_lines();
        let stale = self
            .tooltip
            .as_ref()
            .map_or(false, |t| !self.active.contains(&t.series_id));
        if stale {
            self.clear_tooltip();
        }
        log_filter_toggle(dimension.as_str(), value, included, self.active.len());
        Some(included)
    }

    fn refresh_lines(&mut self) {
        self.active = self
            .filters
            .active_series(&self.dataset.series)
            .iter()
            .map(|s| s.id)
            .collect();
        let lines: Vec<SeriesLine> = self
            .active_series()
            .iter()
            .map(|s| SeriesLine {
                series_id: s.id,
                path: MonotoneX.series_path(&s.values, &self.dataset.dates, &self.scales),
            })
            .collect();
        self.renderer.draw_lines(&lines);
    }

    // =========================================================================
    // Pointer
    // =========================================================================

    /// Pointer moved to `(x, y)` in container pixels. Returns the tooltip now
    /// shown, if any. Ignored while the current step disables tooltips.
    pub fn pointer_moved(&mut self, x: f64, y: f64) -> Option<&Tooltip> {
        if !self.current_step().map_or(false, |s| s.show_tooltip) {
            return None;
        }
        let query_ms = self.scales.x.invert(x - self.margin.left);
        let query_value = self.scales.y.invert(y - self.margin.top);
        let index = locator::nearest_index(&self.dataset.dates, query_ms)?;

        let hit = {
            let candidates = self.active_series();
            locator::locate_at(index, query_value, &candidates).map(|s| s.id)
        };
        let hovered = hit.and_then(|id| self.dataset.series(id)).map(|s| s.name.as_str());
        log_tooltip(hovered, Some(index));

        let Some(id) = hit else {
            self.clear_tooltip();
            return None;
        };
        if self.tooltip.as_ref().map(|t| t.series_id) != Some(id) {
            let tooltip = self.build_tooltip(id, index, x, y)?;
            self.tooltip = Some(tooltip);
            self.renderer.show_tooltip(self.tooltip.as_ref());
        }
        self.tooltip.as_ref()
    }

    pub fn pointer_left(&mut self) {
        self.clear_tooltip();
    }

    fn clear_tooltip(&mut self) {
        if self.tooltip.take().is_some() {
            self.renderer.show_tooltip(None);
        }
    }

    fn build_tooltip(&self, id: usize, date_index: usize, x: f64, y: f64) -> Option<Tooltip> {
        let series = self.dataset.series(id)?;
        let left = if x < self.svg_width / 2.0 {
            x + TOOLTIP_GAP
        } else {
            x - TOOLTIP_FLIP
        };
        Some(Tooltip {
            series_id: id,
            name: series.name.clone(),
            date_index,
            path: MonotoneX.series_path(&series.values, &self.dataset.dates, &self.scales),
            first: series
                .first_value()
                .map(|v| edge_label(&self.scales, v, -VALUE_LABEL_INSET, 0.0)),
            last: series
                .last_value()
                .map(|v| edge_label(&self.scales, v, self.scales.width + VALUE_LABEL_INSET, 0.0)),
            position: (left, y),
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_step(&self) -> Option<&NarrativeStep> {
        self.narrative.get(self.current)
    }

    pub fn narrative(&self) -> &Narrative {
        &self.narrative
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn scales(&self) -> &Scales {
        &self.scales
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn active_series(&self) -> Vec<&Series> {
        self.active
            .iter()
            .filter_map(|&id| self.dataset.series(id))
            .collect()
    }

    pub fn annotations(&self) -> &[ResolvedAnnotation] {
        &self.annotations
    }

    pub fn tooltip(&self) -> Option<&Tooltip> {
        self.tooltip.as_ref()
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn into_renderer(self) -> R {
        self.renderer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ParseOptions;
    use crate::render::FrameRecorder;

    const CSV: &str = "\
,Age,Gender,Race,Jan-20,Feb-20
0,All ages,All genders,All races,10.0,12.0
1,All ages,All genders,White,8.0,9.0
";

    const STEPS: &str = r#"[
      {"step":"Overall","explainer":["Everyone."],
       "annotations":[{"name":"All","properties":{"race":"All races"},"labelPosition":{"date":0,"value":5}}]},
      {"step":"Explore","explainer":["Hover.","Toggle."],"showFilter":true,"showTooltip":true}
    ]"#;

    fn session() -> StorySession<FrameRecorder> {
        let ds = Dataset::from_csv_str(CSV, &ParseOptions::default()).unwrap();
        let narrative = Narrative::from_json_str(STEPS).unwrap();
        StorySession::start(ds, narrative, &ChartConfig::default(), FrameRecorder::default())
            .unwrap()
    }

    #[test]
    fn starts_on_first_step() {
        let s = session();
        let frame = &s.renderer().frame;
        assert_eq!(s.current_index(), 0);
        assert_eq!(frame.explainer, vec!["Everyone."]);
        assert_eq!(frame.lines.len(), 2);
        assert_eq!(frame.annotations.len(), 1);
        assert!(!frame.pointer_enabled && !frame.filters_visible);
    }

    #[test]
    fn pointer_is_ignored_when_step_disables_tooltips() {
        let mut s = session();
        assert!(s.pointer_moved(100.0, 100.0).is_none());
        assert!(s.tooltip().is_none());
    }

    #[test]
    fn out_of_range_step_is_a_no_op() {
        let mut s = session();
        assert!(!s.go_to(7));
        assert_eq!(s.current_index(), 0);
    }

    #[test]
    fn hover_picks_nearest_line_and_flips_box() {
        let mut s = session();
        assert!(s.go_to(1));
        let y_for = |s: &StorySession<FrameRecorder>, v: f64| 25.0 + s.scales().y.apply(v);

        // Near the start, closest to 8.0 (White).
        let y = y_for(&s, 8.2);
        let t = s.pointer_moved(50.0, y).cloned().unwrap();
        assert_eq!(t.series_id, 1);
        assert_eq!(t.date_index, 0);
        assert_eq!(t.position, (60.0, y));

        // Right half of the container, near 12.0 (All races) at Feb.
        let y = y_for(&s, 11.5);
        let t = s.pointer_moved(700.0, y).cloned().unwrap();
        assert_eq!(t.series_id, 0);
        assert_eq!(t.date_index, 1);
        assert_eq!(t.position, (480.0, y));
        assert_eq!(s.renderer().frame.tooltip.as_ref().map(|t| t.series_id), Some(0));

        s.pointer_left();
        assert!(s.renderer().frame.tooltip.is_none());
    }

    #[test]
    fn filtering_out_hovered_series_clears_tooltip() {
        let mut s = session();
        s.go_to(1);
        let y = 25.0 + s.scales().y.apply(8.0);
        assert_eq!(s.pointer_moved(50.0, y).map(|t| t.series_id), Some(1));
        assert_eq!(s.toggle_filter(DimensionKey::Race, "White"), Some(false));
        assert!(s.tooltip().is_none());
        assert_eq!(s.renderer().frame.lines.len(), 1);
    }

    #[test]
    fn step_that_no_longer_resolves_keeps_current_view() {
        let mut s = session();
        assert!(s.go_to(1));
        let mut broken = s.narrative().get(0).cloned().unwrap();
        broken.annotations[0].properties.insert(DimensionKey::Race, "Asian".to_string());
        s.narrative = Narrative::new(vec![broken]);

        assert!(!s.go_to(0));
        assert_eq!(s.current_index(), 1);
        assert_eq!(s.renderer().frame.active_step, 1);
    }
}
