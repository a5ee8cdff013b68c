//! End-to-end: load from disk, validate the narrative, walk the steps, filter
//! and hover, checking what reaches the renderer.

use std::fs;

use ratechart::config::ChartConfig;
use ratechart::data::source::{load_dataset, FileSource};
use ratechart::data::{Dataset, ParseOptions};
use ratechart::dimension::{DimensionKey, AGE_VALUES, GENDER_VALUES, RACE_VALUES};
use ratechart::narrative::Narrative;
use ratechart::render::FrameRecorder;
use ratechart::session::StorySession;
use ratechart::ChartError;
use tempfile::TempDir;

const TWO_ROWS: &str = "\
,Age,Gender,Race,Jan-20,Feb-20
0,All ages,All genders,All races,10.0,12.0
1,All ages,All genders,White,8.0,9.0
";

const TWO_STEPS: &str = r#"[
  {"step":"Overall","explainer":["The national rate."],
   "annotations":[{"name":"National","properties":{"race":"All races"},
                   "valueYOffset":{"first":0,"last":0},"labelPosition":{"date":1,"value":7}}]},
  {"step":"White","explainer":["White workers.","Second line."],
   "annotations":[{"name":"White","properties":{"race":"White"},
                   "valueYOffset":{"first":3,"last":-2},"labelPosition":{"date":0,"value":4}}],
   "showFilter":true,"showTooltip":true}
]"#;

/// Every demographic combination, rates rising by row.
fn full_csv(months: &[&str]) -> String {
    let mut out = format!(",Age,Gender,Race,{}\n", months.join(","));
    let mut id = 0;
    for age in AGE_VALUES {
        for gender in GENDER_VALUES {
            for race in RACE_VALUES {
                let values: Vec<String> = (0..months.len())
                    .map(|m| format!("{:.1}", 2.0 + id as f64 * 0.3 + m as f64))
                    .collect();
                out.push_str(&format!("{},{},{},{},{}\n", id, age, gender, race, values.join(",")));
                id += 1;
            }
        }
    }
    out
}

#[test]
fn two_row_dataset_filters_by_race() {
    let ds = Dataset::from_csv_str(TWO_ROWS, &ParseOptions::default()).unwrap();
    let mut filters = ratechart::filter::FilterState::new();

    let ids: Vec<usize> = filters.active_series(&ds.series).iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![0, 1]);

    assert_eq!(filters.toggle(DimensionKey::Race, "All races"), Some(false));
    let ids: Vec<usize> = filters.active_series(&ds.series).iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![1]);
}

fn two_row_session() -> StorySession<FrameRecorder> {
    let ds = Dataset::from_csv_str(TWO_ROWS, &ParseOptions::default()).unwrap();
    let narrative = Narrative::from_json_str(TWO_STEPS).unwrap();
    StorySession::start(ds, narrative, &ChartConfig::default(), FrameRecorder::default()).unwrap()
}

#[test]
fn step_round_trip_restores_view_and_keeps_filters() {
    let mut session = two_row_session();
    let step0 = session.renderer().frame.clone();

    session.toggle_filter(DimensionKey::Gender, "Men");
    let filters = session.filters().clone();

    assert!(session.go_to(1));
    let frame = &session.renderer().frame;
    assert_eq!(frame.explainer, vec!["White workers.", "Second line."]);
    assert_eq!(frame.annotations[0].series_id, 1);
    assert!(frame.filters_visible && frame.pointer_enabled);
    assert_eq!(session.renderer().last_annotation_join.update, vec!["annotation-0"]);
    assert_eq!(session.filters(), &filters);

    assert!(session.go_to(0));
    let frame = &session.renderer().frame;
    assert_eq!(frame.explainer, step0.explainer);
    assert_eq!(frame.annotations, step0.annotations);
    assert!(!frame.filters_visible && !frame.pointer_enabled);
    assert_eq!(session.filters(), &filters);
    assert_eq!(frame.inactive_filters, vec![(DimensionKey::Gender, "Men".to_string())]);
}

#[test]
fn annotation_offsets_reach_the_renderer() {
    let mut session = two_row_session();
    session.go_to(1);
    let a = &session.renderer().frame.annotations[0];
    let y = session.scales().y;
    assert_eq!(a.first.as_ref().unwrap().y, y.apply(8.0) + 3.0);
    assert_eq!(a.last.as_ref().unwrap().y, y.apply(9.0) - 2.0);
    assert_eq!(a.first.as_ref().unwrap().text, "8%");
    assert_eq!(a.label_anchor.0, 45.0);
}

#[test]
fn toggling_twice_restores_lines() {
    let mut session = two_row_session();
    let before = session.renderer().frame.lines.clone();
    assert_eq!(session.toggle_filter(DimensionKey::Race, "All races"), Some(false));
    assert_eq!(session.renderer().frame.lines.len(), 1);
    assert_eq!(session.toggle_filter(DimensionKey::Race, "All races"), Some(true));
    assert_eq!(session.renderer().frame.lines, before);
    assert_eq!(session.toggle_filter(DimensionKey::Race, "Martian"), None);
}

#[test]
fn ambiguous_narrative_fails_at_startup() {
    let csv = full_csv(&["Jan-20", "Feb-20"]);
    let ds = Dataset::from_csv_str(&csv, &ParseOptions::default()).unwrap();
    let narrative = Narrative::from_json_str(
        r#"[{"step":"Race","explainer":[],
             "annotations":[{"name":"White","properties":{"race":"White"},
                             "labelPosition":{"date":0,"value":1}}]}]"#,
    )
    .unwrap();
    let err = StorySession::start(ds, narrative, &ChartConfig::default(), FrameRecorder::default())
        .err()
        .unwrap();
    assert!(matches!(err, ChartError::AmbiguousAnnotation { .. }));
}

#[tokio::test]
async fn embedded_walkthrough_over_full_dataset() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("unemployment.csv");
    let months = ["Jan-20", "Feb-20", "Mar-20", "Apr-20", "May-20", "Jun-20"];
    fs::write(&path, full_csv(&months)).unwrap();

    let ds = load_dataset(&FileSource::new(&path), &ParseOptions::default())
        .await
        .unwrap();
    assert_eq!(ds.series.len(), 60);

    let narrative = Narrative::embedded().unwrap();
    let mut session =
        StorySession::start(ds, narrative, &ChartConfig::default(), FrameRecorder::default())
            .unwrap();
    assert_eq!(session.renderer().frame.lines.len(), 60);

    let expected_annotations = [1, 3, 3, 0];
    for (index, expected) in expected_annotations.iter().enumerate() {
        assert!(session.go_to(index));
        assert_eq!(session.annotations().len(), *expected);
        assert_eq!(session.renderer().frame.active_step, index);
    }

    // Only the last step accepts pointer input.
    let cfg = ChartConfig::default();
    let y = cfg.margin.top + cfg.plot_height() / 2.0;
    assert!(session.pointer_moved(cfg.margin.left + 10.0, y).is_some());
    session.go_to(0);
    assert!(session.tooltip().is_none());
    assert!(session.pointer_moved(cfg.margin.left + 10.0, y).is_none());
}

#[tokio::test]
async fn bad_cell_on_disk_aborts_the_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.csv");
    fs::write(&path, ",age,gender,race,Jan-20\n0,All ages,All genders,All races,oops\n").unwrap();
    let err = load_dataset(&FileSource::new(&path), &ParseOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ChartError::Parse { .. }));
}
