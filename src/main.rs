use anyhow::{Context, Result};
use serde_json::json;
use std::path::Path;

use ratechart::config::ChartConfig;
use ratechart::data::source::{load_dataset, source_for};
use ratechart::data::ParseOptions;
use ratechart::logging::{log, obj, v_num, v_str, Domain, Level};
use ratechart::narrative::Narrative;
use ratechart::render::FrameRecorder;
use ratechart::scale::{date_ticks, value_ticks};
use ratechart::session::StorySession;

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = ChartConfig::from_env();
    let explore = std::env::args().any(|a| a == "--explore");

    log(
        Level::Info,
        Domain::System,
        "startup",
        obj(&[
            ("data_source", v_str(&cfg.data_source)),
            ("svg_width", v_num(cfg.svg_width)),
            ("svg_height", v_num(cfg.svg_height)),
            ("missing_values", json!(cfg.missing_values)),
        ]),
    );

    let options = ParseOptions {
        policy: cfg.missing_values,
        measure: cfg.measure_label.clone(),
    };
    let source = source_for(&cfg.data_source);
    let dataset = load_dataset(source.as_ref(), &options)
        .await
        .with_context(|| format!("loading {}", cfg.data_source))?;

    let narrative = match &cfg.narrative_path {
        Some(path) => Narrative::from_path(Path::new(path))?,
        None => Narrative::embedded()?,
    };

    let mut session = StorySession::start(dataset, narrative, &cfg, FrameRecorder::default())
        .context("narrative does not fit the loaded data")?;

    let scales = session.scales();
    println!(
        "{}",
        json!({
            "axes": {
                "x": date_ticks(&session.dataset().dates, scales, 80.0),
                "y": value_ticks(scales, 60.0),
                "label": cfg.measure_label,
            }
        })
    );

    for index in 0..session.narrative().len() {
        session.go_to(index);
        print_frame(&session)?;
    }

    if explore {
        // Sweep the pointer across the middle of the plot on the last step.
        let y = cfg.margin.top + cfg.plot_height() / 2.0;
        let steps = 8;
        for i in 0..=steps {
            let x = cfg.margin.left + cfg.plot_width() * i as f64 / steps as f64;
            if let Some(t) = session.pointer_moved(x, y) {
                println!(
                    "{}",
                    json!({ "pointer": [x, y], "series": t.name, "date_index": t.date_index })
                );
            }
        }
        session.pointer_left();
    }

    Ok(())
}

fn print_frame(session: &StorySession<FrameRecorder>) -> Result<()> {
    let frame = &session.renderer().frame;
    let step = session.current_step().map(|s| s.step.as_str()).unwrap_or_default();
    println!(
        "{}",
        serde_json::to_string(&json!({ "step": step, "frame": frame }))?
    );
    Ok(())
}
