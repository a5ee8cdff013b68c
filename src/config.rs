use serde::{Deserialize, Serialize};

/// What to do with a value cell that is not a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingValuePolicy {
    /// Fail the whole load with a parse error.
    Reject,
    /// Store NaN and keep going; the path generator leaves a gap there.
    Nan,
}

impl MissingValuePolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "reject" | "strict" => Some(MissingValuePolicy::Reject),
            "nan" | "lenient" => Some(MissingValuePolicy::Nan),
            _ => None,
        }
    }
}

/// Pixel margins around the plot area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for Margin {
    fn default() -> Self {
        Self {
            top: 25.0,
            right: 45.0,
            bottom: 25.0,
            left: 45.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChartConfig {
    /// File path or http(s) URL of the CSV.
    pub data_source: String,
    /// Optional JSON file replacing the embedded narrative.
    pub narrative_path: Option<String>,
    pub svg_width: f64,
    pub svg_height: f64,
    pub margin: Margin,
    pub missing_values: MissingValuePolicy,
    /// Label of the measured quantity, shown next to the right axis.
    pub measure_label: String,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            data_source: "unemployment.csv".to_string(),
            narrative_path: None,
            svg_width: 720.0,
            svg_height: 360.0,
            margin: Margin::default(),
            missing_values: MissingValuePolicy::Reject,
            measure_label: "Unemployment".to_string(),
        }
    }
}

impl ChartConfig {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            data_source: std::env::var("DATA_SOURCE").unwrap_or(d.data_source),
            narrative_path: std::env::var("NARRATIVE_PATH").ok(),
            svg_width: env_f64("CHART_WIDTH", d.svg_width),
            svg_height: env_f64("CHART_HEIGHT", d.svg_height),
            margin: Margin {
                top: env_f64("MARGIN_TOP", d.margin.top),
                right: env_f64("MARGIN_RIGHT", d.margin.right),
                bottom: env_f64("MARGIN_BOTTOM", d.margin.bottom),
                left: env_f64("MARGIN_LEFT", d.margin.left),
            },
            missing_values: std::env::var("MISSING_VALUES")
                .ok()
                .and_then(|v| MissingValuePolicy::parse(&v))
                .unwrap_or(d.missing_values),
            measure_label: std::env::var("MEASURE_LABEL").unwrap_or(d.measure_label),
        }
    }

    /// Plot area width (svg width minus horizontal margins).
    pub fn plot_width(&self) -> f64 {
        (self.svg_width - self.margin.left - self.margin.right).max(0.0)
    }

    pub fn plot_height(&self) -> f64 {
        (self.svg_height - self.margin.top - self.margin.bottom).max(0.0)
    }
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
