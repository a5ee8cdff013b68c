//! Data-space to pixel-space mapping for the plot area.

use chrono::NaiveDate;
use serde::Serialize;

use crate::data::{date_to_ms, Dataset, DateAxis};
use crate::format::{format_date_tick, format_percentage, tick_count};

/// Continuous linear map `domain -> range`, invertible.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearScale {
    pub domain: (f64, f64),
    pub range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn apply(&self, v: f64) -> f64 {
        let t = normalize(v, self.domain);
        self.range.0 + t * (self.range.1 - self.range.0)
    }

    pub fn invert(&self, px: f64) -> f64 {
        let t = normalize(px, self.range);
        self.domain.0 + t * (self.domain.1 - self.domain.0)
    }

    /// Extend the domain to round tick boundaries, e.g. `[0, 19.7]` becomes `[0, 20]`.
    pub fn nice(mut self, count: usize) -> Self {
        let (mut start, mut stop) = self.domain;
        let reversed = stop < start;
        if reversed {
            std::mem::swap(&mut start, &mut stop);
        }
        let mut prestep = None;
        for _ in 0..10 {
            let step = tick_increment(start, stop, count);
            if Some(step) == prestep {
                break;
            }
            if step > 0.0 {
                start = (start / step).floor() * step;
                stop = (stop / step).ceil() * step;
            } else if step < 0.0 {
                start = (start * step).ceil() / step;
                stop = (stop * step).floor() / step;
            } else {
                break;
            }
            prestep = Some(step);
        }
        self.domain = if reversed { (stop, start) } else { (start, stop) };
        self
    }
}

/// Degenerate intervals map everything to the middle.
fn normalize(v: f64, (a, b): (f64, f64)) -> f64 {
    let span = b - a;
    if span == 0.0 {
        0.5
    } else {
        (v - a) / span
    }
}

/// Positive: step size. Negative: inverse of a fractional step (-10 means 0.1).
fn tick_increment(start: f64, stop: f64, count: usize) -> f64 {
    let e10 = 50f64.sqrt();
    let e5 = 10f64.sqrt();
    let e2 = 2f64.sqrt();

    let step = (stop - start) / count.max(1) as f64;
    if !step.is_finite() || step <= 0.0 {
        return 0.0;
    }
    let power = step.log10().floor();
    let error = step / 10f64.powf(power);
    let factor = if error >= e10 {
        10.0
    } else if error >= e5 {
        5.0
    } else if error >= e2 {
        2.0
    } else {
        1.0
    };
    if power >= 0.0 {
        factor * 10f64.powf(power)
    } else {
        -10f64.powf(-power) / factor
    }
}

/// Linear scale over epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeScale {
    inner: LinearScale,
}

impl TimeScale {
    pub fn new(domain_ms: (f64, f64), range: (f64, f64)) -> Self {
        Self {
            inner: LinearScale::new(domain_ms, range),
        }
    }

    pub fn apply_ms(&self, ms: f64) -> f64 {
        self.inner.apply(ms)
    }

    pub fn apply(&self, date: NaiveDate) -> f64 {
        self.inner.apply(date_to_ms(date))
    }

    /// Pixel x back to epoch milliseconds.
    pub fn invert(&self, px: f64) -> f64 {
        self.inner.invert(px)
    }

    pub fn domain_ms(&self) -> (f64, f64) {
        self.inner.domain
    }
}

/// The pair of scales every drawing shares.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Scales {
    pub x: TimeScale,
    pub y: LinearScale,
    pub width: f64,
    pub height: f64,
}

impl Scales {
    /// x spans the date extent, y spans `[0, max]` niced. Rates grow downward
    /// (y range is `[0, height]`), so a spike reads as a plunge.
    pub fn for_dataset(dataset: &Dataset, width: f64, height: f64) -> Self {
        let x_domain = dataset.dates.extent_ms().unwrap_or((0.0, 0.0));
        Self {
            x: TimeScale::new(x_domain, (0.0, width)),
            y: LinearScale::new((0.0, dataset.max_value()), (0.0, height)).nice(10),
            width,
            height,
        }
    }
}

/// Horizontal tick positions and labels, about one per `spacing` pixels,
/// always on axis months.
pub fn date_ticks(axis: &DateAxis, scales: &Scales, spacing: f64) -> Vec<(f64, String)> {
    let wanted = tick_count(scales.width, spacing).max(1);
    let stride = ((axis.len() + wanted - 1) / wanted).max(1);
    axis.dates()
        .iter()
        .step_by(stride)
        .enumerate()
        .map(|(i, &d)| (scales.x.apply(d), format_date_tick(d, i)))
        .collect()
}

/// Vertical tick values from 0 to the top of the niced domain.
pub fn value_ticks(scales: &Scales, spacing: f64) -> Vec<(f64, String)> {
    let wanted = tick_count(scales.height, spacing).max(1);
    let top = scales.y.domain.1;
    let step = tick_increment(0.0, top, wanted);
    let step = if step < 0.0 { -1.0 / step } else { step };
    if step <= 0.0 {
        return vec![(scales.y.apply(0.0), format_percentage(0.0))];
    }
    let mut out = Vec::new();
    let mut i = 0.0;
    while i * step <= top + step * 1e-9 {
        let v = i * step;
        out.push((scales.y.apply(v), format_percentage(v)));
        i += 1.0;
    }
    out
}
