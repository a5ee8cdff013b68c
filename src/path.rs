//! SVG path data for a series drawn against the shared scales.
//!
//! The default curve is monotone in x (Steffen's method): cubic segments that
//! never overshoot between samples. Non-finite values break the line into
//! separate sub-paths instead of drawing through them.

use crate::data::DateAxis;
use crate::scale::Scales;

/// Maps an ordered value sequence to drawable path data.
pub trait PathGenerator {
    fn path(&self, points: &[(f64, f64)]) -> String;

    /// Project `values` through the scales and build the path.
    fn series_path(&self, values: &[f64], axis: &DateAxis, scales: &Scales) -> String {
        let points: Vec<(f64, f64)> = values
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                let x = axis.get(i).map(|d| scales.x.apply(d)).unwrap_or(f64::NAN);
                (x, if v.is_finite() { scales.y.apply(v) } else { f64::NAN })
            })
            .collect();
        self.path(&points)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MonotoneX;

#[derive(Debug, Clone, Copy, Default)]
pub struct Linear;

impl PathGenerator for MonotoneX {
    fn path(&self, points: &[(f64, f64)]) -> String {
        let mut out = String::new();
        for run in defined_runs(points) {
            monotone_run(run, &mut out);
        }
        out
    }
}

impl PathGenerator for Linear {
    fn path(&self, points: &[(f64, f64)]) -> String {
        let mut out = String::new();
        for run in defined_runs(points) {
            for (i, &(x, y)) in run.iter().enumerate() {
                out.push(if i == 0 { 'M' } else { 'L' });
                push_point(&mut out, x, y);
            }
        }
        out
    }
}

/// Maximal slices of consecutive finite points.
fn defined_runs(points: &[(f64, f64)]) -> Vec<&[(f64, f64)]> {
    points
        .split(|(x, y)| !x.is_finite() || !y.is_finite())
        .filter(|run| !run.is_empty())
        .collect()
}

fn monotone_run(p: &[(f64, f64)], out: &mut String) {
    out.push('M');
    push_point(out, p[0].0, p[0].1);
    match p.len() {
        1 => out.push('Z'),
        2 => {
            out.push('L');
            push_point(out, p[1].0, p[1].1);
        }
        n => {
            let mut tangents = vec![0.0; n];
            for i in 1..n - 1 {
                tangents[i] = interior_slope(p[i - 1], p[i], p[i + 1]);
            }
            tangents[0] = end_slope(p[0], p[1], tangents[1]);
            tangents[n - 1] = end_slope(p[n - 2], p[n - 1], tangents[n - 2]);
            for i in 0..n - 1 {
                let (x0, y0) = p[i];
                let (x1, y1) = p[i + 1];
                let dx = (x1 - x0) / 3.0;
                out.push('C');
                push_point(out, x0 + dx, y0 + dx * tangents[i]);
                out.push(',');
                push_point(out, x1 - dx, y1 - dx * tangents[i + 1]);
                out.push(',');
                push_point(out, x1, y1);
            }
        }
    }
}

fn sign(v: f64) -> f64 {
    if v < 0.0 {
        -1.0
    } else {
        1.0
    }
}

fn interior_slope((x0, y0): (f64, f64), (x1, y1): (f64, f64), (x2, y2): (f64, f64)) -> f64 {
    let h0 = x1 - x0;
    let h1 = x2 - x1;
    let s0 = if h0 != 0.0 { (y1 - y0) / h0 } else { 0.0 };
    let s1 = if h1 != 0.0 { (y2 - y1) / h1 } else { 0.0 };
    let p = if h0 + h1 != 0.0 { (s0 * h1 + s1 * h0) / (h0 + h1) } else { 0.0 };
    let m = (sign(s0) + sign(s1)) * s0.abs().min(s1.abs()).min(0.5 * p.abs());
    if m.is_finite() {
        m
    } else {
        0.0
    }
}

fn end_slope((x0, y0): (f64, f64), (x1, y1): (f64, f64), t: f64) -> f64 {
    let h = x1 - x0;
    if h != 0.0 {
        (3.0 * (y1 - y0) / h - t) / 2.0
    } else {
        t
    }
}

fn push_point(out: &mut String, x: f64, y: f64) {
    out.push_str(&fmt_coord(x));
    out.push(',');
    out.push_str(&fmt_coord(y));
}

/// Three decimals, trailing zeros dropped.
fn fmt_coord(v: f64) -> String {
    let s = format!("{:.3}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}
