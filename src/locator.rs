//! Nearest-series lookup for tooltip hit-testing.
//!
//! Runs on every pointer move: a binary search over the date axis followed by
//! one pass over the candidates, O(log n + m).

use crate::data::{DateAxis, Series};

/// Index of the axis point nearest to `query_ms`.
///
/// The insertion point is searched from index 1, so `i1` is in `1..=len` and
/// `i0 = i1 - 1`. `i1` wins ties; past the end `i0` is used.
pub fn nearest_index(axis: &DateAxis, query_ms: f64) -> Option<usize> {
    let n = axis.len();
    if n == 0 {
        return None;
    }
    if n == 1 {
        return Some(0);
    }
    let i1 = 1 + axis.dates()[1..].partition_point(|&d| crate::data::date_to_ms(d) < query_ms);
    let i0 = i1 - 1;
    match (axis.instant(i0), axis.instant(i1)) {
        (Some(t0), Some(t1)) if query_ms - t0 >= t1 - query_ms => Some(i1),
        _ => Some(i0),
    }
}

/// Candidate whose value at the nearest date is closest to `query_value`.
///
/// Earlier candidates win equal distances; non-finite values never match.
pub fn locate<'a>(
    query_ms: f64,
    query_value: f64,
    candidates: &[&'a Series],
    axis: &DateAxis,
) -> Option<&'a Series> {
    let i = nearest_index(axis, query_ms)?;
    locate_at(i, query_value, candidates)
}

pub fn locate_at<'a>(
    index: usize,
    query_value: f64,
    candidates: &[&'a Series],
) -> Option<&'a Series> {
    let mut best: Option<(&'a Series, f64)> = None;
    for &s in candidates {
        let Some(v) = s.values.get(index).copied().filter(|v| v.is_finite()) else {
            continue;
        };
        let distance = (v - query_value).abs();
        if best.map_or(true, |(_, d)| distance < d) {
            best = Some((s, distance));
        }
    }
    best.map(|(s, _)| s)
}
