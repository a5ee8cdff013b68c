use chrono::NaiveDate;

/// `8.1` -> `"8.1%"`, `10.0` -> `"10%"`.
pub fn format_percentage(v: f64) -> String {
    format!("{}%", v)
}

/// First tick carries the year ("Jan 2020"), the rest only the month.
pub fn format_date_tick(date: NaiveDate, index: usize) -> String {
    if index == 0 {
        date.format("%b %Y").to_string()
    } else {
        date.format("%b").to_string()
    }
}

/// Roughly one tick per `spacing` pixels.
pub fn tick_count(extent_px: f64, spacing: f64) -> usize {
    if spacing <= 0.0 || !extent_px.is_finite() {
        return 0;
    }
    (extent_px / spacing).floor().max(0.0) as usize
}
