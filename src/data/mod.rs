//! Series repository: flat CSV rows in, index-aligned time series out.
//!
//! Table layout: `[index, <dim>, <dim>, <dim>, Mon-YY, Mon-YY, ...]`. Column 0
//! is ignored, the next three are demographic dimensions (any order, matched
//! case-insensitively) and every remaining column is one month of rates.

pub mod source;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::config::MissingValuePolicy;
use crate::dimension::DimensionKey;
use crate::error::{ChartError, Result};

// =============================================================================
// Raw table
// =============================================================================

/// One CSV record keyed by header.
#[derive(Debug, Clone, Default)]
pub struct RawRow {
    fields: HashMap<String, String>,
}

impl RawRow {
    pub fn from_pairs<K: Into<String>, V: Into<String>>(
        pairs: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        Self {
            fields: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawTable {
    pub fn from_csv_str(text: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| ChartError::Schema(format!("unreadable header: {}", e)))?
            .iter()
            .map(str::to_string)
            .collect();
        let mut seen = HashSet::new();
        if let Some(dup) = headers.iter().find(|h| !seen.insert(h.as_str())) {
            return Err(ChartError::Schema(format!("duplicate column {:?}", dup)));
        }

        let mut rows = Vec::new();
        for (row, record) in reader.records().enumerate() {
            let record = record.map_err(|e| ChartError::Parse {
                row,
                column: String::new(),
                cell: String::new(),
                reason: e.to_string(),
            })?;
            rows.push(RawRow::from_pairs(
                headers.iter().cloned().zip(record.iter().map(str::to_string)),
            ));
        }

        Ok(Self { headers, rows })
    }

    /// Headers 1..4: the three demographic columns.
    pub fn dimension_columns(&self) -> Result<&[String]> {
        if self.headers.len() < 5 {
            return Err(ChartError::Schema(format!(
                "expected index, 3 dimension columns and at least one month, got {} columns",
                self.headers.len()
            )));
        }
        Ok(&self.headers[1..4])
    }

    /// Headers 4..: one per month.
    pub fn value_columns(&self) -> Result<&[String]> {
        self.dimension_columns()?;
        Ok(&self.headers[4..])
    }
}

// =============================================================================
// Series and date axis
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    /// Row position in the source table; stable for the whole session.
    pub id: usize,
    pub name: String,
    pub properties: BTreeMap<DimensionKey, String>,
    pub values: Vec<f64>,
}

impl Series {
    pub fn property(&self, key: DimensionKey) -> Option<&str> {
        self.properties.get(&key).map(String::as_str)
    }

    pub fn first_value(&self) -> Option<f64> {
        self.values.first().copied()
    }

    pub fn last_value(&self) -> Option<f64> {
        self.values.last().copied()
    }

    pub fn max_value(&self) -> Option<f64> {
        self.values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| Some(acc.map_or(v, |m: f64| m.max(v))))
    }
}

/// Shared, ordered months. `series.values[i]` belongs to `dates[i]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DateAxis {
    dates: Vec<NaiveDate>,
}

impl DateAxis {
    pub fn new(dates: Vec<NaiveDate>) -> Self {
        Self { dates }
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<NaiveDate> {
        self.dates.get(index).copied()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Epoch milliseconds of the point at `index`.
    pub fn instant(&self, index: usize) -> Option<f64> {
        self.get(index).map(date_to_ms)
    }

    /// (first, last) in epoch milliseconds.
    pub fn extent_ms(&self) -> Option<(f64, f64)> {
        let first = self.dates.iter().min()?;
        let last = self.dates.iter().max()?;
        Some((date_to_ms(*first), date_to_ms(*last)))
    }

    pub fn is_sorted(&self) -> bool {
        self.dates.windows(2).all(|w| w[0] <= w[1])
    }
}

/// Midnight UTC of `date` in epoch milliseconds.
pub fn date_to_ms(date: NaiveDate) -> f64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp_millis() as f64
}

/// Parse a `Mon-YY` header ("Jan-20") into the first day of that month.
pub fn parse_month(header: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&format!("01-{}", header.trim()), "%d-%b-%y").ok()
}

// =============================================================================
// Build
// =============================================================================

#[derive(Debug, Clone)]
pub struct ParseOptions {
    pub policy: MissingValuePolicy,
    /// Measured quantity, used to name series ("The unemployment rate for ...").
    pub measure: String,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            policy: MissingValuePolicy::Reject,
            measure: "Unemployment".to_string(),
        }
    }
}

/// Turn raw rows into one series per row plus the shared date axis.
///
/// Output order is row order. Fails on an unknown dimension header, an
/// unparseable month header, months that do not strictly increase, a missing
/// cell, or (under [`MissingValuePolicy::Reject`]) a non-numeric value cell.
pub fn build(
    rows: &[RawRow],
    dimension_columns: &[String],
    value_columns: &[String],
    options: &ParseOptions,
) -> Result<(Vec<Series>, DateAxis)> {
    let (series, axis) = build_unordered(rows, dimension_columns, value_columns, options)?;
    let dates = axis.dates();
    if let Some(i) = (1..dates.len()).find(|&i| dates[i] <= dates[i - 1]) {
        return Err(ChartError::Parse {
            row: 0,
            column: value_columns[i].clone(),
            cell: value_columns[i].clone(),
            reason: format!("month does not follow {}", value_columns[i - 1]),
        });
    }
    Ok((series, axis))
}

/// [`build`] without the month ordering check.
fn build_unordered(
    rows: &[RawRow],
    dimension_columns: &[String],
    value_columns: &[String],
    options: &ParseOptions,
) -> Result<(Vec<Series>, DateAxis)> {
    let mut dimensions = Vec::with_capacity(dimension_columns.len());
    let mut seen = HashSet::new();
    for column in dimension_columns {
        let key = DimensionKey::from_header(column)
            .ok_or_else(|| ChartError::Schema(format!("unknown dimension column {:?}", column)))?;
        if !seen.insert(key) {
            return Err(ChartError::Schema(format!("duplicate dimension column {:?}", column)));
        }
        dimensions.push((column.as_str(), key));
    }

    let dates = value_columns
        .iter()
        .map(|column| {
            parse_month(column).ok_or_else(|| ChartError::Parse {
                row: 0,
                column: column.clone(),
                cell: column.clone(),
                reason: "header is not a Mon-YY month".to_string(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let prefix = format!("The {} rate for", options.measure.to_lowercase());
    let mut series = Vec::with_capacity(rows.len());
    for (id, row) in rows.iter().enumerate() {
        let mut properties = BTreeMap::new();
        let mut labels = Vec::with_capacity(dimensions.len());
        for (column, key) in &dimensions {
            let value = cell(row, id, column)?;
            labels.push(value);
            properties.insert(*key, value.to_string());
        }

        let values = value_columns
            .iter()
            .map(|column| parse_rate(cell(row, id, column)?, id, column, options.policy))
            .collect::<Result<Vec<_>>>()?;

        series.push(Series {
            id,
            name: format!("{} {}", prefix, labels.join(", ")),
            properties,
            values,
        });
    }

    Ok((series, DateAxis::new(dates)))
}

fn cell<'a>(row: &'a RawRow, id: usize, column: &str) -> Result<&'a str> {
    row.get(column).ok_or_else(|| ChartError::Parse {
        row: id,
        column: column.to_string(),
        cell: String::new(),
        reason: "missing cell".to_string(),
    })
}

fn parse_rate(raw: &str, row: usize, column: &str, policy: MissingValuePolicy) -> Result<f64> {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ if policy == MissingValuePolicy::Nan => Ok(f64::NAN),
        _ => Err(ChartError::Parse {
            row,
            column: column.to_string(),
            cell: raw.to_string(),
            reason: "not a number".to_string(),
        }),
    }
}

// =============================================================================
// Dataset
// =============================================================================

/// Everything built at load time. Read-only for the rest of the session.
#[derive(Debug, Clone, Serialize)]
pub struct Dataset {
    pub measure: String,
    pub series: Vec<Series>,
    pub dates: DateAxis,
}

impl Dataset {
    pub fn from_table(table: &RawTable, options: &ParseOptions) -> Result<Self> {
        let (series, dates) = build(
            &table.rows,
            table.dimension_columns()?,
            table.value_columns()?,
            options,
        )?;
        Ok(Self {
            measure: options.measure.clone(),
            series,
            dates,
        })
    }

    pub fn from_csv_str(text: &str, options: &ParseOptions) -> Result<Self> {
        Self::from_table(&RawTable::from_csv_str(text)?, options)
    }

    pub fn series(&self, id: usize) -> Option<&Series> {
        self.series.get(id)
    }

    /// Largest finite value across all series; 0 for an empty dataset.
    pub fn max_value(&self) -> f64 {
        self.series
            .iter()
            .filter_map(Series::max_value)
            .fold(0.0, f64::max)
    }
}

// =============================================================================
// Manifest
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetManifest {
    pub source: String,
    pub hash_sha256: String,
    pub row_count: usize,
    pub month_count: usize,
    pub first_month: Option<NaiveDate>,
    pub last_month: Option<NaiveDate>,
    pub nan_cells: usize,
    pub columns: Vec<String>,
    pub warnings: Vec<String>,
    pub generated_at: String,
}

/// Fingerprint and sanity-check a CSV without failing on bad value cells.
pub fn analyze_csv(source: &str, text: &str, measure: &str) -> Result<DatasetManifest> {
    let table = RawTable::from_csv_str(text)?;
    let (series, dates) = build_unordered(
        &table.rows,
        table.dimension_columns()?,
        table.value_columns()?,
        &ParseOptions {
            policy: MissingValuePolicy::Nan,
            measure: measure.to_string(),
        },
    )?;
    let dataset = Dataset {
        measure: measure.to_string(),
        series,
        dates,
    };

    let mut warnings = Vec::new();
    if !dataset.dates.is_sorted() {
        warnings.push("non_monotonic_months".to_string());
    }
    let mut combos = HashSet::new();
    for s in &dataset.series {
        if !combos.insert(&s.properties) {
            warnings.push(format!("duplicate_combination: row {}", s.id));
        }
        for (key, value) in &s.properties {
            if !key.accepts(value) {
                warnings.push(format!("unknown_{}_value: row {} {:?}", key, s.id, value));
            }
        }
    }

    let nan_cells = dataset
        .series
        .iter()
        .map(|s| s.values.iter().filter(|v| v.is_nan()).count())
        .sum();
    if nan_cells > 0 {
        warnings.push(format!("non_numeric_cells: {}", nan_cells));
    }

    Ok(DatasetManifest {
        source: source.to_string(),
        hash_sha256: sha256_hex(text.as_bytes()),
        row_count: dataset.series.len(),
        month_count: dataset.dates.len(),
        first_month: dataset.dates.dates().iter().min().copied(),
        last_month: dataset.dates.dates().iter().max().copied(),
        nan_cells,
        columns: table.headers.clone(),
        warnings,
        generated_at: crate::logging::ts_now(),
    })
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
