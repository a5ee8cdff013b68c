//! Structured JSON-lines logging.
//!
//! Every record is a single JSON object with a run id, a sequence number, a
//! level, a domain and free-form `data`. Records go to stderr; when `LOG_DIR`
//! is set they are also appended to `<LOG_DIR>/<run_id>/{events,trace}.jsonl`.
//!
//! Filtering:
//! - `LOG_LEVEL` sets the minimum level (default `info`)
//! - `LOG_DOMAINS` is a comma-separated list of domains, or `all`

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};
use std::time::Instant;

// =============================================================================
// Log Levels
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    Fatal = 5,
}

impl Level {
    pub fn from_env() -> Self {
        match std::env::var("LOG_LEVEL").as_deref() {
            Ok("trace") => Level::Trace,
            Ok("debug") => Level::Debug,
            Ok("info") => Level::Info,
            Ok("warn") => Level::Warn,
            Ok("error") => Level::Error,
            Ok("fatal") => Level::Fatal,
            _ => Level::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Fatal => "fatal",
        }
    }
}

// =============================================================================
// Log Domains
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Data,       // Fetch, parse, manifest
    Filter,     // Filter toggles, active set size
    Tooltip,    // Pointer lookups
    Annotation, // Selector resolution, label placement
    Narrative,  // Step transitions
    System,     // Startup, config
    Profile,    // Timings
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Data => "data",
            Domain::Filter => "filter",
            Domain::Tooltip => "tooltip",
            Domain::Annotation => "annotation",
            Domain::Narrative => "narrative",
            Domain::System => "system",
            Domain::Profile => "profile",
        }
    }

    pub fn is_enabled(&self) -> bool {
        match std::env::var("LOG_DOMAINS").as_deref() {
            Ok("all") | Err(_) => true,
            Ok(domains) => domains.split(',').any(|d| d.trim() == self.as_str()),
        }
    }
}

// =============================================================================
// Run context
// =============================================================================

static LOG_SEQ: AtomicU64 = AtomicU64::new(0);
static RUN_CONTEXT: OnceLock<RunContext> = OnceLock::new();

fn next_seq() -> u64 {
    LOG_SEQ.fetch_add(1, Ordering::SeqCst)
}

#[derive(Debug)]
struct RunFiles {
    events: Mutex<BufWriter<File>>,
    trace: Mutex<BufWriter<File>>,
}

#[derive(Debug)]
struct RunContext {
    run_id: String,
    files: Option<RunFiles>,
}

fn ensure_run_context() -> &'static RunContext {
    RUN_CONTEXT.get_or_init(|| {
        let run_id = std::env::var("RUN_ID")
            .unwrap_or_else(|_| format!("r-{}-{}", ts_epoch_ms(), process::id()));
        let files = std::env::var("LOG_DIR")
            .ok()
            .and_then(|base| open_run_files(PathBuf::from(base).join(&run_id)));
        RunContext { run_id, files }
    })
}

fn open_run_files(run_dir: PathBuf) -> Option<RunFiles> {
    if let Err(err) = create_dir_all(&run_dir) {
        eprintln!("[log] failed to create run dir: {}", err);
        return None;
    }
    let open = |name: &str| match File::create(run_dir.join(name)) {
        Ok(f) => Some(Mutex::new(BufWriter::new(f))),
        Err(err) => {
            eprintln!("[log] failed to create {}: {}", name, err);
            None
        }
    };
    Some(RunFiles {
        events: open("events.jsonl")?,
        trace: open("trace.jsonl")?,
    })
}

fn write_line(writer: &Mutex<BufWriter<File>>, line: &str) {
    if let Ok(mut w) = writer.lock() {
        let _ = writeln!(w, "{}", line);
        let _ = w.flush();
    }
}

// =============================================================================
// Core logging functions
// =============================================================================

/// RFC3339 timestamp with milliseconds
pub fn ts_now() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

pub fn ts_epoch_ms() -> u64 {
    Utc::now().timestamp_millis() as u64
}

/// Emit a structured log entry
pub fn log(level: Level, domain: Domain, event: &str, fields: Map<String, Value>) {
    if level < Level::from_env() || !domain.is_enabled() {
        return;
    }
    emit_record(level, domain, event, fields);
}

fn emit_record(level: Level, domain: Domain, event: &str, mut fields: Map<String, Value>) {
    let ctx = ensure_run_context();
    let msg = fields
        .remove("msg")
        .unwrap_or(Value::String(String::new()));

    let mut entry = Map::new();
    entry.insert("ts".to_string(), json!(ts_now()));
    entry.insert("run_id".to_string(), json!(ctx.run_id.clone()));
    entry.insert("seq".to_string(), json!(next_seq()));
    entry.insert("lvl".to_string(), json!(level.as_str().to_uppercase()));
    entry.insert("component".to_string(), json!(domain.as_str()));
    entry.insert("event".to_string(), json!(event));
    entry.insert("msg".to_string(), msg);
    entry.insert("data".to_string(), Value::Object(fields));

    let line = Value::Object(entry).to_string();
    if let Some(files) = &ctx.files {
        match level {
            Level::Trace | Level::Debug => write_line(&files.trace, &line),
            _ => write_line(&files.events, &line),
        }
    }
    eprintln!("{}", line);
}

// =============================================================================
// Domain helpers
// =============================================================================

pub fn log_load(source: &str, series: usize, months: usize, elapsed_ms: f64) {
    log(
        Level::Info,
        Domain::Data,
        "load",
        obj(&[
            ("source", v_str(source)),
            ("series", json!(series)),
            ("months", json!(months)),
            ("elapsed_ms", v_num(elapsed_ms)),
        ]),
    );
}

pub fn log_load_failed(source: &str, reason: &str) {
    log(
        Level::Fatal,
        Domain::Data,
        "load_failed",
        obj(&[("source", v_str(source)), ("msg", v_str(reason))]),
    );
}

pub fn log_filter_toggle(dimension: &str, value: &str, included: bool, active: usize) {
    log(
        Level::Info,
        Domain::Filter,
        "toggle",
        obj(&[
            ("dimension", v_str(dimension)),
            ("value", v_str(value)),
            ("included", json!(included)),
            ("active_series", json!(active)),
        ]),
    );
}

pub fn log_step(
    index: usize,
    label: &str,
    annotations: usize,
    show_filter: bool,
    show_tooltip: bool,
) {
    log(
        Level::Info,
        Domain::Narrative,
        "go_to",
        obj(&[
            ("index", json!(index)),
            ("step", v_str(label)),
            ("annotations", json!(annotations)),
            ("show_filter", json!(show_filter)),
            ("show_tooltip", json!(show_tooltip)),
        ]),
    );
}

pub fn log_annotation_resolved(step: &str, name: &str, series_id: usize) {
    log(
        Level::Debug,
        Domain::Annotation,
        "resolved",
        obj(&[
            ("step", v_str(step)),
            ("annotation", v_str(name)),
            ("series_id", json!(series_id)),
        ]),
    );
}

pub fn log_tooltip(series: Option<&str>, date_index: Option<usize>) {
    log(
        Level::Trace,
        Domain::Tooltip,
        "hover",
        obj(&[
            ("series", series.map(v_str).unwrap_or(Value::Null)),
            ("date_index", date_index.map(|i| json!(i)).unwrap_or(Value::Null)),
        ]),
    );
}

// =============================================================================
// Utility Functions
// =============================================================================

pub fn obj(pairs: &[(&str, Value)]) -> Map<String, Value> {
    let mut map = Map::new();
    for (k, v) in pairs {
        map.insert((*k).to_string(), v.clone());
    }
    map
}

pub fn v_str(s: &str) -> Value {
    Value::String(s.to_string())
}

pub fn v_num(n: f64) -> Value {
    // NaN/inf are not representable in JSON
    if n.is_finite() {
        json!(n)
    } else {
        Value::Null
    }
}

// =============================================================================
// Profiling Scope
// =============================================================================

/// Emits the elapsed time of a scope on drop.
pub struct ProfileScope {
    label: &'static str,
    context: Map<String, Value>,
    started: Instant,
}

impl ProfileScope {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            context: Map::new(),
            started: Instant::now(),
        }
    }

    pub fn with_context(label: &'static str, fields: &[(&str, Value)]) -> Self {
        Self {
            label,
            context: obj(fields),
            started: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for ProfileScope {
    fn drop(&mut self) {
        let mut fields = std::mem::take(&mut self.context);
        fields.insert("label".to_string(), v_str(self.label));
        fields.insert("elapsed_ms".to_string(), v_num(self.elapsed_ms()));
        log(Level::Trace, Domain::Profile, "profile", fields);
    }
}
