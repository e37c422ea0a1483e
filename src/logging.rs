//! Structured JSONL logging for the monitoring client.
//!
//! Every record carries a run id, a process-wide sequence number, a level and
//! a domain so that a session can be replayed or filtered after the fact:
//! - `LOG_LEVEL` sets the minimum level (default `info`)
//! - `LOG_DOMAINS` is a comma-separated allow list (default all)
//! - `LOG_DIR` / `RUN_ID` choose where `events.jsonl` and `trace.jsonl` land
//!
//! Lines are mirrored to stderr; stdout belongs to the dashboard.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};
use std::time::Instant;

use crate::error::{MonitorError, TransportError};

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
}

impl Level {
    pub fn from_env() -> Self {
        match std::env::var("LOG_LEVEL").as_deref() {
            Ok("trace") => Level::Trace,
            Ok("debug") => Level::Debug,
            Ok("info") => Level::Info,
            Ok("warn") => Level::Warn,
            Ok("error") => Level::Error,
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
        }
    }
}

// =============================================================================
// Log Domains
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Risk,      // Single-entity assessments, severity
    Portfolio, // Fan-out refreshes and rollups
    Agent,     // Recommendation engine calls
    Scheduler, // Live-refresh and playback timers
    Workflow,  // Action selection, approve/reject
    Transport, // HTTP failures
    Simulator, // Scenario start/step/reset
    System,    // Startup, shutdown, config
    Audit,     // Decision trail
    Profile,   // Timing
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Risk => "risk",
            Domain::Portfolio => "portfolio",
            Domain::Agent => "agent",
            Domain::Scheduler => "scheduler",
            Domain::Workflow => "workflow",
            Domain::Transport => "transport",
            Domain::Simulator => "simulator",
            Domain::System => "system",
            Domain::Audit => "audit",
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
struct RunContext {
    run_id: String,
    events: Option<Mutex<BufWriter<File>>>,
    trace: Option<Mutex<BufWriter<File>>>,
}

fn open_log(path: PathBuf) -> Option<Mutex<BufWriter<File>>> {
    match File::create(&path) {
        Ok(f) => Some(Mutex::new(BufWriter::new(f))),
        Err(err) => {
            eprintln!("[log] failed to create {}: {}", path.display(), err);
            None
        }
    }
}

fn ensure_run_context() -> &'static RunContext {
    RUN_CONTEXT.get_or_init(|| {
        let run_id = std::env::var("RUN_ID")
            .unwrap_or_else(|_| format!("r-{}-{}", ts_epoch_ms(), process::id()));
        let base = std::env::var("LOG_DIR").unwrap_or_else(|_| "out/runs".to_string());
        let mut run_dir = PathBuf::from(base);
        run_dir.push(&run_id);
        if let Err(err) = create_dir_all(&run_dir) {
            eprintln!("[log] failed to create run dir: {}", err);
        }

        let _ = std::fs::write(
            run_dir.join("manifest.json"),
            json!({
                "run_id": run_id,
                "ts": ts_now(),
                "pid": process::id(),
                "log_dir": run_dir.to_string_lossy(),
            })
            .to_string(),
        );

        RunContext {
            events: open_log(run_dir.join("events.jsonl")),
            trace: open_log(run_dir.join("trace.jsonl")),
            run_id,
        }
    })
}

fn split_fields(mut fields: Map<String, Value>) -> (Map<String, Value>, Map<String, Value>) {
    let mut top = Map::new();
    for key in ["scenario_id", "entity_id", "currency", "msg"] {
        if let Some(value) = fields.remove(key) {
            top.insert(key.to_string(), value);
        }
    }
    (top, fields)
}

fn write_line(writer: &Option<Mutex<BufWriter<File>>>, line: &str) {
    if let Some(Ok(mut w)) = writer.as_ref().map(|m| m.lock()) {
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

/// Epoch milliseconds (for replay correlation)
pub fn ts_epoch_ms() -> u64 {
    Utc::now().timestamp_millis() as u64
}

/// Emit a structured log entry
pub fn log(level: Level, domain: Domain, event: &str, fields: Map<String, Value>) {
    if level < Level::from_env() || !domain.is_enabled() {
        return;
    }

    let ctx = ensure_run_context();
    let (mut top, data) = split_fields(fields);

    let msg = top.remove("msg").unwrap_or(Value::String(String::new()));
    let mut entry = Map::new();
    entry.insert("ts".to_string(), json!(ts_now()));
    entry.insert("run_id".to_string(), json!(ctx.run_id.clone()));
    entry.insert("seq".to_string(), json!(next_seq()));
    entry.insert("lvl".to_string(), json!(level.as_str().to_uppercase()));
    entry.insert("component".to_string(), json!(domain.as_str()));
    entry.insert("event".to_string(), json!(event));
    entry.insert("msg".to_string(), msg);
    for (k, v) in top {
        entry.insert(k, v);
    }
    entry.insert("data".to_string(), Value::Object(data));

    let line = Value::Object(entry).to_string();
    match level {
        Level::Trace | Level::Debug => write_line(&ctx.trace, &line),
        _ => write_line(&ctx.events, &line),
    }
    eprintln!("{}", line);
}

// =============================================================================
// Domain-Specific Logging Helpers
// =============================================================================

pub fn log_assessment(
    entity_id: &str,
    currency: &str,
    severity: &str,
    minutes_to_breach: Option<i64>,
    recommended: bool,
    n_actions: usize,
) {
    log(
        Level::Info,
        Domain::Risk,
        "assessment",
        obj(&[
            ("entity_id", v_str(entity_id)),
            ("currency", v_str(currency)),
            ("severity", v_str(severity)),
            ("minutes_to_breach", json!(minutes_to_breach)),
            ("recommended", json!(recommended)),
            ("n_actions", json!(n_actions)),
        ]),
    );
}

pub fn log_recommendation(entity_id: &str, currency: &str, forced: bool, rec_id: Option<&str>, n_actions: usize) {
    log(
        Level::Info,
        Domain::Agent,
        "run_cycle",
        obj(&[
            ("entity_id", v_str(entity_id)),
            ("currency", v_str(currency)),
            ("forced", json!(forced)),
            ("rec_id", rec_id.map(v_str).unwrap_or(Value::Null)),
            ("n_actions", json!(n_actions)),
        ]),
    );
}

pub fn log_transport_error(path: &str, err: &TransportError) {
    log(
        Level::Warn,
        Domain::Transport,
        "request_failed",
        obj(&[("path", v_str(path)), ("error", v_str(&err.to_string()))]),
    );
}

pub fn log_cell_offline(entity_id: &str, currency: &str, err: &MonitorError) {
    log(
        Level::Warn,
        Domain::Portfolio,
        "cell_offline",
        obj(&[
            ("entity_id", v_str(entity_id)),
            ("currency", v_str(currency)),
            ("error", v_str(&err.to_string())),
        ]),
    );
}

pub fn log_rollup(status: &str, worst_mtb: Option<i64>, warn_count: usize, breach_count: usize, offline: usize) {
    log(
        Level::Info,
        Domain::Portfolio,
        "rollup",
        obj(&[
            ("status", v_str(status)),
            ("worst_minutes_to_breach", json!(worst_mtb)),
            ("warn_count", json!(warn_count)),
            ("breach_count", json!(breach_count)),
            ("offline", json!(offline)),
        ]),
    );
}

pub fn log_timer(kind: &str, state: &str, interval_ms: u64) {
    log(
        Level::Info,
        Domain::Scheduler,
        "timer",
        obj(&[
            ("kind", v_str(kind)),
            ("state", v_str(state)),
            ("interval_ms", json!(interval_ms)),
        ]),
    );
}

/// Tick failures are swallowed to keep the timer alive; this is their only trace.
pub fn log_tick_failure(kind: &str, err: &MonitorError) {
    log(
        Level::Warn,
        Domain::Scheduler,
        "tick_failed",
        obj(&[("kind", v_str(kind)), ("error", v_str(&err.to_string()))]),
    );
}

pub fn log_simulator(op: &str, scenario_id: &str, fields: &[(&str, Value)]) {
    let mut map = obj(fields);
    map.insert("op".to_string(), v_str(op));
    map.insert("scenario_id".to_string(), v_str(scenario_id));
    log(Level::Info, Domain::Simulator, "scenario", map);
}

pub fn log_selection(action_label: &str, action_hash: &str) {
    log(
        Level::Debug,
        Domain::Workflow,
        "action_selected",
        obj(&[("action", v_str(action_label)), ("action_hash", v_str(action_hash))]),
    );
}

/// Audit entry for an approve/reject round trip.
pub fn log_decision(
    scenario_id: &str,
    entity_id: &str,
    currency: &str,
    decision: &str,
    action_label: &str,
    action_hash: &str,
    outcome: &str,
) {
    log(
        Level::Info,
        Domain::Audit,
        "decision",
        obj(&[
            ("scenario_id", v_str(scenario_id)),
            ("entity_id", v_str(entity_id)),
            ("currency", v_str(currency)),
            ("decision", v_str(decision)),
            ("action", v_str(action_label)),
            ("action_hash", v_str(action_hash)),
            ("outcome", v_str(outcome)),
        ]),
    );
}

pub fn log_what_if(shock_pct: f64, delay_minutes: f64) {
    log(
        Level::Debug,
        Domain::Workflow,
        "what_if",
        obj(&[
            ("shock_pct", v_num(shock_pct)),
            ("delay_minutes", v_num(delay_minutes)),
        ]),
    );
}

// =============================================================================
// Utility Functions
// =============================================================================

/// SHA-256 of a JSON value's compact form, hex encoded. Object keys serialize
/// sorted, so equal payloads hash equally across builds and processes.
pub fn audit_hash(value: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

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
    json!(n)
}

// =============================================================================
// Profiling Scope
// =============================================================================

/// Emits a trace-level timing record when dropped.
pub struct ProfileScope {
    label: &'static str,
    context: Map<String, Value>,
    started: Instant,
}

impl ProfileScope {
    pub fn with_context(label: &'static str, fields: &[(&str, Value)]) -> Self {
        Self {
            label,
            context: obj(fields),
            started: Instant::now(),
        }
    }
}

impl Drop for ProfileScope {
    fn drop(&mut self) {
        let elapsed_ms = self.started.elapsed().as_secs_f64() * 1000.0;
        let mut fields = std::mem::take(&mut self.context);
        fields.insert("label".to_string(), v_str(self.label));
        fields.insert("elapsed_ms".to_string(), v_num(elapsed_ms));
        log(Level::Trace, Domain::Profile, "profile", fields);
    }
}

// =============================================================================
// Tests
// =============================================================================
