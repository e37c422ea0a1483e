//! Shared fixtures: an in-memory transport that routes by path and a
//! dashboard sink that records what it was asked to show.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use liquidity_monitor::assess::Assessment;
use liquidity_monitor::controller::Controller;
use liquidity_monitor::error::{MonitorError, TransportError};
use liquidity_monitor::portfolio::PortfolioSnapshot;
use liquidity_monitor::render::DashboardSink;
use liquidity_monitor::services::Endpoints;
use liquidity_monitor::state::{Config, Session};
use liquidity_monitor::transport::Transport;
use serde_json::{json, Value};
use url::Url;

#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    pub method: &'static str,
    pub host: String,
    pub path: String,
    pub query: HashMap<String, String>,
    pub body: Option<Value>,
}

impl Recorded {
    pub fn q(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }
}

#[derive(Default)]
pub struct FakeTransport {
    risk_states: Mutex<HashMap<(String, String), Value>>,
    routes: Mutex<HashMap<String, Value>>,
    failures: Mutex<HashMap<String, TransportError>>,
    requests: Mutex<Vec<Recorded>>,
    delay: Mutex<Option<Duration>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_risk(&self, entity: &str, currency: &str, state: Value) {
        self.risk_states
            .lock()
            .unwrap()
            .insert((entity.to_string(), currency.to_string()), state);
    }

    /// Response for every request to `path` (e.g. "run_cycle").
    pub fn route(&self, path: &str, response: Value) {
        self.routes.lock().unwrap().insert(path.to_string(), response);
    }

    pub fn fail_path(&self, path: &str, err: TransportError) {
        self.failures.lock().unwrap().insert(path.to_string(), err);
    }

    /// Fail only the risk fetch for one cell.
    pub fn fail_cell(&self, entity: &str, currency: &str, err: TransportError) {
        self.failures
            .lock()
            .unwrap()
            .insert(format!("risk_state/{}/{}", entity, currency), err);
    }

    pub fn clear_failures(&self) {
        self.failures.lock().unwrap().clear();
    }

    /// Every request takes this long before it answers.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn handle(&self, method: &'static str, url: &Url, body: Option<&Value>) -> Result<Value, TransportError> {
        let path = url.path().trim_start_matches('/').to_string();
        let query: HashMap<String, String> = url.query_pairs().into_owned().collect();
        self.requests.lock().unwrap().push(Recorded {
            method,
            host: url.host_str().unwrap_or_default().to_string(),
            path: path.clone(),
            query: query.clone(),
            body: body.cloned(),
        });

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let entity = query.get("entity_id").cloned().unwrap_or_default();
        let currency = query.get("currency").cloned().unwrap_or_default();
        {
            let failures = self.failures.lock().unwrap();
            if let Some(err) = failures
                .get(&format!("{}/{}/{}", path, entity, currency))
                .or_else(|| failures.get(&path))
            {
                return Err(err.clone());
            }
        }

        if path == "risk_state" {
            return self
                .risk_states
                .lock()
                .unwrap()
                .get(&(entity.clone(), currency.clone()))
                .cloned()
                .ok_or_else(|| TransportError::Status {
                    status: 404,
                    body: format!("no state for {}/{}", entity, currency),
                });
        }
        Ok(self
            .routes
            .lock()
            .unwrap()
            .get(&path)
            .cloned()
            .unwrap_or_else(|| json!({"ok": true})))
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn get_json(&self, url: &Url) -> Result<Value, TransportError> {
        self.handle("GET", url, None).await
    }

    async fn post_json(&self, url: &Url, body: &Value) -> Result<Value, TransportError> {
        self.handle("POST", url, Some(body)).await
    }
}

#[derive(Default)]
pub struct RecordingDashboard {
    pub assessments: Mutex<Vec<Assessment>>,
    pub portfolios: Mutex<Vec<PortfolioSnapshot>>,
    pub decisions: Mutex<Vec<Value>>,
    pub errors: Mutex<Vec<MonitorError>>,
}

impl RecordingDashboard {
    pub fn assessment_count(&self) -> usize {
        self.assessments.lock().unwrap().len()
    }

    pub fn last_assessment(&self) -> Option<Assessment> {
        self.assessments.lock().unwrap().last().cloned()
    }

    pub fn error_count(&self) -> usize {
        self.errors.lock().unwrap().len()
    }
}

impl DashboardSink for RecordingDashboard {
    fn render_assessment(&self, assessment: &Assessment) {
        self.assessments.lock().unwrap().push(assessment.clone());
    }

    fn render_portfolio(&self, snapshot: &PortfolioSnapshot) {
        self.portfolios.lock().unwrap().push(snapshot.clone());
    }

    fn render_decision_response(&self, response: &Value) {
        self.decisions.lock().unwrap().push(response.clone());
    }

    fn render_error(&self, err: &MonitorError) {
        self.errors.lock().unwrap().push(err.clone());
    }
}

pub fn test_config() -> Config {
    Config {
        sim_url: "http://sim.test".to_string(),
        risk_url: "http://risk.test".to_string(),
        orch_url: "http://orch.test".to_string(),
        scenario_id: "demo".to_string(),
        entity_id: "E1".to_string(),
        currency: "USD".to_string(),
        seed: 42,
        entities: vec!["E1".to_string(), "E2".to_string()],
        currencies: vec!["USD".to_string(), "EUR".to_string()],
        warn_minutes: 60,
        breach_minutes: 30,
        step_minutes: 5,
        live_interval_ms: 2000,
        playback_interval_ms: 2000,
        auto_agent: false,
        driver_limit: 5,
    }
}

pub fn endpoints() -> Endpoints {
    test_config().endpoints()
}

pub fn build(cfg: &Config) -> (Controller, Arc<FakeTransport>, Arc<RecordingDashboard>) {
    let transport = FakeTransport::new();
    let sink = Arc::new(RecordingDashboard::default());
    let controller = Controller::new(
        transport.clone(),
        cfg.endpoints(),
        Session::from_config(cfg),
        sink.clone(),
    );
    (controller, transport, sink)
}

/// Risk payload shaped like the risk service's.
pub fn risk_json(balance: f64, buffer: f64, minutes_to_breach: Option<i64>) -> Value {
    json!({
        "scenario_id": "demo",
        "as_of": "2026-10-15T09:00:00Z",
        "current_balance": balance,
        "early_warning_buffer": buffer,
        "buffer_remaining": balance - buffer,
        "minutes_to_breach": minutes_to_breach,
        "forecast": [
            {"t": "2026-10-15T09:00:00Z", "balance": balance},
            {"t": "2026-10-15T09:15:00Z", "balance": balance * 0.8},
            {"t": "2026-10-15T09:30:00Z", "balance": balance * 0.6},
        ],
        "drivers": [
            {"ts": "2026-10-15T09:10:00Z", "direction": "OUT", "amount": 2_000_000.0, "rail": "CHAPS", "status": "QUEUED", "priority": "HIGH"},
            {"ts": "2026-10-15T09:20:00Z", "direction": "IN", "amount": 500_000.0, "rail": "SWIFT", "status": "EXPECTED", "priority": "NORMAL"},
        ],
    })
}

pub fn ranked_actions_json() -> Value {
    json!({
        "rec_id": "rec-001",
        "ranked_actions": [
            {
                "action_type": "INTRADAY_SWEEP",
                "action_id": "A-1",
                "parameters": {"from_entity": "E2", "amount": 3_000_000.0},
                "impact_summary": "restores buffer for 90 min",
                "score": 0.91
            },
            {
                "action_type": "THROTTLE_PAYMENTS",
                "action_id": "A-2",
                "parameters": {"rail": "CHAPS", "minutes": 30},
                "impact_summary": "defers low-priority outflows",
                "score": 0.64
            }
        ],
        "explanation": "Projected breach inside 30 minutes."
    })
}
