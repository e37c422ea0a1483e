use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::model::Action;
use crate::overlay::WhatIfParams;
use crate::services::Endpoints;
use crate::severity::Thresholds;

#[derive(Debug, Clone)]
pub struct Config {
    pub sim_url: String,
    pub risk_url: String,
    pub orch_url: String,
    pub scenario_id: String,
    pub entity_id: String,
    pub currency: String,
    pub seed: u64,
    /// Fixed portfolio matrix rows
    pub entities: Vec<String>,
    /// Fixed portfolio matrix columns
    pub currencies: Vec<String>,
    pub warn_minutes: i64,
    pub breach_minutes: i64,
    pub step_minutes: u32,
    pub live_interval_ms: u64,
    pub playback_interval_ms: u64,
    pub auto_agent: bool,
    /// Drivers shown per view (5 compact, 8 detailed)
    pub driver_limit: usize,
}

fn env_list(key: &str, default: &str) -> Vec<String> {
    std::env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            sim_url: std::env::var("SIM_URL").unwrap_or_else(|_| "http://localhost:8080".to_string()),
            risk_url: std::env::var("RISK_URL").unwrap_or_else(|_| "http://localhost:8081".to_string()),
            orch_url: std::env::var("ORCH_URL").unwrap_or_else(|_| "http://localhost:8082".to_string()),
            scenario_id: std::env::var("SCENARIO_ID").unwrap_or_else(|_| "demo".to_string()),
            entity_id: std::env::var("ENTITY_ID").unwrap_or_else(|_| "E1".to_string()),
            currency: std::env::var("CURRENCY").unwrap_or_else(|_| "USD".to_string()),
            seed: std::env::var("SEED").ok().and_then(|v| v.parse().ok()).unwrap_or(42),
            entities: env_list("ENTITIES", "E1,E2,E3"),
            currencies: env_list("CURRENCIES", "USD,EUR,GBP"),
            warn_minutes: std::env::var("WARN_MINUTES").ok().and_then(|v| v.parse().ok()).unwrap_or(60),
            breach_minutes: std::env::var("BREACH_MINUTES").ok().and_then(|v| v.parse().ok()).unwrap_or(30),
            step_minutes: std::env::var("STEP_MINUTES").ok().and_then(|v| v.parse().ok()).unwrap_or(5),
            live_interval_ms: std::env::var("LIVE_INTERVAL_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(2000),
            playback_interval_ms: std::env::var("PLAYBACK_INTERVAL_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(2000),
            auto_agent: std::env::var("AUTO_AGENT").map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes")).unwrap_or(true),
            driver_limit: std::env::var("DRIVER_LIMIT").ok().and_then(|v| v.parse().ok()).unwrap_or(5),
        }
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints {
            simulator: self.sim_url.clone(),
            risk: self.risk_url.clone(),
            orchestrator: self.orch_url.clone(),
        }
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds::new(self.warn_minutes, self.breach_minutes)
    }

    pub fn live_interval(&self) -> Duration {
        Duration::from_millis(self.live_interval_ms.max(1))
    }

    pub fn playback_interval(&self) -> Duration {
        Duration::from_millis(self.playback_interval_ms.max(1))
    }
}

/// User-editable client state. One instance per running dashboard, shared by
/// command handlers and timer ticks. Writes are last-write-wins.
#[derive(Debug, Clone)]
pub struct Session {
    pub scenario_id: String,
    pub entity_id: String,
    pub currency: String,
    pub seed: u64,
    pub entities: Vec<String>,
    pub currencies: Vec<String>,
    pub thresholds: Thresholds,
    pub what_if: WhatIfParams,
    pub auto_agent: bool,
    pub step_minutes: u32,
    pub driver_limit: usize,
    selected_action: Option<Action>,
    rendered_actions: Vec<Action>,
}

impl Session {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            scenario_id: cfg.scenario_id.clone(),
            entity_id: cfg.entity_id.clone(),
            currency: cfg.currency.clone(),
            seed: cfg.seed,
            entities: cfg.entities.clone(),
            currencies: cfg.currencies.clone(),
            thresholds: cfg.thresholds(),
            what_if: WhatIfParams::default(),
            auto_agent: cfg.auto_agent,
            step_minutes: cfg.step_minutes,
            driver_limit: cfg.driver_limit,
            selected_action: None,
            rendered_actions: Vec::new(),
        }
    }

    pub fn selected_action(&self) -> Option<&Action> {
        self.selected_action.as_ref()
    }

    pub fn rendered_actions(&self) -> &[Action] {
        &self.rendered_actions
    }

    pub fn select_action(&mut self, action: Action) {
        self.selected_action = Some(action);
    }

    /// Record a freshly rendered action list. The selection survives only if
    /// an equal action is present in the new list.
    pub fn on_actions_rendered(&mut self, actions: &[Action]) {
        if let Some(selected) = &self.selected_action {
            if !actions.contains(selected) {
                self.selected_action = None;
            }
        }
        self.rendered_actions = actions.to_vec();
    }

    pub fn clear_what_if(&mut self) {
        self.what_if = WhatIfParams::default();
    }
}

#[derive(Debug, Clone)]
pub struct SharedSession(Arc<Mutex<Session>>);

impl SharedSession {
    pub fn new(session: Session) -> Self {
        Self(Arc::new(Mutex::new(session)))
    }

    /// Never hold the guard across an await.
    pub fn lock(&self) -> MutexGuard<'_, Session> {
        self.0.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn snapshot(&self) -> Session {
        self.lock().clone()
    }
}
