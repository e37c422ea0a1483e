//! Command surface for an adapter: each user command is one method that
//! returns a result. Failures of user-triggered commands are also shown on
//! the dashboard in place of results.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::assess::{AssessOptions, Assessment, Orchestrator};
use crate::error::Result;
use crate::logging::log_what_if;
use crate::model::{Action, Decision};
use crate::overlay::WhatIfParams;
use crate::portfolio::{PortfolioAggregator, PortfolioSnapshot};
use crate::render::DashboardSink;
use crate::scheduler::{Scheduler, TimerKind};
use crate::services::{Endpoints, Services};
use crate::severity::Thresholds;
use crate::state::{Session, SharedSession};
use crate::transport::Transport;
use crate::workflow::ApprovalWorkflow;

pub struct Controller {
    orchestrator: Arc<Orchestrator>,
    scheduler: Scheduler,
    workflow: ApprovalWorkflow,
    portfolio: PortfolioAggregator,
    session: SharedSession,
    sink: Arc<dyn DashboardSink>,
}

impl Controller {
    pub fn new(transport: Arc<dyn Transport>, endpoints: Endpoints, session: Session, sink: Arc<dyn DashboardSink>) -> Self {
        let services = Services::new(transport, endpoints);
        let session = SharedSession::new(session);
        let orchestrator = Arc::new(Orchestrator::new(services.clone(), session.clone(), sink.clone()));
        Self {
            scheduler: Scheduler::new(orchestrator.clone()),
            workflow: ApprovalWorkflow::new(services.orchestrator.clone(), session.clone(), sink.clone()),
            portfolio: PortfolioAggregator::new(services.risk.clone()),
            orchestrator,
            session,
            sink,
        }
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    fn surface<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            self.sink.render_error(err);
        }
        result
    }

    pub async fn assess(&self, force_agent: bool) -> Result<Assessment> {
        let result = self.orchestrator.assess_active(AssessOptions { force_agent }).await;
        self.surface(result)
    }

    pub async fn start_scenario(&self) -> Result<Assessment> {
        let (scenario_id, seed) = {
            let s = self.session.lock();
            (s.scenario_id.clone(), s.seed)
        };
        let result = self.orchestrator.services().simulator.start(&scenario_id, seed).await;
        self.surface(result)?;
        self.assess(false).await
    }

    pub async fn step(&self, minutes: Option<u32>) -> Result<Assessment> {
        let (scenario_id, default_minutes) = {
            let s = self.session.lock();
            (s.scenario_id.clone(), s.step_minutes)
        };
        let result = self
            .orchestrator
            .services()
            .simulator
            .step(&scenario_id, minutes.unwrap_or(default_minutes))
            .await;
        self.surface(result)?;
        self.assess(false).await
    }

    pub async fn reset(&self) -> Result<Assessment> {
        let scenario_id = self.session.lock().scenario_id.clone();
        let result = self.orchestrator.services().simulator.reset(&scenario_id).await;
        self.surface(result)?;
        self.assess(false).await
    }

    /// Never fails as a whole; unreachable cells come back offline.
    pub async fn refresh_portfolio(&self) -> PortfolioSnapshot {
        let (scenario_id, entities, currencies, thresholds) = {
            let s = self.session.lock();
            (s.scenario_id.clone(), s.entities.clone(), s.currencies.clone(), s.thresholds)
        };
        let snapshot = self
            .portfolio
            .refresh(&scenario_id, &entities, &currencies, thresholds)
            .await;
        self.sink.render_portfolio(&snapshot);
        snapshot
    }

    pub fn start_live(&self, interval: Duration) {
        self.scheduler.start_live(interval);
    }

    pub fn start_playback(&self, interval: Duration) {
        self.scheduler.start_playback(interval);
    }

    /// Pause both modes; nothing on screen is cleared.
    pub fn pause(&self) {
        self.scheduler.stop_all();
    }

    pub fn is_running(&self, kind: TimerKind) -> bool {
        self.scheduler.is_running(kind)
    }

    pub fn select_action(&self, action: Action) {
        self.workflow.select_action(action);
    }

    pub fn select_rendered(&self, position: usize) -> Option<Action> {
        self.workflow.select_rendered(position)
    }

    pub async fn decide(&self, decision: Decision) -> Result<Value> {
        let result = self.workflow.decide(decision).await;
        self.surface(result)
    }

    pub fn set_what_if(&self, shock_pct: f64, delay_minutes: f64) -> WhatIfParams {
        let params = WhatIfParams::new(shock_pct, delay_minutes);
        self.session.lock().what_if = params;
        log_what_if(params.shock_pct, params.delay_minutes);
        params
    }

    pub fn clear_what_if(&self) {
        self.session.lock().clear_what_if();
        log_what_if(0.0, 0.0);
    }

    pub fn set_thresholds(&self, warn_minutes: i64, breach_minutes: i64) {
        self.session.lock().thresholds = Thresholds::new(warn_minutes, breach_minutes);
    }

    pub fn set_auto_agent(&self, enabled: bool) {
        self.session.lock().auto_agent = enabled;
    }

    pub fn set_step_minutes(&self, minutes: u32) {
        self.session.lock().step_minutes = minutes;
    }

    pub fn set_driver_limit(&self, limit: usize) {
        self.session.lock().driver_limit = limit;
    }

    pub fn set_active(&self, entity_id: Option<&str>, currency: Option<&str>) {
        let mut s = self.session.lock();
        if let Some(e) = entity_id {
            s.entity_id = e.to_string();
        }
        if let Some(c) = currency {
            s.currency = c.to_string();
        }
    }

    pub fn set_endpoints(&self, endpoints: Endpoints) {
        self.orchestrator.services().endpoints.set(endpoints);
    }

    pub fn endpoints(&self) -> Endpoints {
        self.orchestrator.services().endpoints.get()
    }
}
