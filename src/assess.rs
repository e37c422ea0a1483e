//! Single-entity assessment: fetch, classify, conditionally recommend, render.

use std::sync::Arc;

use serde_json::json;
use tokio::sync::Mutex as AsyncMutex;

use crate::error::Result;
use crate::logging::{log, log_assessment, log_recommendation, obj, v_str, Domain, Level, ProfileScope};
use crate::model::{Driver, RecommendationResult, RiskState};
use crate::overlay::{apply_overlay, WhatIfParams};
use crate::render::DashboardSink;
use crate::services::Services;
use crate::severity::{Severity, Thresholds};
use crate::state::SharedSession;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssessOptions {
    /// Request recommendations regardless of severity.
    pub force_agent: bool,
}

/// Everything one assessment cycle renders, built from a single RiskState.
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub scenario_id: String,
    pub entity_id: String,
    pub currency: String,
    /// Authoritative state as fetched
    pub risk: RiskState,
    /// Same state with the what-if overlay on the forecast curve
    pub display: RiskState,
    pub severity: Severity,
    pub thresholds: Thresholds,
    pub what_if: WhatIfParams,
    pub drivers: Vec<Driver>,
    pub recommendation: Option<RecommendationResult>,
}

/// Recommendations are requested when forced, or when auto-agent is on and a
/// breach is projected inside the warning horizon.
pub fn should_recommend(force_agent: bool, auto_agent: bool, minutes_to_breach: Option<i64>, warn_minutes: i64) -> bool {
    force_agent || (auto_agent && minutes_to_breach.map_or(false, |m| m <= warn_minutes))
}

pub struct Orchestrator {
    services: Services,
    session: SharedSession,
    sink: Arc<dyn DashboardSink>,
    /// Serializes assessments so a slower cycle can never land after a fresher one.
    gate: AsyncMutex<()>,
}

impl Orchestrator {
    pub fn new(services: Services, session: SharedSession, sink: Arc<dyn DashboardSink>) -> Self {
        Self {
            services,
            session,
            sink,
            gate: AsyncMutex::new(()),
        }
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    /// Assess the session's active entity/currency.
    pub async fn assess_active(&self, opts: AssessOptions) -> Result<Assessment> {
        let (entity_id, currency) = {
            let s = self.session.lock();
            (s.entity_id.clone(), s.currency.clone())
        };
        self.assess(&entity_id, &currency, opts).await
    }

    /// Runs the cycle end to end. On any failure nothing is rendered and the
    /// previous view stays as it was.
    pub async fn assess(&self, entity_id: &str, currency: &str, opts: AssessOptions) -> Result<Assessment> {
        let _turn = self.gate.lock().await;
        let _profile = ProfileScope::with_context(
            "assess",
            &[("entity_id", v_str(entity_id)), ("currency", v_str(currency))],
        );

        let settings = self.session.snapshot();
        let risk = self
            .services
            .risk
            .risk_state(&settings.scenario_id, entity_id, currency)
            .await?;

        let thresholds = settings.thresholds;
        let severity = thresholds.classify(risk.minutes_to_breach);

        let recommendation = if should_recommend(
            opts.force_agent,
            settings.auto_agent,
            risk.minutes_to_breach,
            thresholds.warn_minutes,
        ) {
            let rec = self
                .services
                .orchestrator
                .run_cycle(&settings.scenario_id, entity_id, currency)
                .await?;
            log_recommendation(
                entity_id,
                currency,
                opts.force_agent,
                rec.rec_id.as_deref(),
                rec.ranked_actions.len(),
            );
            Some(rec)
        } else {
            None
        };

        let assessment = Assessment {
            scenario_id: settings.scenario_id.clone(),
            entity_id: entity_id.to_string(),
            currency: currency.to_string(),
            display: apply_overlay(&risk, &settings.what_if),
            drivers: risk.top_drivers(settings.driver_limit).to_vec(),
            risk,
            severity,
            thresholds,
            what_if: settings.what_if,
            recommendation,
        };

        if let Some(rec) = &assessment.recommendation {
            self.session.lock().on_actions_rendered(&rec.ranked_actions);
        }
        self.sink.render_assessment(&assessment);

        log_assessment(
            entity_id,
            currency,
            severity.as_str(),
            assessment.risk.minutes_to_breach,
            assessment.recommendation.is_some(),
            assessment
                .recommendation
                .as_ref()
                .map_or(0, |r| r.ranked_actions.len()),
        );
        log(
            Level::Trace,
            Domain::Risk,
            "assessment_detail",
            obj(&[
                ("balance", json!(assessment.risk.current_balance)),
                ("buffer_remaining", json!(assessment.risk.buffer_remaining)),
                ("forecast_points", json!(assessment.risk.forecast.len())),
            ]),
        );
        Ok(assessment)
    }
}
