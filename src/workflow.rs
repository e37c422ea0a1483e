//! Action selection and the approve/reject round trip.

use std::sync::Arc;

use serde_json::Value;

use crate::error::{PreconditionError, Result};
use crate::logging::{audit_hash, log_decision, log_selection};
use crate::model::{Action, ApprovalRequest, Decision};
use crate::render::DashboardSink;
use crate::services::OrchestratorClient;
use crate::state::SharedSession;

/// Content hash recorded in the audit trail for the exact payload sent.
pub fn action_hash(action: &Action) -> String {
    audit_hash(&Value::Object(action.as_json().clone()))
}

pub struct ApprovalWorkflow {
    orchestrator: OrchestratorClient,
    session: SharedSession,
    sink: Arc<dyn DashboardSink>,
}

impl ApprovalWorkflow {
    pub fn new(orchestrator: OrchestratorClient, session: SharedSession, sink: Arc<dyn DashboardSink>) -> Self {
        Self {
            orchestrator,
            session,
            sink,
        }
    }

    /// Stores the action by value; a later re-ranking cannot change what was chosen.
    pub fn select_action(&self, action: Action) {
        log_selection(action.label(), &action_hash(&action));
        self.session.lock().select_action(action);
    }

    /// Pick by 1-based position in the list currently on screen.
    pub fn select_rendered(&self, position: usize) -> Option<Action> {
        let action = {
            let s = self.session.lock();
            position
                .checked_sub(1)
                .and_then(|i| s.rendered_actions().get(i).cloned())
        }?;
        self.select_action(action.clone());
        Some(action)
    }

    /// Forward a decision on the selected action. Fails locally, without any
    /// request, when nothing is selected. The engine's reply is displayed
    /// and returned as-is.
    pub async fn decide(&self, decision: Decision) -> Result<Value> {
        let request = {
            let s = self.session.lock();
            let action = s
                .selected_action()
                .cloned()
                .ok_or(PreconditionError::NoActionSelected)?;
            ApprovalRequest {
                scenario_id: s.scenario_id.clone(),
                entity_id: s.entity_id.clone(),
                currency: s.currency.clone(),
                decision,
                action,
            }
        };

        let hash = action_hash(&request.action);
        match self.orchestrator.approve(&request).await {
            Ok(response) => {
                log_decision(
                    &request.scenario_id,
                    &request.entity_id,
                    &request.currency,
                    decision.as_str(),
                    request.action.label(),
                    &hash,
                    "accepted",
                );
                self.sink.render_decision_response(&response);
                Ok(response)
            }
            Err(err) => {
                log_decision(
                    &request.scenario_id,
                    &request.entity_id,
                    &request.currency,
                    decision.as_str(),
                    request.action.label(),
                    &hash,
                    "failed",
                );
                Err(err)
            }
        }
    }
}
