use std::sync::Arc;

use serde_json::{json, Value};

use crate::error::{Result, TransportError};
use crate::model::{ApprovalRequest, RecommendationResult};
use crate::services::SharedEndpoints;
use crate::transport::{build_url, Transport};

/// Recommendation and approval engine.
#[derive(Clone)]
pub struct OrchestratorClient {
    transport: Arc<dyn Transport>,
    endpoints: SharedEndpoints,
}

impl OrchestratorClient {
    pub fn new(transport: Arc<dyn Transport>, endpoints: SharedEndpoints) -> Self {
        Self {
            transport,
            endpoints,
        }
    }

    pub async fn run_cycle(&self, scenario_id: &str, entity_id: &str, currency: &str) -> Result<RecommendationResult> {
        let url = build_url(
            &self.endpoints.get().orchestrator,
            "run_cycle",
            &[
                ("scenario_id", scenario_id),
                ("entity_id", entity_id),
                ("currency", currency),
            ],
        )?;
        let raw = self.transport.post_json(&url, &json!({})).await?;
        let rec = serde_json::from_value(raw).map_err(|e| TransportError::Decode(e.to_string()))?;
        Ok(rec)
    }

    /// Returns the engine's response untouched.
    pub async fn approve(&self, request: &ApprovalRequest) -> Result<Value> {
        let url = build_url(&self.endpoints.get().orchestrator, "actions/approve", &[])?;
        let body = serde_json::to_value(request).map_err(|e| TransportError::Decode(e.to_string()))?;
        Ok(self.transport.post_json(&url, &body).await?)
    }
}
