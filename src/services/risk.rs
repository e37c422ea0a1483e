use std::sync::Arc;

use crate::error::{Result, TransportError};
use crate::model::RiskState;
use crate::services::SharedEndpoints;
use crate::transport::{build_url, Transport};

#[derive(Clone)]
pub struct RiskClient {
    transport: Arc<dyn Transport>,
    endpoints: SharedEndpoints,
}

impl RiskClient {
    pub fn new(transport: Arc<dyn Transport>, endpoints: SharedEndpoints) -> Self {
        Self {
            transport,
            endpoints,
        }
    }

    pub async fn risk_state(&self, scenario_id: &str, entity_id: &str, currency: &str) -> Result<RiskState> {
        let url = build_url(
            &self.endpoints.get().risk,
            "risk_state",
            &[
                ("scenario_id", scenario_id),
                ("entity_id", entity_id),
                ("currency", currency),
            ],
        )?;
        let raw = self.transport.get_json(&url).await?;
        let state = serde_json::from_value(raw).map_err(|e| TransportError::Decode(e.to_string()))?;
        Ok(state)
    }
}
