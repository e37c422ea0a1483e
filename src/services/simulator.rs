use std::sync::Arc;

use serde_json::{json, Value};

use crate::error::Result;
use crate::logging::log_simulator;
use crate::services::SharedEndpoints;
use crate::transport::{build_url, Transport};

/// Cash-flow simulator control. Responses are opaque acknowledgements.
#[derive(Clone)]
pub struct SimulatorClient {
    transport: Arc<dyn Transport>,
    endpoints: SharedEndpoints,
}

impl SimulatorClient {
    pub fn new(transport: Arc<dyn Transport>, endpoints: SharedEndpoints) -> Self {
        Self {
            transport,
            endpoints,
        }
    }

    pub async fn start(&self, scenario_id: &str, seed: u64) -> Result<Value> {
        let url = build_url(&self.endpoints.get().simulator, "scenario/start", &[])?;
        let ack = self
            .transport
            .post_json(&url, &json!({ "scenario_id": scenario_id, "seed": seed }))
            .await?;
        log_simulator("start", scenario_id, &[("seed", json!(seed))]);
        Ok(ack)
    }

    pub async fn step(&self, scenario_id: &str, minutes: u32) -> Result<Value> {
        let url = build_url(&self.endpoints.get().simulator, "scenario/step", &[])?;
        let ack = self
            .transport
            .post_json(&url, &json!({ "scenario_id": scenario_id, "minutes": minutes }))
            .await?;
        log_simulator("step", scenario_id, &[("minutes", json!(minutes))]);
        Ok(ack)
    }

    pub async fn reset(&self, scenario_id: &str) -> Result<Value> {
        let url = build_url(
            &self.endpoints.get().simulator,
            "scenario/reset",
            &[("scenario_id", scenario_id)],
        )?;
        let ack = self.transport.post_json(&url, &json!({})).await?;
        log_simulator("reset", scenario_id, &[]);
        Ok(ack)
    }
}
