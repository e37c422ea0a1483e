use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::transport::Transport;

pub mod orchestrator;
pub mod risk;
pub mod simulator;

pub use orchestrator::OrchestratorClient;
pub use risk::RiskClient;
pub use simulator::SimulatorClient;

/// Base URLs of the three collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    pub simulator: String,
    pub risk: String,
    pub orchestrator: String,
}

/// Endpoints shared by every client; overrides apply to the next request.
#[derive(Debug, Clone)]
pub struct SharedEndpoints(Arc<RwLock<Endpoints>>);

impl SharedEndpoints {
    pub fn new(endpoints: Endpoints) -> Self {
        Self(Arc::new(RwLock::new(endpoints)))
    }

    pub fn get(&self) -> Endpoints {
        self.0.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn set(&self, endpoints: Endpoints) {
        *self.0.write().unwrap_or_else(|e| e.into_inner()) = endpoints;
    }
}

/// The three HTTP collaborators over one transport.
#[derive(Clone)]
pub struct Services {
    pub simulator: SimulatorClient,
    pub risk: RiskClient,
    pub orchestrator: OrchestratorClient,
    pub endpoints: SharedEndpoints,
}

impl Services {
    pub fn new(transport: Arc<dyn Transport>, endpoints: Endpoints) -> Self {
        let endpoints = SharedEndpoints::new(endpoints);
        Self {
            simulator: SimulatorClient::new(transport.clone(), endpoints.clone()),
            risk: RiskClient::new(transport.clone(), endpoints.clone()),
            orchestrator: OrchestratorClient::new(transport, endpoints.clone()),
            endpoints,
        }
    }
}
