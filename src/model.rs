//! Wire types exchanged with the risk service and the orchestration engine.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::In => "IN",
            Direction::Out => "OUT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub t: String,
    pub balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    pub ts: String,
    pub direction: Direction,
    pub amount: f64,
    #[serde(default)]
    pub rail: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub priority: String,
}

/// Authoritative per-entity, per-currency risk snapshot. Each fetch replaces
/// the previous one wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_of: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    pub current_balance: f64,
    pub early_warning_buffer: f64,
    pub buffer_remaining: f64,
    /// `None` when no breach is projected inside the forecast horizon.
    #[serde(default)]
    pub minutes_to_breach: Option<i64>,
    #[serde(default)]
    pub forecast: Vec<ForecastPoint>,
    #[serde(default)]
    pub drivers: Vec<Driver>,
}

impl RiskState {
    /// Leading drivers in the order the service sent them.
    pub fn top_drivers(&self, limit: usize) -> &[Driver] {
        &self.drivers[..self.drivers.len().min(limit)]
    }
}

/// One recommended action, kept as the exact JSON object the engine sent so
/// that an approval forwards it untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Action(Map<String, Value>);

impl Action {
    pub fn as_json(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn label(&self) -> &str {
        self.first_str(&["action", "action_type", "action_id"])
            .unwrap_or("UNKNOWN")
    }

    pub fn rationale(&self) -> &str {
        self.first_str(&["rationale", "reason", "impact_summary"])
            .unwrap_or("")
    }

    pub fn score(&self) -> Option<f64> {
        self.0.get("score").and_then(Value::as_f64)
    }

    fn first_str(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .find_map(|k| self.0.get(*k).and_then(Value::as_str))
    }
}

/// Engine output. `ranked_actions` order is authoritative and never re-sorted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rec_id: Option<String>,
    #[serde(default)]
    pub ranked_actions: Vec<Action>,
    #[serde(default)]
    pub explanation: String,
}

impl RecommendationResult {
    pub fn requires_action(&self) -> bool {
        !self.ranked_actions.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Approve => "APPROVE",
            Decision::Reject => "REJECT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApprovalRequest {
    pub scenario_id: String,
    pub entity_id: String,
    pub currency: String,
    pub decision: Decision,
    pub action: Action,
}
