//! Fleet view: one risk fetch per (entity, currency) cell plus a rollup.
//!
//! Cells are fetched concurrently and each failure is contained in its own
//! cell. The rollup is computed only once every fetch has settled.

use futures_util::future::join_all;
use serde::Serialize;

use crate::logging::{log_cell_offline, log_rollup};
use crate::model::ForecastPoint;
use crate::services::RiskClient;
use crate::severity::{Severity, Thresholds};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellSummary {
    pub entity: String,
    pub currency: String,
    pub balance: f64,
    pub remaining: f64,
    pub buffer: f64,
    pub mtb: Option<i64>,
    pub forecast: Vec<ForecastPoint>,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PortfolioCell {
    Online(CellSummary),
    Offline {
        entity: String,
        currency: String,
        reason: String,
    },
}

impl PortfolioCell {
    pub fn entity(&self) -> &str {
        match self {
            PortfolioCell::Online(c) => &c.entity,
            PortfolioCell::Offline { entity, .. } => entity,
        }
    }

    pub fn currency(&self) -> &str {
        match self {
            PortfolioCell::Online(c) => &c.currency,
            PortfolioCell::Offline { currency, .. } => currency,
        }
    }

    pub fn is_offline(&self) -> bool {
        matches!(self, PortfolioCell::Offline { .. })
    }

    pub fn summary(&self) -> Option<&CellSummary> {
        match self {
            PortfolioCell::Online(c) => Some(c),
            PortfolioCell::Offline { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RollupStatus {
    Stable,
    Elevated,
    Imminent,
}

impl RollupStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RollupStatus::Stable => "STABLE",
            RollupStatus::Elevated => "ELEVATED",
            RollupStatus::Imminent => "IMMINENT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PortfolioRollup {
    pub status: RollupStatus,
    pub worst_minutes_to_breach: Option<i64>,
    pub warn_count: usize,
    pub breach_count: usize,
    pub offline_count: usize,
}

/// Tally online cells by their own severity; a breached cell is not also
/// counted as warned. Offline cells only contribute to `offline_count`.
pub fn rollup(cells: &[PortfolioCell]) -> PortfolioRollup {
    let mut warn_count = 0;
    let mut breach_count = 0;
    let mut offline_count = 0;
    let mut worst: Option<i64> = None;

    for cell in cells {
        let Some(c) = cell.summary() else {
            offline_count += 1;
            continue;
        };
        match c.severity {
            Severity::ImminentBreach => breach_count += 1,
            Severity::EarlyWarning => warn_count += 1,
            Severity::Safe => {}
        }
        if let Some(m) = c.mtb {
            worst = Some(worst.map_or(m, |w| w.min(m)));
        }
    }

    let status = if breach_count > 0 {
        RollupStatus::Imminent
    } else if warn_count > 0 {
        RollupStatus::Elevated
    } else {
        RollupStatus::Stable
    };

    PortfolioRollup {
        status,
        worst_minutes_to_breach: worst,
        warn_count,
        breach_count,
        offline_count,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioSnapshot {
    /// Entity-major order of the cross product
    pub cells: Vec<PortfolioCell>,
    pub rollup: PortfolioRollup,
}

pub struct PortfolioAggregator {
    risk: RiskClient,
}

impl PortfolioAggregator {
    pub fn new(risk: RiskClient) -> Self {
        Self { risk }
    }

    pub async fn refresh(
        &self,
        scenario_id: &str,
        entities: &[String],
        currencies: &[String],
        thresholds: Thresholds,
    ) -> PortfolioSnapshot {
        let fetches = entities.iter().flat_map(|entity| {
            currencies
                .iter()
                .map(move |currency| self.fetch_cell(scenario_id, entity, currency, thresholds))
        });
        let cells = join_all(fetches).await;
        let rollup = rollup(&cells);
        log_rollup(
            rollup.status.as_str(),
            rollup.worst_minutes_to_breach,
            rollup.warn_count,
            rollup.breach_count,
            rollup.offline_count,
        );
        PortfolioSnapshot { cells, rollup }
    }

    async fn fetch_cell(&self, scenario_id: &str, entity: &str, currency: &str, thresholds: Thresholds) -> PortfolioCell {
        match self.risk.risk_state(scenario_id, entity, currency).await {
            Ok(state) => PortfolioCell::Online(CellSummary {
                entity: entity.to_string(),
                currency: currency.to_string(),
                balance: state.current_balance,
                remaining: state.buffer_remaining,
                buffer: state.early_warning_buffer,
                mtb: state.minutes_to_breach,
                severity: thresholds.classify(state.minutes_to_breach),
                forecast: state.forecast,
            }),
            Err(err) => {
                log_cell_offline(entity, currency, &err);
                PortfolioCell::Offline {
                    entity: entity.to_string(),
                    currency: currency.to_string(),
                    reason: err.to_string(),
                }
            }
        }
    }
}
