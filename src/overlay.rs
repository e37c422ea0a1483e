//! What-if overlay for forecast charts.
//!
//! The overlay is visual only. It bends the displayed balance curve and
//! nothing else: `minutes_to_breach`, the KPI numbers and the severity
//! classification all stay on the authoritative values from the risk
//! service. A what-if chart is not a what-if breach projection.

use serde::{Deserialize, Serialize};

use crate::model::{ForecastPoint, RiskState};

/// Share of the reference balance removed at the horizon end per 100% of shock.
pub const SHOCK_FACTOR: f64 = 0.25;
/// Share of the reference balance removed at the first point for a delay of 60+ minutes.
pub const DELAY_FACTOR: f64 = 0.10;
/// Delay at which the delayed-inflow penalty saturates.
pub const DELAY_SATURATION_MINUTES: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WhatIfParams {
    pub shock_pct: f64,
    pub delay_minutes: f64,
}

impl WhatIfParams {
    /// Negative or non-finite inputs are clamped to zero.
    pub fn new(shock_pct: f64, delay_minutes: f64) -> Self {
        Self {
            shock_pct: non_negative(shock_pct),
            delay_minutes: non_negative(delay_minutes),
        }
    }

    pub fn is_neutral(&self) -> bool {
        self.shock_pct == 0.0 && self.delay_minutes == 0.0
    }
}

fn non_negative(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 {
        v
    } else {
        0.0
    }
}

/// Returns a copy of `state` whose forecast balances carry the overlay.
///
/// Each point at fractional horizon position `f` (0 at the first point, 1 at
/// the last) loses
/// `reference * shock_pct/100 * SHOCK_FACTOR * f` for the outflow shock and,
/// when `delay_minutes > 0`,
/// `reference * DELAY_FACTOR * min(1, delay/60) * (1 - f)` for the delayed
/// inflow, where `reference` is `max(|current_balance|, 1)`.
pub fn apply_overlay(state: &RiskState, params: &WhatIfParams) -> RiskState {
    let mut out = state.clone();
    out.forecast = overlay_forecast(&state.forecast, state.current_balance, params);
    out
}

pub fn overlay_forecast(
    forecast: &[ForecastPoint],
    current_balance: f64,
    params: &WhatIfParams,
) -> Vec<ForecastPoint> {
    let params = WhatIfParams::new(params.shock_pct, params.delay_minutes);
    let reference = current_balance.abs().max(1.0);
    let last = forecast.len().saturating_sub(1);

    forecast
        .iter()
        .enumerate()
        .map(|(i, pt)| {
            let frac = if last == 0 { 0.0 } else { i as f64 / last as f64 };
            let mut balance = pt.balance;
            balance -= reference * (params.shock_pct / 100.0) * SHOCK_FACTOR * frac;
            if params.delay_minutes > 0.0 {
                let weight = (params.delay_minutes / DELAY_SATURATION_MINUTES).min(1.0);
                balance -= reference * DELAY_FACTOR * weight * (1.0 - frac);
            }
            ForecastPoint {
                t: pt.t.clone(),
                balance,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(balances: &[f64]) -> RiskState {
        RiskState {
            scenario_id: Some("demo".to_string()),
            as_of: None,
            entity_id: Some("E1".to_string()),
            currency: Some("USD".to_string()),
            current_balance: balances.first().copied().unwrap_or(0.0),
            early_warning_buffer: 400_000.0,
            buffer_remaining: 600_000.0,
            minutes_to_breach: Some(45),
            forecast: balances
                .iter()
                .enumerate()
                .map(|(i, b)| ForecastPoint {
                    t: format!("2026-10-15T09:{:02}:00", i * 5),
                    balance: *b,
                })
                .collect(),
            drivers: vec![],
        }
    }

    #[test]
    fn zero_params_reproduce_the_forecast() {
        let input = state(&[1_000_000.0, 950_000.0, 720_000.0, 410_000.0]);
        let out = apply_overlay(&input, &WhatIfParams::default());
        assert_eq!(out.forecast, input.forecast);
    }

    #[test]
    fn input_is_left_untouched() {
        let input = state(&[1_000_000.0, 900_000.0, 800_000.0]);
        let before = input.clone();
        let _ = apply_overlay(&input, &WhatIfParams::new(40.0, 30.0));
        assert_eq!(input, before);
    }

    #[test]
    fn larger_shock_never_raises_a_point() {
        let input = state(&[1_000_000.0, 900_000.0, 850_000.0, 700_000.0, 650_000.0]);
        let mild = apply_overlay(&input, &WhatIfParams::new(10.0, 20.0));
        let harsh = apply_overlay(&input, &WhatIfParams::new(35.0, 20.0));

        assert_eq!(harsh.forecast[0].balance, mild.forecast[0].balance);
        for i in 1..input.forecast.len() {
            assert!(
                harsh.forecast[i].balance < mild.forecast[i].balance,
                "point {} not lower",
                i
            );
        }
    }

    #[test]
    fn shock_compounds_toward_horizon_end() {
        let input = state(&[1_000_000.0; 5]);
        let out = apply_overlay(&input, &WhatIfParams::new(20.0, 0.0));
        let drops: Vec<f64> = out.forecast.iter().map(|p| 1_000_000.0 - p.balance).collect();
        assert_eq!(drops[0], 0.0);
        assert!(drops.windows(2).all(|w| w[1] > w[0]));
        assert!((drops[4] - 1_000_000.0 * 0.2 * SHOCK_FACTOR).abs() < 1e-6);
    }

    #[test]
    fn delay_penalty_fades_and_saturates() {
        let input = state(&[1_000_000.0; 4]);
        let out = apply_overlay(&input, &WhatIfParams::new(0.0, 120.0));
        let drops: Vec<f64> = out.forecast.iter().map(|p| 1_000_000.0 - p.balance).collect();
        assert!((drops[0] - 1_000_000.0 * DELAY_FACTOR).abs() < 1e-6);
        assert!(drops.windows(2).all(|w| w[1] < w[0]));
        assert!(drops[3].abs() < 1e-6);

        let half = apply_overlay(&input, &WhatIfParams::new(0.0, 30.0));
        assert!((1_000_000.0 - half.forecast[0].balance - drops[0] / 2.0).abs() < 1e-6);
    }

    #[test]
    fn minutes_to_breach_is_not_recomputed() {
        let input = state(&[1_000_000.0, 500_000.0, 100_000.0]);
        let out = apply_overlay(&input, &WhatIfParams::new(100.0, 60.0));
        assert_eq!(out.minutes_to_breach, input.minutes_to_breach);
        assert_eq!(out.current_balance, input.current_balance);
        assert_eq!(out.buffer_remaining, input.buffer_remaining);
    }

    #[test]
    fn empty_and_single_point_forecasts() {
        let empty = state(&[]);
        assert!(apply_overlay(&empty, &WhatIfParams::new(50.0, 30.0)).forecast.is_empty());

        let single = state(&[500_000.0]);
        let out = apply_overlay(&single, &WhatIfParams::new(50.0, 0.0));
        assert_eq!(out.forecast[0].balance, 500_000.0);
    }

    #[test]
    fn negative_inputs_are_clamped() {
        let p = WhatIfParams::new(-10.0, f64::NAN);
        assert!(p.is_neutral());
    }
}
