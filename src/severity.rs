//! Tri-state breach severity from minutes-to-breach and two thresholds.

use serde::{Deserialize, Serialize};

/// Warning and breach horizons in minutes. User-editable; callers read the
/// current value on every evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    pub warn_minutes: i64,
    pub breach_minutes: i64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            warn_minutes: 60,
            breach_minutes: 30,
        }
    }
}

impl Thresholds {
    pub fn new(warn_minutes: i64, breach_minutes: i64) -> Self {
        Self {
            warn_minutes,
            breach_minutes,
        }
    }

    pub fn classify(&self, minutes_to_breach: Option<i64>) -> Severity {
        classify(minutes_to_breach, self.warn_minutes, self.breach_minutes)
    }
}

/// Ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    /// No breach projected, or projected beyond the warning horizon
    Safe,
    /// Breach projected inside the warning horizon
    EarlyWarning,
    /// Breach projected inside the breach horizon
    ImminentBreach,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Safe => "SAFE",
            Severity::EarlyWarning => "EARLY WARNING",
            Severity::ImminentBreach => "IMMINENT",
        }
    }

    pub fn style_class(&self) -> &'static str {
        match self {
            Severity::Safe => "status-safe",
            Severity::EarlyWarning => "status-warn",
            Severity::ImminentBreach => "status-breach",
        }
    }
}

/// `None` is always safe. Zero minutes is a real value, not an absent one.
/// The breach check runs first, so `mtb == breach_min` is imminent.
pub fn classify(minutes_to_breach: Option<i64>, warn_min: i64, breach_min: i64) -> Severity {
    match minutes_to_breach {
        None => Severity::Safe,
        Some(m) if m <= breach_min => Severity::ImminentBreach,
        Some(m) if m <= warn_min => Severity::EarlyWarning,
        Some(_) => Severity::Safe,
    }
}
