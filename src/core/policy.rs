//! Pension rules that differ between calculator variants.
//!
//! Breakpoints and penalty rates are not fixed by any single source, so they
//! live here as data and can be swapped by loading a JSON file.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::types::RetirementMode;
use crate::error::PolicyError;

/// Percentage of the regulatory base earned per year contributed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PensionSchedule {
    /// Below this nothing is earned.
    pub min_years: f64,
    /// At or above this the full base is earned.
    pub max_years: f64,
    /// Share earned exactly at `min_years`.
    pub floor_pct: f64,
}

impl Default for PensionSchedule {
    fn default() -> Self {
        Self {
            min_years: 15.0,
            max_years: 38.0,
            floor_pct: 0.5,
        }
    }
}

impl PensionSchedule {
    pub fn percentage(&self, years_contributed: f64) -> f64 {
        if years_contributed < self.min_years {
            return 0.0;
        }
        if years_contributed >= self.max_years {
            return 1.0;
        }
        let span = self.max_years - self.min_years;
        let progress = (years_contributed - self.min_years) / span;
        (self.floor_pct + progress * (1.0 - self.floor_pct)).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeRule {
    pub min_total_years: f64,
    /// Largest advance (early) or delay (deferred) accepted, in months.
    pub max_months: u32,
    pub rate_per_month: f64,
}

/// Any field left out of a policy file keeps its default, including single
/// fields of a mode rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "PolicyFile", rename_all = "camelCase")]
pub struct PolicyConfig {
    pub schedule: PensionSchedule,
    pub ordinary: ModeRule,
    pub early_voluntary: ModeRule,
    pub early_involuntary: ModeRule,
    pub deferred: ModeRule,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ModeRuleOverride {
    min_total_years: Option<f64>,
    max_months: Option<u32>,
    rate_per_month: Option<f64>,
}

impl ModeRuleOverride {
    fn apply(self, base: ModeRule) -> ModeRule {
        ModeRule {
            min_total_years: self.min_total_years.unwrap_or(base.min_total_years),
            max_months: self.max_months.unwrap_or(base.max_months),
            rate_per_month: self.rate_per_month.unwrap_or(base.rate_per_month),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PolicyFile {
    schedule: PensionSchedule,
    ordinary: ModeRuleOverride,
    early_voluntary: ModeRuleOverride,
    early_involuntary: ModeRuleOverride,
    deferred: ModeRuleOverride,
}

impl From<PolicyFile> for PolicyConfig {
    fn from(file: PolicyFile) -> Self {
        let defaults = PolicyConfig::default();
        PolicyConfig {
            schedule: file.schedule,
            ordinary: file.ordinary.apply(defaults.ordinary),
            early_voluntary: file.early_voluntary.apply(defaults.early_voluntary),
            early_involuntary: file.early_involuntary.apply(defaults.early_involuntary),
            deferred: file.deferred.apply(defaults.deferred),
        }
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            schedule: PensionSchedule::default(),
            ordinary: ModeRule {
                min_total_years: 15.0,
                max_months: 0,
                rate_per_month: 0.0,
            },
            early_voluntary: ModeRule {
                min_total_years: 35.0,
                max_months: 24,
                rate_per_month: 0.005,
            },
            early_involuntary: ModeRule {
                min_total_years: 33.0,
                max_months: 48,
                rate_per_month: 0.005,
            },
            deferred: ModeRule {
                min_total_years: 15.0,
                max_months: 60,
                rate_per_month: 0.004,
            },
        }
    }
}

impl PolicyConfig {
    pub fn rule(&self, mode: RetirementMode) -> &ModeRule {
        match mode {
            RetirementMode::Ordinary => &self.ordinary,
            RetirementMode::EarlyVoluntary => &self.early_voluntary,
            RetirementMode::EarlyInvoluntary => &self.early_involuntary,
            RetirementMode::Deferred => &self.deferred,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, PolicyError> {
        let policy: PolicyConfig = serde_json::from_str(json)?;
        policy.validate()?;
        Ok(policy)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PolicyError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| PolicyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let policy = Self::from_json(&raw)?;
        log::info!("loaded pension policy from {}", path.display());
        Ok(policy)
    }

    pub fn validate(&self) -> Result<(), PolicyError> {
        let s = &self.schedule;
        if !s.min_years.is_finite() || !s.max_years.is_finite() || s.min_years < 0.0 {
            return Err(PolicyError::Invalid(
                "schedule years must be finite and >= 0".to_string(),
            ));
        }
        if s.max_years <= s.min_years {
            return Err(PolicyError::Invalid(
                "schedule.maxYears must be > schedule.minYears".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&s.floor_pct) {
            return Err(PolicyError::Invalid(
                "schedule.floorPct must be between 0 and 1".to_string(),
            ));
        }

        for mode in RetirementMode::ALL {
            let rule = self.rule(mode);
            if !rule.min_total_years.is_finite() || rule.min_total_years < 0.0 {
                return Err(PolicyError::Invalid(format!(
                    "{mode:?}: minTotalYears must be >= 0"
                )));
            }
            if !rule.rate_per_month.is_finite() || rule.rate_per_month < 0.0 {
                return Err(PolicyError::Invalid(format!(
                    "{mode:?}: ratePerMonth must be >= 0"
                )));
            }
            if mode != RetirementMode::Ordinary && rule.max_months == 0 {
                return Err(PolicyError::Invalid(format!(
                    "{mode:?}: maxMonths must be > 0"
                )));
            }
        }
        Ok(())
    }
}
