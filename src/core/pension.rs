use super::policy::{ModeRule, PolicyConfig};
use super::types::{PensionEstimate, RetirementMode};

pub fn estimate_pension(
    total_years_contributed: f64,
    regulatory_base: f64,
    mode: RetirementMode,
    advance_or_delay_months: i32,
    policy: &PolicyConfig,
) -> PensionEstimate {
    let rule = policy.rule(mode);
    let modality_valid =
        modality_is_valid(mode, rule, total_years_contributed, advance_or_delay_months);
    let coefficient = adjustment_coefficient(mode, rule, advance_or_delay_months);
    let percentage = if modality_valid {
        policy.schedule.percentage(total_years_contributed)
    } else {
        0.0
    };

    PensionEstimate {
        percentage,
        coefficient,
        monthly_pension_today: regulatory_base.max(0.0) * percentage * coefficient,
        modality_valid,
    }
}

pub fn modality_is_valid(
    mode: RetirementMode,
    rule: &ModeRule,
    total_years_contributed: f64,
    advance_or_delay_months: i32,
) -> bool {
    if total_years_contributed < rule.min_total_years {
        return false;
    }
    let limit = rule.max_months as i64;
    let months = advance_or_delay_months as i64;
    match mode {
        RetirementMode::Ordinary => true,
        RetirementMode::EarlyVoluntary | RetirementMode::EarlyInvoluntary => {
            months > 0 && months <= limit
        }
        RetirementMode::Deferred => months < 0 && months >= -limit,
    }
}

/// `1 - rate * months`, never below zero. Negative months (delay) turn the
/// penalty into a bonus.
pub fn adjustment_coefficient(
    mode: RetirementMode,
    rule: &ModeRule,
    advance_or_delay_months: i32,
) -> f64 {
    if mode == RetirementMode::Ordinary {
        return 1.0;
    }
    (1.0 - rule.rate_per_month * advance_or_delay_months as f64).max(0.0)
}
