use super::types::SavingsPlan;

pub fn solve_plan(
    monthly_gap: f64,
    annual_return: f64,
    years_accumulating: u32,
    years_in_retirement: u32,
) -> SavingsPlan {
    if monthly_gap <= 0.0 {
        return SavingsPlan {
            capital_required: 0.0,
            monthly_contribution: 0.0,
        };
    }

    let capital_required =
        annuity_present_value(monthly_gap * 12.0, annual_return, years_in_retirement);
    let monthly_contribution = sinking_fund_payment(
        capital_required,
        annual_return / 12.0,
        years_accumulating.saturating_mul(12),
    );

    SavingsPlan {
        capital_required,
        monthly_contribution,
    }
}

/// Lump sum that pays `payment` at the end of each of `periods` periods.
pub fn annuity_present_value(payment: f64, rate: f64, periods: u32) -> f64 {
    let n = periods as f64;
    if rate == 0.0 {
        return payment * n;
    }
    payment * (1.0 - (1.0 + rate).powf(-n)) / rate
}

/// Level end-of-period payment whose future value after `periods` equals `target`.
pub fn sinking_fund_payment(target: f64, rate: f64, periods: u32) -> f64 {
    if periods == 0 {
        return 0.0;
    }
    let n = periods as f64;
    if rate == 0.0 {
        return target / n;
    }
    target * rate / ((1.0 + rate).powf(n) - 1.0)
}
