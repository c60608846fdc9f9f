use super::pension::estimate_pension;
use super::policy::PolicyConfig;
use super::solver::solve_plan;
use super::types::{
    Adjustment, ClientProfile, GapBasis, Inputs, PlanResult, Projection, ProjectionPoint,
};

#[derive(Debug, Clone, Copy)]
struct Horizon {
    retirement_age: u32,
    life_expectancy: u32,
    years_until_retirement: u32,
    years_in_retirement: u32,
    future_contribution_years: f64,
}

pub fn run_plan(inputs: &Inputs, policy: &PolicyConfig) -> PlanResult {
    let mut adjustments = Vec::new();
    let horizon = resolve_horizon(&inputs.profile, &mut adjustments);
    for adjustment in &adjustments {
        log::debug!("clamped input: {adjustment:?}");
    }

    let economics = inputs.economics;
    let total_years_contributed =
        inputs.profile.years_contributed.max(0.0) + horizon.future_contribution_years;

    let estimate = estimate_pension(
        total_years_contributed,
        inputs.regulatory_base(),
        inputs.mode,
        inputs.goal.advance_or_delay_months,
        policy,
    );
    if !estimate.modality_valid {
        log::warn!(
            "{:?} retirement not available with {total_years_contributed} contribution years and {} months",
            inputs.mode,
            inputs.goal.advance_or_delay_months
        );
    }

    let pension_future = revalue_pension(
        estimate.monthly_pension_today,
        economics.pension_revaluation,
        horizon.years_until_retirement,
    );
    let (target_future, expenses_future) = project_target(
        inputs.goal.desired_monthly_income,
        inputs.profile.monthly_expenses,
        inputs.goal.expense_retention,
        economics.annual_inflation,
        horizon.years_until_retirement,
    );
    let gap = compute_gap(
        target_future,
        expenses_future,
        pension_future,
        inputs.goal.gap_basis,
    );
    let plan = solve_plan(
        gap,
        economics.annual_return,
        horizon.years_until_retirement,
        horizon.years_in_retirement,
    );
    let projection = project_evolution(
        horizon.years_until_retirement,
        economics.annual_return,
        economics.annual_inflation,
        plan.monthly_contribution,
    );

    log::debug!(
        "plan: pension_future={pension_future:.2} gap={gap:.2} capital={:.2} contribution={:.2}",
        plan.capital_required,
        plan.monthly_contribution
    );

    PlanResult {
        retirement_age: horizon.retirement_age,
        life_expectancy: horizon.life_expectancy,
        years_until_retirement: horizon.years_until_retirement,
        years_in_retirement: horizon.years_in_retirement,
        total_years_contributed,
        percentage: estimate.percentage,
        coefficient: estimate.coefficient,
        modality_valid: estimate.modality_valid,
        pension_today: estimate.monthly_pension_today,
        pension_future,
        target_future,
        expenses_future,
        gap,
        capital_required: plan.capital_required,
        monthly_contribution: plan.monthly_contribution,
        adjustments,
        projection,
    }
}

fn resolve_horizon(profile: &ClientProfile, adjustments: &mut Vec<Adjustment>) -> Horizon {
    let retirement_age = if profile.retirement_age <= profile.current_age {
        let applied = profile.current_age.saturating_add(1);
        adjustments.push(Adjustment::RetirementAge {
            requested: profile.retirement_age,
            applied,
        });
        applied
    } else {
        profile.retirement_age
    };

    let life_expectancy = if profile.life_expectancy <= retirement_age {
        let applied = retirement_age.saturating_add(1);
        adjustments.push(Adjustment::LifeExpectancy {
            requested: profile.life_expectancy,
            applied,
        });
        applied
    } else {
        profile.life_expectancy
    };

    let years_until_retirement = retirement_age.saturating_sub(profile.current_age);
    let requested = profile.future_contribution_years;
    let future_contribution_years = requested.clamp(0.0, years_until_retirement as f64);
    if future_contribution_years != requested {
        adjustments.push(Adjustment::FutureContributionYears {
            requested,
            applied: future_contribution_years,
        });
    }

    Horizon {
        retirement_age,
        life_expectancy,
        years_until_retirement,
        years_in_retirement: life_expectancy.saturating_sub(retirement_age),
        future_contribution_years,
    }
}

/// Inflates the desired income and the retained share of today's expenses.
pub fn project_target(
    desired_income_today: f64,
    expenses_today: f64,
    expense_retention: f64,
    inflation: f64,
    years_until_retirement: u32,
) -> (f64, f64) {
    let factor = growth_factor(inflation, years_until_retirement as f64);
    (
        desired_income_today * factor,
        expenses_today * expense_retention * factor,
    )
}

pub fn revalue_pension(pension_today: f64, revaluation: f64, years_until_retirement: u32) -> f64 {
    pension_today * growth_factor(revaluation, years_until_retirement as f64)
}

/// Negative results are a surplus, not an error.
pub fn compute_gap(
    target_future: f64,
    expenses_future: f64,
    pension_future: f64,
    basis: GapBasis,
) -> f64 {
    let selected = match basis {
        GapBasis::Target => target_future,
        GapBasis::Expenses => expenses_future,
    };
    selected - pension_future
}

/// Month-by-month accumulation from an empty fund. Holds `years * 12 + 1`
/// points, so the horizon should be lifetime-scale. Values that would overflow
/// saturate at `f64::MAX` instead of turning into infinities.
pub fn project_evolution(
    years_accumulating: u32,
    annual_return: f64,
    annual_inflation: f64,
    monthly_contribution: f64,
) -> Projection {
    let months = years_accumulating.saturating_mul(12);
    let monthly_growth = 1.0 + annual_return / 12.0;

    let mut points = Vec::with_capacity(months as usize + 1);
    let mut capital = 0.0;
    for month in 0..=months {
        if month > 0 {
            capital = saturate(capital * monthly_growth + monthly_contribution);
        }
        let real_capital =
            saturate(capital / growth_factor(annual_inflation, month as f64 / 12.0));
        points.push(ProjectionPoint {
            month,
            contributed: monthly_contribution * month as f64,
            capital,
            inflation_erosion: capital - real_capital,
            real_capital,
        });
    }
    Projection::from_points(points)
}

fn growth_factor(rate: f64, years: f64) -> f64 {
    (1.0 + rate).powf(years)
}

fn saturate(value: f64) -> f64 {
    value.clamp(-f64::MAX, f64::MAX)
}
