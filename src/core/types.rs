use serde::Serialize;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RetirementMode {
    Ordinary,
    EarlyVoluntary,
    EarlyInvoluntary,
    Deferred,
}

impl RetirementMode {
    pub const ALL: [RetirementMode; 4] = [
        RetirementMode::Ordinary,
        RetirementMode::EarlyVoluntary,
        RetirementMode::EarlyInvoluntary,
        RetirementMode::Deferred,
    ];
}

/// Which future monthly figure the pension is compared against.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GapBasis {
    Target,
    Expenses,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientProfile {
    pub current_age: u32,
    pub retirement_age: u32,
    pub life_expectancy: u32,
    pub years_contributed: f64,
    pub future_contribution_years: f64,
    pub monthly_income: f64,
    pub monthly_expenses: f64,
}

/// Annual rates as fractions (0.04 = 4%).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EconomicAssumptions {
    pub annual_return: f64,
    pub annual_inflation: f64,
    pub pension_revaluation: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetirementGoal {
    pub desired_monthly_income: f64,
    pub expense_retention: f64,
    pub gap_basis: GapBasis,
    /// Positive values advance retirement, negative values defer it.
    pub advance_or_delay_months: i32,
    /// Falls back to the monthly income when absent.
    pub regulatory_base: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Inputs {
    pub profile: ClientProfile,
    pub mode: RetirementMode,
    pub economics: EconomicAssumptions,
    pub goal: RetirementGoal,
}

impl Inputs {
    pub fn regulatory_base(&self) -> f64 {
        self.goal
            .regulatory_base
            .unwrap_or(self.profile.monthly_income)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PensionEstimate {
    pub percentage: f64,
    pub coefficient: f64,
    pub monthly_pension_today: f64,
    pub modality_valid: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsPlan {
    pub capital_required: f64,
    pub monthly_contribution: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionPoint {
    pub month: u32,
    pub contributed: f64,
    pub capital: f64,
    pub inflation_erosion: f64,
    pub real_capital: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Projection {
    points: Vec<ProjectionPoint>,
}

impl Projection {
    pub(crate) fn from_points(points: Vec<ProjectionPoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[ProjectionPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<&ProjectionPoint> {
        self.points.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ProjectionPoint> {
        self.points.iter()
    }
}

/// Input clamp applied while resolving a plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "field", rename_all = "camelCase")]
pub enum Adjustment {
    RetirementAge { requested: u32, applied: u32 },
    LifeExpectancy { requested: u32, applied: u32 },
    FutureContributionYears { requested: f64, applied: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanResult {
    pub retirement_age: u32,
    pub life_expectancy: u32,
    pub years_until_retirement: u32,
    pub years_in_retirement: u32,
    pub total_years_contributed: f64,
    pub percentage: f64,
    pub coefficient: f64,
    pub modality_valid: bool,
    pub pension_today: f64,
    pub pension_future: f64,
    pub target_future: f64,
    pub expenses_future: f64,
    pub gap: f64,
    pub capital_required: f64,
    pub monthly_contribution: f64,
    pub adjustments: Vec<Adjustment>,
    pub projection: Projection,
}
