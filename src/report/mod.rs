//! Printable summaries of a computed plan.
//!
//! Reports are plain serialisable values; turning them into HTML, PDF or
//! charts is left to whoever consumes the JSON.

use serde::Serialize;

use crate::core::{Inputs, PlanResult, Projection, ProjectionPoint, RetirementMode};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportAudience {
    #[default]
    Client,
    Agent,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientContact {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl ClientContact {
    fn is_blank(&self) -> bool {
        [&self.name, &self.email, &self.phone]
            .iter()
            .all(|field| field.as_deref().is_none_or(|v| v.trim().is_empty()))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub pension_future: f64,
    pub target_future: f64,
    pub expenses_future: f64,
    pub gap: f64,
    pub capital_required: f64,
    pub monthly_contribution: f64,
    pub modality_valid: bool,
}

/// Parameters an adviser needs to explain the numbers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalSection {
    pub mode: RetirementMode,
    pub current_age: u32,
    pub retirement_age: u32,
    pub years_contributed: f64,
    pub future_contribution_years: f64,
    pub total_years_contributed: f64,
    pub percentage: f64,
    pub coefficient: f64,
    pub annual_return: f64,
    pub annual_inflation: f64,
    pub pension_revaluation: f64,
    pub years_until_retirement: u32,
    pub years_in_retirement: u32,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Monthly,
    Yearly,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRow {
    pub granularity: Granularity,
    #[serde(flatten)]
    pub point: ProjectionPoint,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub audience: ReportAudience,
    pub contact: Option<ClientContact>,
    pub summary: ReportSummary,
    pub technical: Option<TechnicalSection>,
    pub schedule: Vec<ScheduleRow>,
}

pub fn build_report(
    inputs: &Inputs,
    plan: &PlanResult,
    audience: ReportAudience,
    contact: ClientContact,
) -> Report {
    let technical = match audience {
        ReportAudience::Client => None,
        ReportAudience::Agent => Some(TechnicalSection {
            mode: inputs.mode,
            current_age: inputs.profile.current_age,
            retirement_age: plan.retirement_age,
            years_contributed: inputs.profile.years_contributed,
            future_contribution_years: plan.total_years_contributed
                - inputs.profile.years_contributed.max(0.0),
            total_years_contributed: plan.total_years_contributed,
            percentage: plan.percentage,
            coefficient: plan.coefficient,
            annual_return: inputs.economics.annual_return,
            annual_inflation: inputs.economics.annual_inflation,
            pension_revaluation: inputs.economics.pension_revaluation,
            years_until_retirement: plan.years_until_retirement,
            years_in_retirement: plan.years_in_retirement,
        }),
    };

    Report {
        audience,
        contact: (!contact.is_blank()).then_some(contact),
        summary: ReportSummary {
            pension_future: plan.pension_future,
            target_future: plan.target_future,
            expenses_future: plan.expenses_future,
            gap: plan.gap,
            capital_required: plan.capital_required,
            monthly_contribution: plan.monthly_contribution,
            modality_valid: plan.modality_valid,
        },
        technical,
        schedule: schedule_checkpoints(&plan.projection),
    }
}

/// Every month of the first year, then one row per completed year. The final
/// month is always included.
pub fn schedule_checkpoints(projection: &Projection) -> Vec<ScheduleRow> {
    let last_month = projection.last().map(|p| p.month).unwrap_or(0);
    projection
        .iter()
        .filter_map(|point| {
            let granularity = if point.month <= 12 {
                Granularity::Monthly
            } else if point.month % 12 == 0 || point.month == last_month {
                Granularity::Yearly
            } else {
                return None;
            };
            Some(ScheduleRow {
                granularity,
                point: *point,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        ClientProfile, EconomicAssumptions, GapBasis, PolicyConfig, RetirementGoal, run_plan,
    };

    fn sample_inputs() -> Inputs {
        Inputs {
            profile: ClientProfile {
                current_age: 45,
                retirement_age: 67,
                life_expectancy: 87,
                years_contributed: 20.0,
                future_contribution_years: 22.0,
                monthly_income: 2_200.0,
                monthly_expenses: 1_700.0,
            },
            mode: RetirementMode::Ordinary,
            economics: EconomicAssumptions {
                annual_return: 0.04,
                annual_inflation: 0.02,
                pension_revaluation: 0.02,
            },
            goal: RetirementGoal {
                desired_monthly_income: 2_200.0,
                expense_retention: 0.8,
                gap_basis: GapBasis::Target,
                advance_or_delay_months: 0,
                regulatory_base: None,
            },
        }
    }

    #[test]
    fn client_report_hides_technical_section() {
        let inputs = sample_inputs();
        let plan = run_plan(&inputs, &PolicyConfig::default());
        let report = build_report(&inputs, &plan, ReportAudience::Client, ClientContact::default());
        assert!(report.technical.is_none());
        assert!(report.contact.is_none());
        assert_eq!(report.summary.gap, plan.gap);
        assert_eq!(report.summary.monthly_contribution, plan.monthly_contribution);
    }

    #[test]
    fn agent_report_carries_parameters_and_contact() {
        let inputs = sample_inputs();
        let plan = run_plan(&inputs, &PolicyConfig::default());
        let contact = ClientContact {
            name: Some("Ana".to_string()),
            email: None,
            phone: Some("600 000 000".to_string()),
        };
        let report = build_report(&inputs, &plan, ReportAudience::Agent, contact.clone());
        let technical = report.technical.expect("agent report has technical section");
        assert_eq!(technical.years_until_retirement, 22);
        assert_eq!(technical.years_in_retirement, 20);
        assert_eq!(technical.future_contribution_years, 22.0);
        assert_eq!(technical.coefficient, 1.0);
        assert_eq!(report.contact, Some(contact));
    }

    #[test]
    fn whitespace_contact_is_dropped() {
        let inputs = sample_inputs();
        let plan = run_plan(&inputs, &PolicyConfig::default());
        let contact = ClientContact {
            name: Some("  ".to_string()),
            email: Some(String::new()),
            phone: None,
        };
        let report = build_report(&inputs, &plan, ReportAudience::Client, contact);
        assert!(report.contact.is_none());
    }

    #[test]
    fn checkpoints_are_monthly_then_yearly() {
        let inputs = sample_inputs();
        let plan = run_plan(&inputs, &PolicyConfig::default());
        let rows = schedule_checkpoints(&plan.projection);

        // months 0..=12 plus years 2..=22
        assert_eq!(rows.len(), 13 + 21);
        assert!(rows[..13].iter().all(|r| r.granularity == Granularity::Monthly));
        assert!(rows[13..].iter().all(|r| r.granularity == Granularity::Yearly));
        assert_eq!(rows[13].point.month, 24);
        assert_eq!(rows.last().map(|r| r.point.month), Some(22 * 12));
    }

    #[test]
    fn single_year_projection_is_all_monthly() {
        let projection = crate::core::project_evolution(1, 0.03, 0.02, 100.0);
        let rows = schedule_checkpoints(&projection);
        assert_eq!(rows.len(), 13);
    }

    #[test]
    fn report_serializes_flattened_schedule_rows() {
        let inputs = sample_inputs();
        let plan = run_plan(&inputs, &PolicyConfig::default());
        let report = build_report(&inputs, &plan, ReportAudience::Agent, ClientContact::default());
        let json = serde_json::to_string(&report).expect("report should serialize");
        assert!(json.contains("\"audience\":\"agent\""));
        assert!(json.contains("\"granularity\":\"monthly\""));
        assert!(json.contains("\"realCapital\""));
        assert!(json.contains("\"technical\""));
    }
}
