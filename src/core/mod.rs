mod engine;
mod pension;
mod policy;
mod solver;
mod types;

pub use engine::{compute_gap, project_evolution, project_target, revalue_pension, run_plan};
pub use pension::{adjustment_coefficient, estimate_pension, modality_is_valid};
pub use policy::{ModeRule, PensionSchedule, PolicyConfig};
pub use solver::{annuity_present_value, sinking_fund_payment, solve_plan};
pub use types::{
    Adjustment, ClientProfile, EconomicAssumptions, GapBasis, Inputs, PensionEstimate,
    PlanResult, Projection, ProjectionPoint, RetirementGoal, RetirementMode, SavingsPlan,
};
