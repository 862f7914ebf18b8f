//! Macro stress scenarios over a regenerated portfolio.

pub mod scenario;

pub use scenario::{
    compare_scenarios, run_scenario, run_scenarios, ScenarioComparison, ScenarioOutput, ScenarioRun,
    ScenarioSetInput, ScenarioSpec,
};
