use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

use crate::calendar::{add_months, default_start_month};
use crate::ecl::{aggregates_by_product, compute_monthly_ecl, overall_aggregates, PortfolioAggregate, DEFAULT_LGD};
use crate::error::CeclError;
use crate::macro_series::{align, synthesize, MacroAdjustment, MacroSeries, SyntheticMacroInput};
use crate::numeric::mean;
use crate::simulation::{generate_portfolio, PortfolioInput};
use crate::types::{with_metadata, ComputationOutput, ProductType};
use crate::CeclResult;

/// Tolerance on the sum of scenario probabilities.
const PROBABILITY_TOLERANCE: f64 = 1e-3;

// ---------------------------------------------------------------------------
// Input / Output
// ---------------------------------------------------------------------------

/// One macro scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSpec {
    pub name: String,
    #[serde(default = "default_borrowers")]
    pub n_borrowers: usize,
    #[serde(default = "default_months")]
    pub months: usize,
    #[serde(default)]
    pub macro_adjustments: MacroAdjustment,
    /// Overrides the set-level seed.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Weight in the probability-weighted loss; all or none must be given.
    #[serde(default)]
    pub probability: Option<f64>,
}

fn default_borrowers() -> usize {
    8000
}

fn default_months() -> usize {
    6
}

/// A batch of scenarios run against one base macro path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSetInput {
    pub scenarios: Vec<ScenarioSpec>,
    #[serde(default = "default_start_month")]
    pub start_month: NaiveDate,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_products")]
    pub products: Vec<ProductType>,
    /// Synthesized from `seed` when absent.
    #[serde(default)]
    pub macro_series: Option<MacroSeries>,
    #[serde(default = "default_lgd")]
    pub default_lgd: f64,
}

fn default_seed() -> u64 {
    crate::DEFAULT_SEED
}

fn default_products() -> Vec<ProductType> {
    ProductType::ALL.to_vec()
}

fn default_lgd() -> f64 {
    DEFAULT_LGD
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioRun {
    pub name: String,
    pub macro_adjustments: MacroAdjustment,
    pub by_product: Vec<PortfolioAggregate>,
    pub overall: Vec<PortfolioAggregate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioComparison {
    pub scenario: String,
    pub total_monthly_ecl: f64,
    pub last_coverage_pct: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioOutput {
    pub runs: Vec<ScenarioRun>,
    pub comparison: Vec<ScenarioComparison>,
    /// Present when every scenario carries a probability.
    pub probability_weighted_ecl: Option<f64>,
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Shift the base macro path, regenerate the portfolio and aggregate its
/// monthly ECL by product and overall.
///
/// Unemployment deviations are taken from the base path's horizon mean.
pub fn run_scenario(
    spec: &ScenarioSpec,
    base_macro: &MacroSeries,
    start_month: NaiveDate,
    seed: u64,
    products: &[ProductType],
    default_lgd: f64,
) -> CeclResult<ScenarioRun> {
    // Deviations are taken from the unshocked path's mean.
    let baseline = mean(&align(base_macro, start_month, spec.months)?.unemployment);
    let adjusted = spec.macro_adjustments.apply(base_macro);
    let portfolio = generate_portfolio(&PortfolioInput {
        num_borrowers: spec.n_borrowers,
        products: products.to_vec(),
        months: spec.months,
        start_month,
        seed: spec.seed.unwrap_or(seed),
        macro_series: Some(adjusted),
        unemployment_baseline: Some(baseline),
    })?;

    let mut monthly = Vec::new();
    for panel in portfolio.result.panels.values() {
        monthly.extend(compute_monthly_ecl(&panel.records, default_lgd));
    }
    let by_product = aggregates_by_product(&monthly);
    let overall = overall_aggregates(&by_product);
    debug!(scenario = %spec.name, rows = monthly.len(), "scenario aggregated");

    Ok(ScenarioRun {
        name: spec.name.clone(),
        macro_adjustments: spec.macro_adjustments.clone(),
        by_product,
        overall,
    })
}

/// Total monthly ECL and last-month coverage per run.
pub fn compare_scenarios(runs: &[ScenarioRun]) -> Vec<ScenarioComparison> {
    runs.iter()
        .map(|run| ScenarioComparison {
            scenario: run.name.clone(),
            total_monthly_ecl: run.overall.iter().map(|a| a.portfolio_monthly_ecl).sum(),
            last_coverage_pct: run.overall.last().map(|a| a.coverage_pct()).unwrap_or(0.0),
            probability: None,
        })
        .collect()
}

fn check_probabilities(scenarios: &[ScenarioSpec], warnings: &mut Vec<String>) -> CeclResult<bool> {
    let given = scenarios.iter().filter(|s| s.probability.is_some()).count();
    if given == 0 {
        return Ok(false);
    }
    if given != scenarios.len() {
        return Err(CeclError::InvalidInput {
            field: "scenarios.probability".into(),
            reason: "Give a probability for every scenario or for none".into(),
        });
    }
    for s in scenarios {
        let p = s.probability.unwrap_or_default();
        if !(0.0..=1.0).contains(&p) {
            return Err(CeclError::InvalidInput {
                field: format!("scenario:{} probability", s.name),
                reason: "Probability must be between 0 and 1".into(),
            });
        }
    }
    let total: f64 = scenarios.iter().filter_map(|s| s.probability).sum();
    if (total - 1.0).abs() > PROBABILITY_TOLERANCE {
        return Err(CeclError::InvalidInput {
            field: "probabilities".into(),
            reason: format!("Probabilities must sum to 1.0 (got {total})"),
        });
    }
    if total != 1.0 {
        warnings.push(format!("Probabilities sum to {total}; treated as approximately 1.0"));
    }
    Ok(true)
}

/// Run every scenario against the same base macro path and compare them.
pub fn run_scenarios(input: &ScenarioSetInput) -> CeclResult<ComputationOutput<ScenarioOutput>> {
    let start = Instant::now();
    let mut warnings = Vec::new();

    if input.scenarios.is_empty() {
        return Err(CeclError::InsufficientData("At least one scenario required".into()));
    }
    let weighted = check_probabilities(&input.scenarios, &mut warnings)?;

    let base_macro = match &input.macro_series {
        Some(series) => series.clone(),
        None => {
            let horizon = input.scenarios.iter().map(|s| s.months).max().unwrap_or(1);
            let first = input
                .start_month
                .checked_sub_months(chrono::Months::new(12))
                .unwrap_or(input.start_month);
            synthesize(&SyntheticMacroInput {
                start: first,
                end: add_months(input.start_month, horizon.saturating_sub(1) as u32)?,
                seed: input.seed,
            })?
        }
    };

    let mut runs = Vec::with_capacity(input.scenarios.len());
    for spec in &input.scenarios {
        info!(scenario = %spec.name, borrowers = spec.n_borrowers, months = spec.months, "running scenario");
        runs.push(run_scenario(
            spec,
            &base_macro,
            input.start_month,
            input.seed,
            &input.products,
            input.default_lgd,
        )?);
    }

    let mut comparison = compare_scenarios(&runs);
    for (row, spec) in comparison.iter_mut().zip(&input.scenarios) {
        row.probability = spec.probability;
    }
    let probability_weighted_ecl = weighted.then(|| {
        comparison
            .iter()
            .map(|c| c.probability.unwrap_or_default() * c.total_monthly_ecl)
            .sum()
    });

    let elapsed = start.elapsed().as_micros() as u64;
    info!(scenarios = runs.len(), elapsed_us = elapsed, "scenario set complete");
    Ok(with_metadata(
        "Macro-shocked portfolio regeneration with CECL aggregation per scenario",
        &serde_json::json!({
            "num_scenarios": input.scenarios.len(),
            "start_month": input.start_month,
            "seed": input.seed,
            "default_lgd": input.default_lgd,
        }),
        warnings,
        elapsed,
        ScenarioOutput {
            runs,
            comparison,
            probability_weighted_ecl,
        },
    ))
}
