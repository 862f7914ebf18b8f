//! Descriptive reports over panels, loss aggregates and loan tapes.

pub mod distribution;
pub mod roll_rates;
pub mod summaries;

pub use distribution::{distribution_summary, panel_columns, DistributionSummary};
pub use roll_rates::{roll_rate_matrix, RollRateMatrix};
pub use summaries::{
    coverage_by_product, monthly_summary_overall, vintage_summary, CoverageRow, MonthlySummaryRow,
    VintageRow,
};

use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::info;

use crate::ecl::{aggregates_by_product, compute_monthly_ecl, overall_aggregates, DEFAULT_LGD};
use crate::error::CeclError;
use crate::types::{with_metadata, ComputationOutput, Loan, PerformanceRecord};
use crate::CeclResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportInput {
    pub panel: Vec<PerformanceRecord>,
    #[serde(default)]
    pub loans: Vec<Loan>,
    #[serde(default = "default_lgd")]
    pub default_lgd: f64,
}

fn default_lgd() -> f64 {
    DEFAULT_LGD
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelReport {
    pub roll_rates: RollRateMatrix,
    pub distributions: Vec<DistributionSummary>,
    pub coverage: Vec<CoverageRow>,
    pub monthly_overall: Vec<MonthlySummaryRow>,
    pub vintages: Vec<VintageRow>,
}

/// Every report over one panel (and optionally its loan tape).
pub fn build_report(input: &ReportInput) -> CeclResult<ComputationOutput<PanelReport>> {
    let start = Instant::now();
    if input.panel.is_empty() {
        return Err(CeclError::InsufficientData("Panel has no rows".into()));
    }
    let monthly = compute_monthly_ecl(&input.panel, input.default_lgd);
    let by_product = aggregates_by_product(&monthly);
    let overall = overall_aggregates(&by_product);

    let mut warnings = Vec::new();
    if input.loans.is_empty() {
        warnings.push("No loan tape supplied; vintage summary is empty".to_string());
    }

    let report = PanelReport {
        roll_rates: roll_rate_matrix(&input.panel),
        distributions: distribution_summary(&panel_columns(&input.panel)),
        coverage: coverage_by_product(&by_product),
        monthly_overall: monthly_summary_overall(&overall),
        vintages: vintage_summary(&input.loans),
    };
    let elapsed = start.elapsed().as_micros() as u64;
    info!(rows = input.panel.len(), elapsed_us = elapsed, "panel report built");
    Ok(with_metadata(
        "Roll rates, column distributions, ECL coverage and vintage balances",
        &serde_json::json!({
            "percentiles": [10, 50, 90],
            "std": "sample",
            "default_lgd": input.default_lgd,
        }),
        warnings,
        elapsed,
        report,
    ))
}
