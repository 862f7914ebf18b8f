//! Expected-loss engine: PD x LGD x EAD over a monthly panel.

pub mod aggregate;
pub mod monthly;

pub use aggregate::{
    aggregates_by_product, compute_portfolio_aggregates, overall_aggregates, sum_by_month,
    PortfolioAggregate,
};
pub use monthly::{compute_lifetime_ecl, compute_monthly_ecl, EclRecord, LoanLifetimeEcl, DEFAULT_LGD};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;
use tracing::info;

use crate::error::CeclError;
use crate::schema::panel_from_json;
use crate::types::{with_metadata, ComputationOutput, PerformanceRecord};
use crate::CeclResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CeclInput {
    /// Rows from one or more product panels.
    pub panel: Vec<PerformanceRecord>,
    #[serde(default = "default_lgd")]
    pub default_lgd: f64,
}

fn default_lgd() -> f64 {
    DEFAULT_LGD
}

impl CeclInput {
    /// Decode `{"panel": [...], "default_lgd": ...}` through the panel schema gate.
    pub fn from_json(value: Value) -> CeclResult<Self> {
        let mut map = match value {
            Value::Object(map) => map,
            Value::Array(rows) => {
                return Ok(CeclInput {
                    panel: panel_from_json(rows)?,
                    default_lgd: DEFAULT_LGD,
                })
            }
            _ => return Err(CeclError::schema("cecl input", ["panel".to_string()])),
        };
        let rows = match map.remove("panel") {
            Some(Value::Array(rows)) => rows,
            _ => return Err(CeclError::schema("cecl input", ["panel".to_string()])),
        };
        let default_lgd = match map.remove("default_lgd") {
            Some(v) => serde_json::from_value(v)?,
            None => DEFAULT_LGD,
        };
        Ok(CeclInput {
            panel: panel_from_json(rows)?,
            default_lgd,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CeclOutput {
    pub monthly: Vec<EclRecord>,
    pub lifetime: Vec<LoanLifetimeEcl>,
    pub by_product: Vec<PortfolioAggregate>,
    pub overall: Vec<PortfolioAggregate>,
    pub total_ecl: f64,
}

/// Monthly, lifetime, per-product and overall expected loss for a panel.
pub fn run_cecl(input: &CeclInput) -> CeclResult<ComputationOutput<CeclOutput>> {
    let start = Instant::now();
    if input.panel.is_empty() {
        return Err(CeclError::InsufficientData("Panel has no rows".into()));
    }
    if !(0.0..=1.0).contains(&input.default_lgd) {
        return Err(CeclError::InvalidInput {
            field: "default_lgd".into(),
            reason: "Must lie in [0, 1]".into(),
        });
    }

    let monthly = compute_monthly_ecl(&input.panel, input.default_lgd);
    let lifetime = compute_lifetime_ecl(&monthly);
    let by_product = aggregates_by_product(&monthly);
    let overall = overall_aggregates(&by_product);
    let total_ecl = lifetime.iter().map(|l| l.lifetime_ecl).sum();

    let elapsed = start.elapsed().as_micros() as u64;
    info!(
        rows = monthly.len(),
        loans = lifetime.len(),
        total_ecl,
        elapsed_us = elapsed,
        "CECL run complete"
    );

    let assumptions = serde_json::json!({
        "pd": "point-in-time default flag",
        "default_lgd": input.default_lgd,
    });
    Ok(with_metadata(
        "CECL monthly ECL = PD x LGD x EAD; lifetime = per-loan sum",
        &assumptions,
        Vec::new(),
        elapsed,
        CeclOutput {
            monthly,
            lifetime,
            by_product,
            overall,
            total_ecl,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_reports_missing_panel_columns() {
        let value = json!({"panel": [{"loan_id": 1, "asof_month": "2020-01-01", "balance_ead": 10.0}]});
        match CeclInput::from_json(value) {
            Err(CeclError::Schema { missing, .. }) => {
                for col in ["default_flag", "loss_given_default", "borrower_id", "product"] {
                    assert!(missing.contains(&col.to_string()), "{col} not reported");
                }
                assert!(!missing.contains(&"balance_ead".to_string()));
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_panel_rejected() {
        let input = CeclInput {
            panel: vec![],
            default_lgd: DEFAULT_LGD,
        };
        assert!(matches!(run_cecl(&input), Err(CeclError::InsufficientData(_))));
    }
}
