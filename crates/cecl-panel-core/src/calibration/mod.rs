//! Curve calibration: rescale modeled monthly losses so the implied default
//! hazards match an external cumulative target curve, per product.

pub mod curves;
pub mod month_index;
pub mod scaling;

pub use curves::{
    compute_scalers, cumulative_from_hazards, hazards_from_cumulative, SCALER_CAP, SCALER_FLOOR,
};
pub use month_index::LoanMonthIndex;
pub use scaling::{apply_scaling, model_hazards, ScaledEclRecord, ScalingFactors};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{info, warn};

use crate::ecl::{compute_monthly_ecl, overall_aggregates, sum_by_month, EclRecord, PortfolioAggregate, DEFAULT_LGD};
use crate::error::CeclError;
use crate::types::{with_metadata, ComputationOutput, PerformanceRecord, ProductType};
use crate::CeclResult;

// ---------------------------------------------------------------------------
// Input / Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationInput {
    pub panel: Vec<PerformanceRecord>,
    /// Cumulative default targets, one value per loan-relative month.
    pub targets: BTreeMap<ProductType, Vec<f64>>,
    /// Month-index cutoff; defaults to each curve's length.
    #[serde(default)]
    pub months: Option<usize>,
    #[serde(default = "default_lgd")]
    pub default_lgd: f64,
}

fn default_lgd() -> f64 {
    DEFAULT_LGD
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HazardInput {
    pub cumulative: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductCalibration {
    pub product: ProductType,
    pub months: usize,
    pub target_cumulative: Vec<f64>,
    pub target_hazards: Vec<f64>,
    pub model_hazards: Vec<f64>,
    pub scalers: ScalingFactors,
    /// Periods whose scaler sits on a clamp bound.
    pub clamped_periods: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationOutput {
    pub products: Vec<ProductCalibration>,
    pub scaled: Vec<ScaledEclRecord>,
    /// Monthly sums of the scaled loss, per product.
    pub scaled_by_product: Vec<PortfolioAggregate>,
    pub scaled_overall: Vec<PortfolioAggregate>,
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

fn validate_curve(product: ProductType, curve: &[f64]) -> CeclResult<()> {
    if curve.is_empty() {
        return Err(CeclError::InvalidInput {
            field: format!("targets.{product}"),
            reason: "Target curve is empty".into(),
        });
    }
    if let Some(bad) = curve.iter().find(|v| !(0.0..=1.0).contains(*v)) {
        return Err(CeclError::InvalidInput {
            field: format!("targets.{product}"),
            reason: format!("Cumulative value {bad} outside [0, 1]"),
        });
    }
    Ok(())
}

/// Per-period hazards for a standalone cumulative curve.
pub fn hazards_for(input: &HazardInput) -> CeclResult<ComputationOutput<Vec<f64>>> {
    let start = Instant::now();
    if let Some(bad) = input.cumulative.iter().find(|v| !v.is_finite()) {
        return Err(CeclError::InvalidInput {
            field: "cumulative".into(),
            reason: format!("non-finite value {bad}"),
        });
    }
    let hazards = hazards_from_cumulative(&input.cumulative);
    Ok(with_metadata(
        "Survival decomposition of a cumulative default curve",
        &serde_json::json!({ "epsilon": crate::numeric::EPSILON }),
        Vec::new(),
        start.elapsed().as_micros() as u64,
        hazards,
    ))
}

/// Calibrate every product that has a target curve.
pub fn calibrate_products(input: &CalibrationInput) -> CeclResult<ComputationOutput<CalibrationOutput>> {
    let start = Instant::now();
    if input.targets.is_empty() {
        return Err(CeclError::InsufficientData("No target curves supplied".into()));
    }
    for (product, curve) in &input.targets {
        validate_curve(*product, curve)?;
    }

    let monthly = compute_monthly_ecl(&input.panel, input.default_lgd);
    let mut warnings = Vec::new();
    let mut products = Vec::new();
    let mut scaled = Vec::new();

    for (&product, curve) in &input.targets {
        if curve.windows(2).any(|w| w[1] < w[0]) {
            warnings.push(format!(
                "{product}: target curve decreases; negative increments treated as zero"
            ));
        }
        let rows: Vec<&EclRecord> = monthly.iter().filter(|r| r.record.product == product).collect();
        if rows.is_empty() {
            warn!(product = %product, "target supplied for a product absent from the panel");
            warnings.push(format!("{product}: no panel rows; skipped"));
            continue;
        }

        let months = input.months.unwrap_or(curve.len());
        let model = model_hazards(&rows, curve.len());
        let factors = compute_scalers(&model, curve)?;
        let clamped_periods = factors
            .iter()
            .filter(|s| **s <= SCALER_FLOOR || **s >= SCALER_CAP)
            .count();
        let scalers = ScalingFactors::new(factors);
        scaled.extend(apply_scaling(&rows, &scalers, months));

        info!(product = %product, months, clamped_periods, "calibrated product curve");
        products.push(ProductCalibration {
            product,
            months,
            target_cumulative: curve.clone(),
            target_hazards: hazards_from_cumulative(curve),
            model_hazards: model,
            scalers,
            clamped_periods,
        });
    }

    let scaled_by_product = sum_by_month(
        scaled.iter().map(|r| {
            (
                r.ecl.record.asof_month,
                r.ecl.record.product,
                r.monthly_ecl_scaled,
                r.ecl.ead_t,
            )
        }),
        true,
    );
    let scaled_overall = overall_aggregates(&scaled_by_product);

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "scaler_bounds": [SCALER_FLOOR, SCALER_CAP],
        "month_cutoff": input.months,
        "default_lgd": input.default_lgd,
    });
    Ok(with_metadata(
        "Hazard-ratio calibration of monthly ECL to cumulative default targets",
        &assumptions,
        warnings,
        elapsed,
        CalibrationOutput {
            products,
            scaled,
            scaled_by_product,
            scaled_overall,
        },
    ))
}
