use serde::{Deserialize, Serialize};

use super::month_index::LoanMonthIndex;
use crate::ecl::EclRecord;

/// Scalers indexed by loan-relative month.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScalingFactors {
    pub factors: Vec<f64>,
}

impl ScalingFactors {
    pub fn new(factors: Vec<f64>) -> Self {
        ScalingFactors { factors }
    }

    /// 1.0 past the end of the curve.
    pub fn factor_at(&self, month_idx: usize) -> f64 {
        self.factors.get(month_idx).copied().unwrap_or(1.0)
    }
}

/// An ECL row with its loan-relative month and calibrated loss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaledEclRecord {
    #[serde(flatten)]
    pub ecl: EclRecord,
    pub month_idx: usize,
    pub scale_factor: f64,
    pub monthly_ecl_scaled: f64,
}

fn index_of(monthly: &[&EclRecord]) -> LoanMonthIndex {
    LoanMonthIndex::build(
        monthly
            .iter()
            .map(|r| (r.record.loan_id, r.record.asof_month)),
    )
}

/// Mean default occurrence per loan-relative month over `[0, months)`.
///
/// Months with no observations contribute 0.
pub fn model_hazards(monthly: &[&EclRecord], months: usize) -> Vec<f64> {
    let index = index_of(monthly);
    let mut defaults = vec![0.0; months];
    let mut counts = vec![0usize; months];
    for r in monthly {
        if let Some(idx) = index.month_idx(r.record.loan_id, r.record.asof_month) {
            if idx < months {
                counts[idx] += 1;
                if r.record.default_flag {
                    defaults[idx] += 1.0;
                }
            }
        }
    }
    defaults
        .iter()
        .zip(&counts)
        .map(|(d, &n)| if n > 0 { d / n as f64 } else { 0.0 })
        .collect()
}

/// Scale each row's monthly ECL by its loan-relative month factor.
///
/// Rows at or beyond `months` are dropped; output is ordered by
/// `(loan_id, asof_month)` and keeps the unscaled ECL alongside.
pub fn apply_scaling(
    monthly: &[&EclRecord],
    scalers: &ScalingFactors,
    months: usize,
) -> Vec<ScaledEclRecord> {
    let index = index_of(monthly);
    let mut out: Vec<ScaledEclRecord> = monthly
        .iter()
        .filter_map(|r| {
            let idx = index.month_idx(r.record.loan_id, r.record.asof_month)?;
            if idx >= months {
                return None;
            }
            let scale_factor = scalers.factor_at(idx);
            Some(ScaledEclRecord {
                ecl: (*r).clone(),
                month_idx: idx,
                scale_factor,
                monthly_ecl_scaled: r.monthly_ecl * scale_factor,
            })
        })
        .collect();
    out.sort_by_key(|r| (r.ecl.record.loan_id, r.ecl.record.asof_month));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecl::monthly::tests::row;
    use crate::ecl::{compute_monthly_ecl, DEFAULT_LGD};

    #[test]
    fn test_model_hazards_average_over_loans() {
        // Loan 1 defaults in its second month, loan 2 in its first.
        let panel = vec![
            row(1, 3, 100.0, false, None),
            row(1, 4, 100.0, true, Some(0.5)),
            row(2, 4, 100.0, true, Some(0.5)),
            row(2, 5, 0.0, false, None),
        ];
        let m = compute_monthly_ecl(&panel, DEFAULT_LGD);
        let refs: Vec<&EclRecord> = m.iter().collect();
        assert_eq!(model_hazards(&refs, 4), vec![0.5, 0.5, 0.0, 0.0]);
    }

    #[test]
    fn test_apply_scaling_keeps_unscaled_and_cuts_at_months() {
        let panel = vec![
            row(1, 3, 100.0, true, Some(0.5)),
            row(1, 1, 100.0, true, Some(0.5)),
            row(1, 2, 100.0, true, Some(0.5)),
        ];
        let m = compute_monthly_ecl(&panel, DEFAULT_LGD);
        let refs: Vec<&EclRecord> = m.iter().collect();
        let scaled = apply_scaling(&refs, &ScalingFactors::new(vec![2.0]), 2);
        assert_eq!(scaled.len(), 2);
        assert_eq!(scaled[0].month_idx, 0);
        assert_eq!(scaled[0].scale_factor, 2.0);
        assert_eq!(scaled[1].scale_factor, 1.0);
        assert_eq!(scaled[0].ecl.monthly_ecl, 50.0);
        assert_eq!(scaled[0].monthly_ecl_scaled, 100.0);
    }
}
