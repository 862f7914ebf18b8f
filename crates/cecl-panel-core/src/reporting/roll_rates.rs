use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{DelinquencyState, PerformanceRecord};

const N: usize = DelinquencyState::ALL.len();

/// Observed month-over-month bucket transitions.
///
/// Rows and columns follow `DelinquencyState::ALL`. A row with no
/// observations stays all-zero rather than being normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollRateMatrix {
    pub states: Vec<DelinquencyState>,
    pub counts: Vec<Vec<u64>>,
    pub rates: Vec<Vec<f64>>,
}

impl RollRateMatrix {
    pub fn rate(&self, from: DelinquencyState, to: DelinquencyState) -> f64 {
        self.rates[from.index()][to.index()]
    }

    pub fn count(&self, from: DelinquencyState, to: DelinquencyState) -> u64 {
        self.counts[from.index()][to.index()]
    }

    /// Transitions observed out of `from`.
    pub fn row_total(&self, from: DelinquencyState) -> u64 {
        self.counts[from.index()].iter().sum()
    }
}

/// Count `(bucket_t, bucket_t+1)` pairs within each loan and row-normalize.
///
/// Rows are ordered by `(loan_id, asof_month)` first, so input order does not
/// matter. A loan's last observed month contributes no transition.
pub fn roll_rate_matrix(panel: &[PerformanceRecord]) -> RollRateMatrix {
    let mut by_loan: BTreeMap<u64, Vec<(chrono::NaiveDate, DelinquencyState)>> = BTreeMap::new();
    for r in panel {
        by_loan
            .entry(r.loan_id)
            .or_default()
            .push((r.asof_month, r.roll_rate_bucket));
    }

    let mut counts = [[0u64; N]; N];
    for path in by_loan.values_mut() {
        path.sort_by_key(|(m, _)| *m);
        for pair in path.windows(2) {
            counts[pair[0].1.index()][pair[1].1.index()] += 1;
        }
    }

    let rates = counts
        .iter()
        .map(|row| {
            let total: u64 = row.iter().sum();
            row.iter()
                .map(|&c| if total > 0 { c as f64 / total as f64 } else { 0.0 })
                .collect()
        })
        .collect();

    RollRateMatrix {
        states: DelinquencyState::ALL.to_vec(),
        counts: counts.iter().map(|r| r.to_vec()).collect(),
        rates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecl::monthly::tests::row;
    use DelinquencyState::*;

    fn with_bucket(loan_id: u64, month: u32, bucket: DelinquencyState) -> PerformanceRecord {
        let mut r = row(loan_id, month, 100.0, false, None);
        r.roll_rate_bucket = bucket;
        r
    }

    #[test]
    fn test_rows_normalize_and_ignore_input_order() {
        let panel = vec![
            with_bucket(1, 3, Dpd60),
            with_bucket(2, 1, Current),
            with_bucket(1, 1, Current),
            with_bucket(1, 2, Dpd30),
            with_bucket(2, 2, Current),
        ];
        let m = roll_rate_matrix(&panel);
        assert_eq!(m.row_total(Current), 2);
        assert_eq!(m.rate(Current, Current), 0.5);
        assert_eq!(m.rate(Current, Dpd30), 0.5);
        assert_eq!(m.rate(Dpd30, Dpd60), 1.0);
    }

    #[test]
    fn test_unobserved_rows_stay_zero() {
        let m = roll_rate_matrix(&[with_bucket(1, 1, Current)]);
        assert!(m.rates.iter().flatten().all(|r| *r == 0.0));
        assert_eq!(m.states.len(), 5);
    }
}
