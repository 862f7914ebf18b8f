use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::BTreeMap;

use crate::numeric::percentile_sorted;
use crate::types::PerformanceRecord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionSummary {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; `None` below two observations.
    pub std: Option<f64>,
    pub p10: f64,
    pub p50: f64,
    pub p90: f64,
}

/// Summaries of each named column; non-finite values are ignored and empty
/// columns are omitted.
pub fn distribution_summary(columns: &BTreeMap<String, Vec<f64>>) -> Vec<DistributionSummary> {
    columns
        .iter()
        .filter_map(|(name, values)| {
            let mut v: Vec<f64> = values.iter().copied().filter(|x| x.is_finite()).collect();
            if v.is_empty() {
                return None;
            }
            v.sort_by(|a, b| a.total_cmp(b));
            let std = (v.len() > 1).then(|| v.iter().std_dev());
            Some(DistributionSummary {
                column: name.clone(),
                count: v.len(),
                mean: v.iter().mean(),
                std,
                p10: percentile_sorted(&v, 10.0),
                p50: percentile_sorted(&v, 50.0),
                p90: percentile_sorted(&v, 90.0),
            })
        })
        .collect()
}

/// Numeric panel columns worth summarizing.
pub fn panel_columns(panel: &[PerformanceRecord]) -> BTreeMap<String, Vec<f64>> {
    let mut cols: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    let mut push = |name: &str, v: f64| cols.entry(name.to_string()).or_default().push(v);
    for r in panel {
        push("balance_ead", r.balance_ead);
        push("current_interest", r.current_interest);
        push("days_past_due", r.days_past_due as f64);
        push("effective_rate", r.effective_rate);
        push("recovery_amt", r.recovery_amt);
        if let Some(u) = r.utilization {
            push("utilization", u);
        }
        if let Some(l) = r.loss_given_default {
            push("loss_given_default", l);
        }
    }
    cols
}
