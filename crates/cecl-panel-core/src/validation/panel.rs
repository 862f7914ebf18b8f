use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

use super::ValidationIssue;
use crate::calendar::add_months;
use crate::types::{DelinquencyState, PerformanceRecord, ProductType};

/// Columns a panel must carry before any record-level check runs.
pub const PANEL_VALIDATION_REQUIRED: &[&str] = &[
    "asof_month",
    "loan_id",
    "balance_ead",
    "default_flag",
    "chargeoff_flag",
];

/// Null share of `balance_ead` above which a warning is raised.
pub const MAX_NULL_BALANCE_RATIO: f64 = 0.01;

fn scope(product: ProductType) -> String {
    format!("panel_{product}")
}

/// Column presence, null ratio, decode, then record-level checks.
///
/// Rows with a null `balance_ead` are counted toward the null ratio and
/// excluded from the typed checks.
pub fn validate_panel_rows(product: ProductType, rows: &[Value]) -> Vec<ValidationIssue> {
    let scope = scope(product);
    let mut absent = BTreeSet::new();
    for row in rows {
        for col in PANEL_VALIDATION_REQUIRED {
            let has = row.as_object().map(|m| m.contains_key(*col)).unwrap_or(false);
            if !has {
                absent.insert(*col);
            }
        }
    }
    if !absent.is_empty() {
        return vec![ValidationIssue::error(
            &scope,
            format!("Missing columns: {:?}", absent.into_iter().collect::<Vec<_>>()),
        )];
    }

    let mut issues = Vec::new();
    let (nulls, present): (Vec<&Value>, Vec<&Value>) = rows
        .iter()
        .partition(|r| r.get("balance_ead").map(Value::is_null).unwrap_or(true));
    if !rows.is_empty() {
        let ratio = nulls.len() as f64 / rows.len() as f64;
        if ratio > MAX_NULL_BALANCE_RATIO {
            issues.push(ValidationIssue::warn(
                &scope,
                format!("balance_ead null ratio {:.2}%", ratio * 100.0),
            ));
        }
    }

    let decoded: Result<Vec<PerformanceRecord>, _> = present
        .into_iter()
        .map(|r| serde_json::from_value::<PerformanceRecord>(r.clone()))
        .collect();
    match decoded {
        Ok(panel) => issues.extend(validate_panel(product, &panel)),
        Err(e) => issues.push(ValidationIssue::error(
            &scope,
            format!("Undecodable panel row: {e}"),
        )),
    }
    issues
}

#[derive(Default)]
struct Tally {
    wrong_product: usize,
    negative_balance: usize,
    duplicate_rows: usize,
    left_charge_off: usize,
    skipped_bucket: usize,
    dpd_mismatch: usize,
    chargeoff_flag_mismatch: usize,
    default_not_on_entry: usize,
    missing_lgd: usize,
    stray_lgd: usize,
    lgd_out_of_range: usize,
    negative_recovery: usize,
    utilization_mismatch: usize,
    month_gaps: usize,
}

/// Range checks plus the delinquency state machine, walked per loan in
/// month order.
pub fn validate_panel(product: ProductType, panel: &[PerformanceRecord]) -> Vec<ValidationIssue> {
    let scope = scope(product);
    if panel.is_empty() {
        return vec![ValidationIssue::warn(&scope, "No panel rows")];
    }

    let mut t = Tally::default();
    let mut by_loan: BTreeMap<u64, Vec<&PerformanceRecord>> = BTreeMap::new();
    for r in panel {
        if r.product != product {
            t.wrong_product += 1;
        }
        if r.balance_ead < 0.0 {
            t.negative_balance += 1;
        }
        if r.days_past_due != r.roll_rate_bucket.days_past_due() {
            t.dpd_mismatch += 1;
        }
        if r.chargeoff_flag != (r.roll_rate_bucket == DelinquencyState::ChargedOff) {
            t.chargeoff_flag_mismatch += 1;
        }
        match (r.roll_rate_bucket, r.loss_given_default) {
            (DelinquencyState::ChargedOff, None) => t.missing_lgd += 1,
            (DelinquencyState::ChargedOff, Some(l)) if !(0.0..=1.0).contains(&l) => {
                t.lgd_out_of_range += 1
            }
            (s, Some(_)) if s != DelinquencyState::ChargedOff => t.stray_lgd += 1,
            _ => {}
        }
        if r.recovery_amt < 0.0 {
            t.negative_recovery += 1;
        }
        if r.utilization.is_some() != product.is_revolving() {
            t.utilization_mismatch += 1;
        }
        by_loan.entry(r.loan_id).or_default().push(r);
    }

    for rows in by_loan.values_mut() {
        rows.sort_by_key(|r| r.asof_month);
        if rows[0].default_flag {
            // A loan first observed on its charge-off month is fine only if
            // the row is charged off.
            if rows[0].roll_rate_bucket != DelinquencyState::ChargedOff {
                t.default_not_on_entry += 1;
            }
        }
        for pair in rows.windows(2) {
            let (prev, next) = (pair[0], pair[1]);
            if prev.asof_month == next.asof_month {
                t.duplicate_rows += 1;
                continue;
            }
            if add_months(prev.asof_month, 1).ok() != Some(next.asof_month) {
                t.month_gaps += 1;
            }
            let (from, to) = (prev.roll_rate_bucket, next.roll_rate_bucket);
            if from == DelinquencyState::ChargedOff && to != DelinquencyState::ChargedOff {
                t.left_charge_off += 1;
            }
            if to.index() > from.index() + 1 {
                t.skipped_bucket += 1;
            }
            let entered = to == DelinquencyState::ChargedOff && from != DelinquencyState::ChargedOff;
            if next.default_flag != entered {
                t.default_not_on_entry += 1;
            }
        }
    }

    let checks: [(usize, bool, &str); 14] = [
        (t.wrong_product, true, "rows belong to another product"),
        (t.negative_balance, true, "rows with negative balance_ead"),
        (t.duplicate_rows, true, "duplicate (loan_id, asof_month) rows"),
        (t.left_charge_off, true, "transitions out of charge-off"),
        (t.skipped_bucket, true, "transitions skipping a delinquency bucket"),
        (t.dpd_mismatch, true, "rows whose days_past_due disagrees with the bucket"),
        (t.chargeoff_flag_mismatch, true, "rows whose chargeoff_flag disagrees with the bucket"),
        (t.lgd_out_of_range, true, "loss_given_default values outside [0, 1]"),
        (t.negative_recovery, true, "rows with negative recovery_amt"),
        (t.default_not_on_entry, false, "default_flag values not on charge-off entry"),
        (t.missing_lgd, false, "charged-off rows without loss_given_default"),
        (t.stray_lgd, false, "non-charged-off rows carrying loss_given_default"),
        (t.utilization_mismatch, false, "rows with utilization inconsistent with the product"),
        (t.month_gaps, false, "gaps between consecutive loan months"),
    ];
    checks
        .iter()
        .filter(|(n, _, _)| *n > 0)
        .map(|(n, is_error, what)| {
            let msg = format!("{n} {what}");
            if *is_error {
                ValidationIssue::error(&scope, msg)
            } else {
                ValidationIssue::warn(&scope, msg)
            }
        })
        .collect()
}
