//! Column-presence checks for record batches arriving as JSON.
//!
//! Typed records cannot be missing a field once deserialized, so the schema
//! gate sits in front of deserialization: a batch is rejected with the full
//! missing set before any computation starts.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeSet;

use crate::error::CeclError;
use crate::types::{Loan, PerformanceRecord, ProductType};
use crate::CeclResult;

/// Columns every loan batch must carry.
pub const LOAN_REQUIRED: &[&str] = &[
    "loan_id",
    "borrower_id",
    "product",
    "origination_dt",
    "maturity_months",
    "interest_rate",
    "orig_balance",
    "secured_flag",
];

/// Columns the simulator additionally needs, per product family.
pub fn simulation_required(product: ProductType) -> Vec<&'static str> {
    let mut cols = vec!["underwriting_fico", "interest_rate", "orig_balance"];
    if product.is_revolving() {
        cols.push("credit_limit");
    } else {
        cols.push("maturity_months");
    }
    cols
}

/// Columns the expected-loss engine reads from a panel.
pub const ECL_COLUMNS: &[&str] = &[
    "asof_month",
    "loan_id",
    "balance_ead",
    "default_flag",
    "loss_given_default",
];

/// Every column a panel row needs to decode. Only `utilization` may be
/// absent; `loss_given_default` must be present but may be null.
pub const PANEL_REQUIRED: &[&str] = &[
    "asof_month",
    "loan_id",
    "borrower_id",
    "product",
    "balance_ead",
    "scheduled_principal",
    "current_principal",
    "current_interest",
    "prepay_flag",
    "days_past_due",
    "roll_rate_bucket",
    "default_flag",
    "chargeoff_flag",
    "recovery_amt",
    "recovery_lag_m",
    "cure_flag",
    "loss_given_default",
    "effective_rate",
    "forbearance_flag",
];

/// Collect every required column absent (or null) in at least one row.
pub fn missing_columns(rows: &[Value], required: &[&str]) -> BTreeSet<String> {
    let mut missing = BTreeSet::new();
    for row in rows {
        match row.as_object() {
            Some(map) => {
                for col in required {
                    let present = map.get(*col).map(|v| !v.is_null()).unwrap_or(false);
                    if !present {
                        missing.insert((*col).to_string());
                    }
                }
            }
            None => {
                missing.extend(required.iter().map(|c| c.to_string()));
            }
        }
    }
    missing
}

/// Fail with a schema error naming the missing set.
pub fn require_columns(rows: &[Value], required: &[&str], context: &str) -> CeclResult<()> {
    let missing = missing_columns(rows, required);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(CeclError::schema(context, missing))
    }
}

fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> CeclResult<Vec<T>> {
    rows.into_iter()
        .map(|r| serde_json::from_value(r).map_err(CeclError::from))
        .collect()
}

/// Schema-checked loan batch decode.
pub fn loans_from_json(rows: Vec<Value>) -> CeclResult<Vec<Loan>> {
    require_columns(&rows, LOAN_REQUIRED, "loans")?;
    decode_rows(rows)
}

/// Schema-checked panel decode.
///
/// `loss_given_default` must be present as a column but may be null per row.
pub fn panel_from_json(rows: Vec<Value>) -> CeclResult<Vec<PerformanceRecord>> {
    let mut missing = BTreeSet::new();
    for row in &rows {
        match row.as_object() {
            Some(map) => {
                for col in PANEL_REQUIRED {
                    let present = match map.get(*col) {
                        Some(v) => *col == "loss_given_default" || !v.is_null(),
                        None => false,
                    };
                    if !present {
                        missing.insert((*col).to_string());
                    }
                }
            }
            None => missing.extend(PANEL_REQUIRED.iter().map(|c| c.to_string())),
        }
    }
    if !missing.is_empty() {
        return Err(CeclError::schema("panel", missing));
    }
    decode_rows(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_columns_unions_across_rows() {
        let rows = vec![json!({"a": 1, "b": 2}), json!({"a": 1, "c": null})];
        let missing = missing_columns(&rows, &["a", "b", "c"]);
        assert_eq!(
            missing.into_iter().collect::<Vec<_>>(),
            vec!["b".to_string(), "c".to_string()]
        );
    }

    #[test]
    fn test_panel_schema_error_names_missing_set() {
        let rows = vec![json!({"loan_id": 1, "asof_month": "2020-01-01"})];
        match panel_from_json(rows) {
            Err(CeclError::Schema { context, missing }) => {
                assert_eq!(context, "panel");
                let mut expected: Vec<String> = PANEL_REQUIRED
                    .iter()
                    .filter(|c| !matches!(**c, "loan_id" | "asof_month"))
                    .map(|c| c.to_string())
                    .collect();
                expected.sort();
                assert_eq!(missing, expected);
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn test_ecl_columns_alone_fail_schema_not_decode() {
        let rows = vec![json!({
            "asof_month": "2020-01-01",
            "loan_id": 1,
            "balance_ead": 100.0,
            "default_flag": true,
            "loss_given_default": null
        })];
        match panel_from_json(rows) {
            Err(CeclError::Schema { missing, .. }) => {
                assert!(missing.contains(&"borrower_id".to_string()));
                assert!(missing.contains(&"product".to_string()));
                assert!(ECL_COLUMNS.iter().all(|c| !missing.contains(&c.to_string())));
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn test_full_panel_row_decodes_without_utilization() {
        let rows = vec![json!({
            "asof_month": "2020-01-01",
            "loan_id": 1,
            "borrower_id": 1,
            "product": "auto",
            "balance_ead": 100.0,
            "scheduled_principal": 5.0,
            "current_principal": 5.0,
            "current_interest": 0.5,
            "prepay_flag": false,
            "days_past_due": 0,
            "roll_rate_bucket": "C",
            "default_flag": false,
            "chargeoff_flag": false,
            "recovery_amt": 0.0,
            "recovery_lag_m": 0,
            "cure_flag": false,
            "loss_given_default": null,
            "effective_rate": 0.06,
            "forbearance_flag": false
        })];
        let panel = panel_from_json(rows).unwrap();
        assert_eq!(panel.len(), 1);
        assert_eq!(panel[0].utilization, None);
    }

    #[test]
    fn test_simulation_required_depends_on_product_family() {
        assert!(simulation_required(ProductType::Card).contains(&"credit_limit"));
        assert!(simulation_required(ProductType::Mortgage).contains(&"maturity_months"));
        assert!(!simulation_required(ProductType::Auto).contains(&"credit_limit"));
    }
}
