use serde_json::Value;
use std::collections::BTreeSet;

use super::ValidationIssue;
use crate::schema::{missing_columns, simulation_required, LOAN_REQUIRED};
use crate::types::{Loan, ProductType};

fn scope(product: ProductType) -> String {
    format!("loans_{product}")
}

/// Column presence, decode, then record-level checks.
pub fn validate_loan_rows(product: ProductType, rows: &[Value]) -> Vec<ValidationIssue> {
    let scope = scope(product);
    let mut required: Vec<&str> = LOAN_REQUIRED.to_vec();
    required.extend(simulation_required(product));
    let missing = missing_columns(rows, &required);
    if !missing.is_empty() {
        let missing: Vec<String> = missing.into_iter().collect();
        return vec![ValidationIssue::error(
            &scope,
            format!("Missing columns: {missing:?}"),
        )];
    }
    let decoded: Result<Vec<Loan>, _> = rows
        .iter()
        .map(|r| serde_json::from_value::<Loan>(r.clone()))
        .collect();
    match decoded {
        Ok(loans) => validate_loans(product, &loans),
        Err(e) => vec![ValidationIssue::error(&scope, format!("Undecodable loan row: {e}"))],
    }
}

/// Range and consistency checks on typed loans.
pub fn validate_loans(product: ProductType, loans: &[Loan]) -> Vec<ValidationIssue> {
    let scope = scope(product);
    let mut issues = Vec::new();
    if loans.is_empty() {
        issues.push(ValidationIssue::warn(&scope, "No loans"));
        return issues;
    }

    let count = |pred: &dyn Fn(&Loan) -> bool| loans.iter().filter(|l| pred(l)).count();

    let wrong_product = count(&|l| l.product != product);
    if wrong_product > 0 {
        issues.push(ValidationIssue::error(
            &scope,
            format!("{wrong_product} loans belong to another product"),
        ));
    }
    let negative_balance = count(&|l| l.orig_balance < 0.0);
    if negative_balance > 0 {
        issues.push(ValidationIssue::error(
            &scope,
            format!("Negative orig_balance found ({negative_balance} loans)"),
        ));
    }
    let negative_rate = count(&|l| l.interest_rate < 0.0);
    if negative_rate > 0 {
        issues.push(ValidationIssue::error(
            &scope,
            format!("Negative interest_rate found ({negative_rate} loans)"),
        ));
    }
    if !product.is_revolving() {
        let zero_term = count(&|l| l.maturity_months == 0);
        if zero_term > 0 {
            issues.push(ValidationIssue::error(
                &scope,
                format!("Zero maturity_months on {zero_term} amortizing loans"),
            ));
        }
    } else {
        let over_limit = count(&|l| matches!(l.credit_limit, Some(c) if l.orig_balance > c));
        if over_limit > 0 {
            issues.push(ValidationIssue::warn(
                &scope,
                format!("orig_balance exceeds credit_limit on {over_limit} loans"),
            ));
        }
    }
    let off_scale = count(&|l| matches!(l.underwriting_fico, Some(f) if !(300..=850).contains(&f)));
    if off_scale > 0 {
        issues.push(ValidationIssue::warn(
            &scope,
            format!("underwriting_fico outside 300-850 on {off_scale} loans"),
        ));
    }

    let mut seen = BTreeSet::new();
    let duplicates = loans.iter().filter(|l| !seen.insert(l.loan_id)).count();
    if duplicates > 0 {
        issues.push(ValidationIssue::error(
            &scope,
            format!("{duplicates} duplicate loan_id values"),
        ));
    }
    issues
}
