//! Dataset validation. Range violations and broken invariants are reported
//! as issues, never corrected and never raised as errors.

pub mod loans;
pub mod panel;

pub use loans::{validate_loan_rows, validate_loans};
pub use panel::{validate_panel, validate_panel_rows};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;
use tracing::info;

use crate::types::{with_metadata, ComputationOutput, ProductType};
use crate::CeclResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IssueLevel {
    Error,
    Warn,
}

impl fmt::Display for IssueLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueLevel::Error => f.write_str("ERROR"),
            IssueLevel::Warn => f.write_str("WARN"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub level: IssueLevel,
    /// e.g. `loans_card`, `panel_mortgage`.
    pub scope: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn error(scope: &str, message: impl Into<String>) -> Self {
        ValidationIssue {
            level: IssueLevel::Error,
            scope: scope.to_string(),
            message: message.into(),
        }
    }

    pub fn warn(scope: &str, message: impl Into<String>) -> Self {
        ValidationIssue {
            level: IssueLevel::Warn,
            scope: scope.to_string(),
            message: message.into(),
        }
    }
}

/// Raw record batches keyed by product, as read from disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationInput {
    #[serde(default)]
    pub loans: BTreeMap<ProductType, Vec<Value>>,
    #[serde(default)]
    pub panels: BTreeMap<ProductType, Vec<Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
    pub errors: usize,
    pub warnings: usize,
    pub passed: bool,
}

impl ValidationReport {
    pub fn from_issues(issues: Vec<ValidationIssue>) -> Self {
        let errors = issues.iter().filter(|i| i.level == IssueLevel::Error).count();
        let warnings = issues.len() - errors;
        ValidationReport {
            issues,
            errors,
            warnings,
            passed: errors == 0,
        }
    }
}

/// Validate every loan batch, then every panel.
pub fn validate_dataset(input: &ValidationInput) -> CeclResult<ComputationOutput<ValidationReport>> {
    let start = Instant::now();
    let mut issues = Vec::new();
    for (product, rows) in &input.loans {
        issues.extend(validate_loan_rows(*product, rows));
    }
    for (product, rows) in &input.panels {
        issues.extend(validate_panel_rows(*product, rows));
    }
    let report = ValidationReport::from_issues(issues);
    let elapsed = start.elapsed().as_micros() as u64;
    info!(
        errors = report.errors,
        warnings = report.warnings,
        elapsed_us = elapsed,
        "dataset validation complete"
    );
    Ok(with_metadata(
        "Schema, range and delinquency state-machine checks",
        &serde_json::json!({
            "loan_batches": input.loans.len(),
            "panel_batches": input.panels.len(),
        }),
        Vec::new(),
        elapsed,
        report,
    ))
}
