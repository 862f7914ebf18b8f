use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Monetary values in exact decimal arithmetic (amortization schedules).
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = Decimal;

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

/// Consumer-credit product line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductType {
    Card,
    Auto,
    Personal,
    Mortgage,
    Heloc,
}

impl ProductType {
    pub const ALL: [ProductType; 5] = [
        ProductType::Card,
        ProductType::Auto,
        ProductType::Personal,
        ProductType::Mortgage,
        ProductType::Heloc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::Card => "card",
            ProductType::Auto => "auto",
            ProductType::Personal => "personal",
            ProductType::Mortgage => "mortgage",
            ProductType::Heloc => "heloc",
        }
    }

    /// Revolving products carry a credit limit and a utilization path.
    pub fn is_revolving(&self) -> bool {
        matches!(self, ProductType::Card | ProductType::Heloc)
    }

    pub fn is_secured(&self) -> bool {
        matches!(
            self,
            ProductType::Auto | ProductType::Mortgage | ProductType::Heloc
        )
    }

    /// Offset added to the base seed for loan origination draws.
    pub fn origination_seed_offset(&self) -> u64 {
        match self {
            ProductType::Card => 7,
            ProductType::Auto => 101,
            ProductType::Personal => 201,
            ProductType::Mortgage => 301,
            ProductType::Heloc => 351,
        }
    }

    /// Offset added to the base seed for the monthly performance stream.
    pub fn simulation_seed_offset(&self) -> u64 {
        match self {
            ProductType::Card => 21,
            ProductType::Auto => 102,
            ProductType::Personal => 202,
            ProductType::Mortgage => 302,
            ProductType::Heloc => 352,
        }
    }

    /// First loan id of the product's id block.
    pub fn loan_id_base(&self) -> u64 {
        match self {
            ProductType::Card => 1,
            ProductType::Auto => 10_000_000,
            ProductType::Personal => 20_000_000,
            ProductType::Mortgage => 30_000_000,
            ProductType::Heloc => 40_000_000,
        }
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProductType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "card" => Ok(ProductType::Card),
            "auto" => Ok(ProductType::Auto),
            "personal" => Ok(ProductType::Personal),
            "mortgage" => Ok(ProductType::Mortgage),
            "heloc" => Ok(ProductType::Heloc),
            other => Err(format!("unknown product '{other}'")),
        }
    }
}

// ---------------------------------------------------------------------------
// Delinquency states
// ---------------------------------------------------------------------------

/// Monthly delinquency bucket. `ChargedOff` is absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DelinquencyState {
    #[serde(rename = "C")]
    Current,
    #[serde(rename = "30")]
    Dpd30,
    #[serde(rename = "60")]
    Dpd60,
    #[serde(rename = "90+")]
    Dpd90Plus,
    #[serde(rename = "CO")]
    ChargedOff,
}

impl DelinquencyState {
    pub const ALL: [DelinquencyState; 5] = [
        DelinquencyState::Current,
        DelinquencyState::Dpd30,
        DelinquencyState::Dpd60,
        DelinquencyState::Dpd90Plus,
        DelinquencyState::ChargedOff,
    ];

    /// Ordinal position in the roll sequence (Current = 0, ChargedOff = 4).
    pub fn index(&self) -> usize {
        match self {
            DelinquencyState::Current => 0,
            DelinquencyState::Dpd30 => 1,
            DelinquencyState::Dpd60 => 2,
            DelinquencyState::Dpd90Plus => 3,
            DelinquencyState::ChargedOff => 4,
        }
    }

    /// Next bucket in the roll sequence; `None` once charged off.
    pub fn next(&self) -> Option<DelinquencyState> {
        match self {
            DelinquencyState::Current => Some(DelinquencyState::Dpd30),
            DelinquencyState::Dpd30 => Some(DelinquencyState::Dpd60),
            DelinquencyState::Dpd60 => Some(DelinquencyState::Dpd90Plus),
            DelinquencyState::Dpd90Plus => Some(DelinquencyState::ChargedOff),
            DelinquencyState::ChargedOff => None,
        }
    }

    pub fn days_past_due(&self) -> u32 {
        match self {
            DelinquencyState::Current => 0,
            DelinquencyState::Dpd30 => 30,
            DelinquencyState::Dpd60 => 60,
            DelinquencyState::Dpd90Plus => 90,
            DelinquencyState::ChargedOff => 120,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DelinquencyState::Current => "C",
            DelinquencyState::Dpd30 => "30",
            DelinquencyState::Dpd60 => "60",
            DelinquencyState::Dpd90Plus => "90+",
            DelinquencyState::ChargedOff => "CO",
        }
    }

    pub fn is_delinquent(&self) -> bool {
        matches!(
            self,
            DelinquencyState::Dpd30 | DelinquencyState::Dpd60 | DelinquencyState::Dpd90Plus
        )
    }
}

impl fmt::Display for DelinquencyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Borrowers and loans
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    Mass,
    Affluent,
    SmallBusiness,
    Private,
    Student,
}

/// Borrower master record. Immutable once generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Borrower {
    pub borrower_id: u64,
    /// Two-letter US state code.
    pub state: String,
    pub zip3: String,
    pub income_annual: f64,
    pub employment_tenure_months: u32,
    pub industry: String,
    pub education: String,
    pub household_size: u32,
    pub fico_baseline: u32,
    pub credit_utilization_baseline: f64,
    pub prior_delinquencies: u32,
    pub bank_tenure_months: u32,
    pub segment: Segment,
}

/// Loan account at origination. Immutable once generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub loan_id: u64,
    pub borrower_id: u64,
    pub product: ProductType,
    pub origination_dt: NaiveDate,
    pub maturity_months: u32,
    /// Annual contract rate.
    pub interest_rate: f64,
    pub orig_balance: f64,
    pub secured_flag: bool,
    #[serde(default)]
    pub ltv_at_orig: Option<f64>,
    #[serde(default)]
    pub risk_grade: Option<String>,
    #[serde(default)]
    pub underwriting_dti: Option<f64>,
    /// Underwriting credit score; required by the simulator.
    #[serde(default)]
    pub underwriting_fico: Option<u32>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub vintage: Option<String>,
    /// Required for revolving products.
    #[serde(default)]
    pub credit_limit: Option<f64>,
}

/// One row of the monthly performance panel, keyed by (loan_id, asof_month).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub asof_month: NaiveDate,
    pub loan_id: u64,
    pub borrower_id: u64,
    pub product: ProductType,
    /// Book balance; on the charge-off month, the exposure written off.
    pub balance_ead: f64,
    pub scheduled_principal: f64,
    pub current_principal: f64,
    pub current_interest: f64,
    /// Revolving products only.
    pub utilization: Option<f64>,
    pub prepay_flag: bool,
    pub days_past_due: u32,
    pub roll_rate_bucket: DelinquencyState,
    pub default_flag: bool,
    pub chargeoff_flag: bool,
    pub recovery_amt: f64,
    pub recovery_lag_m: u32,
    pub cure_flag: bool,
    /// Realized LGD on every charged-off month; `None` otherwise.
    pub loss_given_default: Option<f64>,
    pub effective_rate: f64,
    pub forbearance_flag: bool,
}

// ---------------------------------------------------------------------------
// Output envelope
// ---------------------------------------------------------------------------

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Wrap a floating-point computation result with metadata.
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    envelope(methodology, assumptions, warnings, elapsed_us, "ieee754_f64", result)
}

/// Wrap an exact-decimal computation result with metadata.
pub fn with_decimal_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    envelope(
        methodology,
        assumptions,
        warnings,
        elapsed_us,
        "rust_decimal_128bit",
        result,
    )
}

fn envelope<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    precision: &str,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: precision.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_roll_sequence_ends_at_charge_off() {
        let mut state = DelinquencyState::Current;
        let mut steps = 0;
        while let Some(next) = state.next() {
            assert_eq!(next.index(), state.index() + 1);
            state = next;
            steps += 1;
        }
        assert_eq!(steps, 4);
        assert_eq!(state, DelinquencyState::ChargedOff);
    }

    #[test]
    fn test_state_serializes_to_bucket_label() {
        let json = serde_json::to_string(&DelinquencyState::Dpd90Plus).unwrap();
        assert_eq!(json, "\"90+\"");
        let back: DelinquencyState = serde_json::from_str("\"CO\"").unwrap();
        assert_eq!(back, DelinquencyState::ChargedOff);
    }

    #[test]
    fn test_product_seed_offsets_are_distinct() {
        let mut offsets: Vec<u64> = ProductType::ALL
            .iter()
            .flat_map(|p| [p.origination_seed_offset(), p.simulation_seed_offset()])
            .collect();
        offsets.sort();
        offsets.dedup();
        assert_eq!(offsets.len(), 10);
    }

    #[test]
    fn test_product_parse_round_trip() {
        for p in ProductType::ALL {
            assert_eq!(p.as_str().parse::<ProductType>().unwrap(), p);
        }
        assert!("boat".parse::<ProductType>().is_err());
    }
}
