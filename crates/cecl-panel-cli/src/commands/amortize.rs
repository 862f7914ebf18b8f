use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use cecl_panel_core::time_value::{amortization_schedule, AmortizationInput};

use crate::input;

/// Arguments for a level-payment amortization schedule
#[derive(Args)]
pub struct AmortizeArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Original principal
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual rate as a decimal (0.12 = 12%)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Term in months
    #[arg(long)]
    pub term: Option<u32>,
}

pub fn run_amortize(args: AmortizeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let amort_input: AmortizationInput = if let Some(i) = input::load(args.input.as_deref())? {
        i
    } else {
        AmortizationInput {
            principal: args.principal
                .ok_or("--principal is required (or provide --input)")?,
            annual_rate: args.rate
                .ok_or("--rate is required (or provide --input)")?,
            term_months: args.term
                .ok_or("--term is required (or provide --input)")?,
        }
    };
    let result = amortization_schedule(&amort_input)?;
    Ok(serde_json::to_value(result)?)
}
