use chrono::NaiveDate;
use clap::Args;
use serde_json::Value;

use cecl_panel_core::calendar::default_start_month;
use cecl_panel_core::schema::loans_from_json;
use cecl_panel_core::simulation::{simulate_panel, SimulationInput};
use cecl_panel_core::ProductType;

use crate::input;

/// Arguments for single-product panel simulation
#[derive(Args)]
pub struct SimulateArgs {
    /// Path to JSON/YAML SimulationInput (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Product of the loan batch
    #[arg(long)]
    pub product: Option<ProductType>,

    /// Loan batch file (array of loans)
    #[arg(long)]
    pub loans: Option<String>,

    /// Macro series file
    #[arg(long)]
    pub macro_series: Option<String>,

    /// First simulated month (YYYY-MM-DD)
    #[arg(long)]
    pub start_month: Option<NaiveDate>,

    /// Horizon in months
    #[arg(long, default_value_t = 12)]
    pub months: usize,

    /// Random seed
    #[arg(long, default_value_t = cecl_panel_core::DEFAULT_SEED)]
    pub seed: u64,
}

pub fn run_simulate(args: SimulateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let sim_input: SimulationInput = if let Some(i) = input::load(args.input.as_deref())? {
        i
    } else {
        let loans_path = args.loans.ok_or("--loans is required (or provide --input)")?;
        let macro_path = args
            .macro_series
            .ok_or("--macro-series is required (or provide --input)")?;
        let rows = match input::file::read_config_value(&loans_path)? {
            Value::Array(rows) => rows,
            _ => return Err(format!("'{loans_path}' must hold an array of loans").into()),
        };
        let loans = loans_from_json(rows)?;
        let product = match args.product {
            Some(p) => p,
            None => loans
                .first()
                .map(|l| l.product)
                .ok_or("--product is required for an empty loan file")?,
        };
        SimulationInput {
            product,
            loans,
            macro_series: input::file::read_config(&macro_path)?,
            start_month: args.start_month.unwrap_or_else(default_start_month),
            horizon_months: args.months,
            seed: args.seed,
            unemployment_baseline: None,
        }
    };
    let result = simulate_panel(&sim_input)?;
    Ok(serde_json::to_value(result)?)
}
