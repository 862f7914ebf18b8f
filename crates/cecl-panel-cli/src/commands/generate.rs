use chrono::NaiveDate;
use clap::Args;
use serde_json::Value;

use cecl_panel_core::calendar::default_start_month;
use cecl_panel_core::macro_series::{synthesize, MacroSeries, SyntheticMacroInput};
use cecl_panel_core::simulation::{generate_portfolio, PortfolioInput};
use cecl_panel_core::ProductType;

use crate::input;

/// Arguments for synthetic macro series generation
#[derive(Args)]
pub struct MacroArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// First month (YYYY-MM-DD)
    #[arg(long, default_value = "2019-01-01")]
    pub start: NaiveDate,

    /// Last month, inclusive (YYYY-MM-DD)
    #[arg(long, default_value = "2024-12-01")]
    pub end: NaiveDate,

    /// Random seed
    #[arg(long, default_value_t = cecl_panel_core::DEFAULT_SEED)]
    pub seed: u64,
}

/// Arguments for portfolio generation (borrowers, loans, panels)
#[derive(Args)]
pub struct GenerateArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Number of borrowers
    #[arg(long, default_value_t = 1000)]
    pub borrowers: usize,

    /// Products to originate, comma separated
    #[arg(long, value_delimiter = ',', default_value = "card,auto,personal,mortgage,heloc")]
    pub products: Vec<ProductType>,

    /// Simulation horizon in months
    #[arg(long, default_value_t = 12)]
    pub months: usize,

    /// First simulated month (YYYY-MM-DD)
    #[arg(long)]
    pub start_month: Option<NaiveDate>,

    /// Random seed
    #[arg(long, default_value_t = cecl_panel_core::DEFAULT_SEED)]
    pub seed: u64,

    /// Macro series file; synthesized when omitted
    #[arg(long)]
    pub macro_series: Option<String>,
}

pub fn run_macro(args: MacroArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let macro_input: SyntheticMacroInput = match input::load(args.input.as_deref())? {
        Some(i) => i,
        None => SyntheticMacroInput {
            start: args.start,
            end: args.end,
            seed: args.seed,
        },
    };
    let series = synthesize(&macro_input)?;
    Ok(serde_json::to_value(series)?)
}

pub fn run_generate(args: GenerateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let portfolio_input: PortfolioInput = match input::load(args.input.as_deref())? {
        Some(i) => i,
        None => {
            let macro_series: Option<MacroSeries> = match args.macro_series {
                Some(ref path) => Some(input::file::read_config(path)?),
                None => None,
            };
            PortfolioInput {
                num_borrowers: args.borrowers,
                products: args.products,
                months: args.months,
                start_month: args.start_month.unwrap_or_else(default_start_month),
                seed: args.seed,
                macro_series,
                unemployment_baseline: None,
            }
        }
    };
    let result = generate_portfolio(&portfolio_input)?;
    Ok(serde_json::to_value(result)?)
}
