use clap::Args;
use serde_json::Value;
use std::collections::BTreeMap;

use cecl_panel_core::calibration::{calibrate_products, hazards_for, CalibrationInput, HazardInput};
use cecl_panel_core::ecl::{run_cecl, CeclInput, DEFAULT_LGD};
use cecl_panel_core::schema::panel_from_json;
use cecl_panel_core::ProductType;

use crate::input;

/// Arguments for the CECL expected-loss run
#[derive(Args)]
pub struct CeclArgs {
    /// Panel file: an array of rows or {"panel": [...], "default_lgd": ...}
    #[arg(long)]
    pub input: Option<String>,

    /// LGD applied where a row carries none
    #[arg(long)]
    pub default_lgd: Option<f64>,
}

/// Arguments for curve calibration
#[derive(Args)]
pub struct CalibrateArgs {
    /// Path to JSON/YAML CalibrationInput (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Panel file (array of rows)
    #[arg(long)]
    pub panel: Option<String>,

    /// Target curves file: {"card": [0.01, ...], ...}
    #[arg(long)]
    pub targets: Option<String>,

    /// Loan-relative month cutoff
    #[arg(long)]
    pub months: Option<usize>,

    /// LGD applied where a row carries none
    #[arg(long, default_value_t = DEFAULT_LGD)]
    pub default_lgd: f64,
}

/// Arguments for the cumulative-to-hazard conversion
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct HazardsArgs {
    /// Cumulative curve, comma separated (e.g. 0,0.02,0.05)
    #[arg(long, value_delimiter = ',')]
    pub cumulative: Vec<f64>,

    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

fn read_panel(path: &str) -> Result<Vec<cecl_panel_core::PerformanceRecord>, Box<dyn std::error::Error>> {
    match input::file::read_config_value(path)? {
        Value::Array(rows) => Ok(panel_from_json(rows)?),
        _ => Err(format!("'{path}' must hold an array of panel rows").into()),
    }
}

pub fn run_cecl_cmd(args: CeclArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let raw = input::load_value(args.input.as_deref())?
        .ok_or("--input panel file is required (or pipe JSON on stdin)")?;
    let mut cecl_input = CeclInput::from_json(raw)?;
    if let Some(lgd) = args.default_lgd {
        cecl_input.default_lgd = lgd;
    }
    let result = run_cecl(&cecl_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_calibrate(args: CalibrateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let cal_input: CalibrationInput = if let Some(i) = input::load(args.input.as_deref())? {
        i
    } else {
        let panel_path = args.panel.ok_or("--panel is required (or provide --input)")?;
        let targets_path = args.targets.ok_or("--targets is required (or provide --input)")?;
        let targets: BTreeMap<ProductType, Vec<f64>> = input::file::read_config(&targets_path)?;
        CalibrationInput {
            panel: read_panel(&panel_path)?,
            targets,
            months: args.months,
            default_lgd: args.default_lgd,
        }
    };
    let result = calibrate_products(&cal_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_hazards(args: HazardsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let hazard_input: HazardInput = match input::load(args.input.as_deref())? {
        Some(i) => i,
        None if !args.cumulative.is_empty() => HazardInput {
            cumulative: args.cumulative,
        },
        None => return Err("--cumulative is required (or provide --input)".into()),
    };
    let result = hazards_for(&hazard_input)?;
    Ok(serde_json::to_value(result)?)
}
