use clap::Args;
use serde_json::Value;

use cecl_panel_core::scenarios::{run_scenarios, ScenarioSetInput};

use crate::input;

/// Arguments for the macro scenario comparison
#[derive(Args)]
pub struct ScenariosArgs {
    /// YAML/JSON file: {"scenarios": [{"name", "n_borrowers", "months", "macro_adjustments"}], ...}
    #[arg(long)]
    pub config: Option<String>,
}

pub fn run_scenarios_cmd(args: ScenariosArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let set: ScenarioSetInput = input::load(args.config.as_deref())?
        .ok_or("--config is required (or pipe JSON on stdin)")?;
    let result = run_scenarios(&set)?;
    Ok(serde_json::to_value(result)?)
}
