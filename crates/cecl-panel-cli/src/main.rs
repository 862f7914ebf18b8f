mod commands;
mod input;
mod output;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::amortize::AmortizeArgs;
use commands::generate::{GenerateArgs, MacroArgs};
use commands::loss::{CalibrateArgs, CeclArgs, HazardsArgs};
use commands::pipeline::PipelineArgs;
use commands::quality::{ReportArgs, RollRatesArgs, ValidateArgs};
use commands::scenarios::ScenariosArgs;
use commands::simulate::SimulateArgs;

/// Synthetic consumer-credit panels, CECL expected loss and curve calibration
#[derive(Parser)]
#[command(
    name = "cecl",
    version,
    about = "Synthetic consumer-credit panels, CECL expected loss and curve calibration",
    long_about = "Generates multi-product consumer-credit portfolios (card, auto, personal, \
                  mortgage, HELOC), simulates their monthly delinquency panels under macro \
                  stress, computes PD x LGD x EAD expected loss and rescales modeled losses \
                  to target cumulative default curves."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Also write every result table as CSV into this directory
    #[arg(long, global = true)]
    out_dir: Option<String>,

    /// Log verbosity (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Synthesize a monthly macro series
    Macro(MacroArgs),
    /// Generate borrowers, loans and monthly panels for a portfolio
    Generate(GenerateArgs),
    /// Simulate one product's monthly performance panel
    Simulate(SimulateArgs),
    /// Compute monthly, lifetime and portfolio expected loss
    Cecl(CeclArgs),
    /// Calibrate modeled losses to cumulative default targets
    Calibrate(CalibrateArgs),
    /// Convert a cumulative default curve into per-period hazards
    Hazards(HazardsArgs),
    /// Validate loan batches and panels
    Validate(ValidateArgs),
    /// Month-over-month delinquency roll-rate matrix
    RollRates(RollRatesArgs),
    /// Roll rates, distributions, coverage and vintage summaries
    Report(ReportArgs),
    /// Run and compare macro stress scenarios
    Scenarios(ScenariosArgs),
    /// Generate, validate, estimate, calibrate and report in one run
    Pipeline(PipelineArgs),
    /// Level-payment amortization schedule (exact decimal)
    Amortize(AmortizeArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Macro(args) => commands::generate::run_macro(args),
        Commands::Generate(args) => commands::generate::run_generate(args),
        Commands::Simulate(args) => commands::simulate::run_simulate(args),
        Commands::Cecl(args) => commands::loss::run_cecl_cmd(args),
        Commands::Calibrate(args) => commands::loss::run_calibrate(args),
        Commands::Hazards(args) => commands::loss::run_hazards(args),
        Commands::Validate(args) => commands::quality::run_validate(args),
        Commands::RollRates(args) => commands::quality::run_roll_rates(args),
        Commands::Report(args) => commands::quality::run_report(args),
        Commands::Scenarios(args) => commands::scenarios::run_scenarios_cmd(args),
        Commands::Pipeline(args) => commands::pipeline::run_pipeline(args),
        Commands::Amortize(args) => commands::amortize::run_amortize(args),
        Commands::Version => {
            println!("cecl {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    let result = result.and_then(|value| {
        if let Some(ref dir) = cli.out_dir {
            let written = output::csv_out::write_tables(dir, &value)?;
            for path in written {
                eprintln!("{} {}", "wrote".green(), path.display());
            }
        }
        Ok(value)
    });

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
