//! Position Size Calculator
//!
//! Sizes long stock positions from an account value, entry price, stop loss
//! and risk percentage, and lays out profit targets at fixed reward multiples.

mod models;
mod session;
mod trading;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::models::RawInputs;
use crate::session::{run_session, Session};
use crate::trading::{parse_reward_ratios, PositionSizer, SizingConfig};

/// Position size calculator CLI.
#[derive(Parser)]
#[command(name = "possize")]
#[command(about = "Size positions by risk and plan profit targets", long_about = None)]
struct Cli {
    /// Log level or filter directive (e.g. debug, position_sizer=trace)
    #[arg(short, long, default_value = "info", env = "POSSIZE_LOG_LEVEL")]
    log_level: String,

    /// Share counts round down to a multiple of this lot size
    #[arg(long, env = "POSSIZE_LOT_SIZE")]
    lot_size: Option<u32>,

    /// Reward multiples for profit targets, comma separated (e.g. 2,3,4,5,6)
    #[arg(long, env = "POSSIZE_REWARD_RATIOS")]
    reward_ratios: Option<String>,

    /// Lowest accepted risk percentage
    #[arg(long, env = "POSSIZE_MIN_RISK_PCT")]
    min_risk_pct: Option<Decimal>,

    /// Highest accepted risk percentage (means "use full purchase power")
    #[arg(long, env = "POSSIZE_MAX_RISK_PCT")]
    max_risk_pct: Option<Decimal>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate a position once
    Calc {
        /// Total account value
        #[arg(short, long, default_value = "")]
        account: String,

        /// Entry price per share
        #[arg(short, long, default_value = "")]
        entry: String,

        /// Stop loss price
        #[arg(short, long, default_value = "")]
        stop: String,

        /// Percent of the account to risk
        #[arg(short, long, default_value = "2")]
        risk: String,

        /// Read inputs from a JSON object instead of flags
        #[arg(long, conflicts_with_all = ["account", "entry", "stop"])]
        input: Option<String>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Edit the inputs interactively and watch the position update
    Interactive,

    /// Show current configuration
    Config,

    /// Explain how the calculator works
    About,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Setup logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(log_filter(&cli.log_level))
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = build_config(&cli).context("invalid sizing configuration")?;
    let sizer = PositionSizer::new(config.clone());

    match cli.command {
        Commands::Calc {
            account,
            entry,
            stop,
            risk,
            input,
            json,
        } => {
            let plan = match input {
                Some(text) => {
                    let raw: RawInputs =
                        serde_json::from_str(&text).context("--input must be a JSON object")?;
                    info!(inputs = ?raw, "Calculating position from JSON");
                    sizer.compute(&raw.parse())
                }
                None => {
                    info!(
                        account = %account,
                        entry = %entry,
                        stop = %stop,
                        risk = %risk,
                        "Calculating position"
                    );
                    sizer.compute_raw(&account, &entry, &stop, &risk)
                }
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                print!("{}", plan);
            }
        }

        Commands::Interactive => {
            let mut session = Session::new(sizer);
            let stdin = BufReader::new(tokio::io::stdin());

            run_session(&mut session, stdin, tokio::io::stdout()).await?;

            info!(form = %session.form().summary(), "Last calculator state");
        }

        Commands::Config => {
            let ratios: Vec<String> = config
                .reward_ratios
                .iter()
                .map(|r| format!("{}:1", r))
                .collect();

            println!("\n=== Sizing Configuration ===\n");
            println!("Position Sizing:");
            println!("  Lot Size:             {} shares", config.lot_size);
            println!("  Profit Targets:       {}", ratios.join(", "));

            println!("\nRisk Percentage:");
            println!("  Minimum:              {}%", config.min_risk_pct);
            println!("  Maximum:              {}% (full purchase power)", config.max_risk_pct);
        }

        Commands::About => {
            let ratios = &config.reward_ratios;
            let (first, last) = match (ratios.first(), ratios.last()) {
                (Some(first), Some(last)) => (*first, *last),
                _ => anyhow::bail!("no reward ratios configured"),
            };

            println!("\n=== Position Size Calculator ===\n");
            println!("How It Works");
            println!("  - Enter your total account value");
            println!("  - Set your entry price and stop loss");
            println!(
                "  - Adjust your risk percentage ({}% to {}%)",
                config.min_risk_pct, config.max_risk_pct
            );
            println!("  - View calculated position size and profit targets");

            println!("\nRisk Management");
            println!("  The difference between entry price and stop loss is your risk per share.");
            println!("  The share count is the most you can buy while staying within your chosen");
            println!(
                "  risk percentage and your purchase power, in lots of {} shares.",
                config.lot_size
            );

            println!("\nProfit Targets");
            println!(
                "  Targets sit at risk-to-reward ratios from {}:1 to {}:1 of your initial risk.",
                first, last
            );
            println!("  Use them to plan exits for profitable trades.");

            println!("\nThis is a position sizing aid. Do your own research and never risk");
            println!("more than you can afford to lose.");
        }
    }

    Ok(())
}

/// Filter from `--log-level`; unparseable directives fall back to `info`.
fn log_filter(directives: &str) -> EnvFilter {
    EnvFilter::try_new(directives.to_lowercase()).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Defaults overridden by CLI flags and environment.
fn build_config(cli: &Cli) -> Result<SizingConfig> {
    let mut config = SizingConfig::default();

    if let Some(lot_size) = cli.lot_size {
        config.lot_size = lot_size;
    }
    if let Some(ratios) = &cli.reward_ratios {
        config.reward_ratios = parse_reward_ratios(ratios)?;
    }
    if let Some(min) = cli.min_risk_pct {
        config.min_risk_pct = min;
    }
    if let Some(max) = cli.max_risk_pct {
        config.max_risk_pct = max;
    }

    config.validate()?;
    info!(
        lot_size = config.lot_size,
        ratios = ?config.reward_ratios,
        "Sizing configuration loaded"
    );
    Ok(config)
}
