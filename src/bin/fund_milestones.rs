//! Split a mutual fund order history into sold and held blocks with profit bands
//!
//! Run with: cargo run --bin fund_milestones -- --input data.csv

use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::Parser;
use fund_milestones::partition::{BreakdownOptions, DEFAULT_PROFIT_STEP};
use fund_milestones::RunConfig;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "fund_milestones",
    about = "Per-fund holding and profit-band breakdown of an order export."
)]
struct Args {
    /// Order export CSV
    #[arg(short, long, default_value = "data.csv")]
    input: PathBuf,

    /// JSON map of fund name to today's price change in percent
    #[arg(long, default_value = "todaysChange.json")]
    daily_change: PathBuf,

    /// Directory for by_date.csv and by_holdings.csv
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Size of each profit band
    #[arg(long, default_value_t = DEFAULT_PROFIT_STEP)]
    profit_step: f64,

    /// Only split at the holding boundary
    #[arg(long)]
    no_profit_bands: bool,

    /// Valuation date (YYYY-MM-DD), defaults to today
    #[arg(long)]
    as_of: Option<NaiveDate>,
}

fn format_rate(rate: Option<f64>) -> String {
    rate.map(|r| format!("{:.2}%", r * 100.0))
        .unwrap_or_else(|| "n/a".to_string())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = RunConfig {
        input: args.input,
        daily_change: args.daily_change,
        output_dir: args.output_dir,
        options: BreakdownOptions {
            profit_step: args.profit_step,
            profit_bands: !args.no_profit_bands,
        },
        as_of: args.as_of.unwrap_or_else(|| Local::now().date_naive()),
    };

    let summary = fund_milestones::run(&config)?;

    println!(
        "{:<40} {:>14} {:>14} {:>14} {:>9}",
        "Fund", "Invested", "Value", "Profit", "XIRR"
    );
    for fund in &summary.funds {
        println!(
            "{:<40} {:>14.0} {:>14.0} {:>14.0} {:>9}",
            fund.fund,
            fund.net_invested,
            fund.current_value,
            fund.profit,
            format_rate(fund.xirr)
        );
    }
    println!(
        "{:<40} {:>14.0} {:>14.0} {:>14.0} {:>9}",
        "Total",
        summary.net_invested,
        summary.current_value,
        summary.profit,
        format_rate(summary.xirr)
    );

    Ok(())
}
