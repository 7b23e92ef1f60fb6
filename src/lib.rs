pub mod csv_import;
pub mod daily_change;
pub mod error;
pub mod milestone;
pub mod models;
pub mod normalize;
pub mod partition;
pub mod report;

use anyhow::Result;
use chrono::NaiveDate;
use std::path::PathBuf;

use daily_change::DailyChange;
use partition::BreakdownOptions;
use report::PortfolioSummary;

/// Files and settings for one breakdown run
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub input: PathBuf,
    pub daily_change: PathBuf,
    pub output_dir: PathBuf,
    pub options: BreakdownOptions,
    /// Valuation date for the closing cash flow
    pub as_of: NaiveDate,
}

/// Read the order export, build the breakdown, write both views and persist the
/// daily change file with any newly seen funds.
pub fn run(config: &RunConfig) -> Result<PortfolioSummary> {
    config.options.validate()?;

    let rows = csv_import::read_orders_file(&config.input)?;

    let mut daily_change = DailyChange::load(&config.daily_change)?;
    let txns = normalize::normalize_orders(&rows, &daily_change)?;

    let added = daily_change.register_funds(txns.iter().map(|t| t.fund.as_str()));
    if added > 0 {
        log::info!("Added {} funds to {} with 0% change", added, config.daily_change.display());
    }
    daily_change.save(&config.daily_change)?;

    let ledgers = partition::build_breakdown(&txns, &config.options)?;
    report::export_views(&config.output_dir, &ledgers, config.as_of)?;

    Ok(report::summarize(&ledgers, config.as_of))
}
