//! Summaries and CSV export of a breakdown
//!
//! Per fund (over the execution-ordered view):
//! - units held = Σ quantity
//! - current value = round(units held × last price of the fund's latest row)
//! - net invested = Σ amount, profit = Σ row profit
//! - XIRR over the amounts plus the current value taken out on the valuation date
//!
//! The portfolio line adds up invested and current value across funds and runs
//! XIRR over every fund's cash flows.

mod xirr;

pub use xirr::{solve_xirr, CashFlow};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::models::{FundLedger, Transaction};

pub const HEADER: [&str; 8] = [
    "Fund",
    "Date",
    "Quantity",
    "Last Price",
    "Average Price",
    "Amount",
    "Now",
    "Profit/Loss",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundSummary {
    pub fund: String,
    pub units_held: f64,
    pub net_invested: f64,
    pub current_value: f64,
    pub profit: f64,
    /// None when the rate does not converge
    pub xirr: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub as_of: NaiveDate,
    pub net_invested: f64,
    pub current_value: f64,
    pub profit: f64,
    pub xirr: Option<f64>,
    pub funds: Vec<FundSummary>,
}

/// Which of the two ledger views to export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    ByDate,
    ByHolding,
}

impl View {
    fn rows(self, ledger: &FundLedger) -> &[Transaction] {
        match self {
            View::ByDate => &ledger.by_date,
            View::ByHolding => &ledger.by_holding,
        }
    }
}

fn cash_flows(txns: &[Transaction]) -> Vec<CashFlow> {
    txns.iter()
        .map(|t| CashFlow {
            date: t.date,
            amount: t.amount,
        })
        .collect()
}

/// Value of the remaining units at the latest known price
pub fn current_value(txns: &[Transaction]) -> f64 {
    let units: f64 = txns.iter().map(|t| t.quantity).sum();
    let last_price = txns.last().map(|t| t.last_price).unwrap_or(0.0);
    (units * last_price).round()
}

pub fn summarize_fund(fund: &str, txns: &[Transaction], as_of: NaiveDate) -> FundSummary {
    let current_value = current_value(txns);
    let rate = xirr::xirr_or_zero(&cash_flows(txns), current_value, as_of);

    if rate.is_none() {
        log::warn!("{}: XIRR did not converge", fund);
    }

    FundSummary {
        fund: fund.to_string(),
        units_held: txns.iter().map(|t| t.quantity).sum(),
        net_invested: txns.iter().map(|t| t.amount).sum(),
        current_value,
        profit: txns.iter().map(|t| t.profit).sum(),
        xirr: rate,
    }
}

pub fn summarize(ledgers: &[FundLedger], as_of: NaiveDate) -> PortfolioSummary {
    let funds: Vec<FundSummary> = ledgers
        .iter()
        .map(|l| summarize_fund(&l.fund, &l.by_date, as_of))
        .collect();

    let net_invested: f64 = funds.iter().map(|f| f.net_invested).sum();
    let current_value: f64 = funds.iter().map(|f| f.current_value).sum();

    let all_flows: Vec<CashFlow> = ledgers.iter().flat_map(|l| cash_flows(&l.by_date)).collect();
    let rate = xirr::xirr_or_zero(&all_flows, current_value, as_of);

    PortfolioSummary {
        as_of,
        net_invested,
        current_value,
        profit: current_value - net_invested,
        xirr: rate,
        funds,
    }
}

fn transaction_record(txn: &Transaction) -> [String; 8] {
    [
        txn.fund.clone(),
        txn.date.format("%Y-%m-%d").to_string(),
        txn.quantity.to_string(),
        txn.last_price.to_string(),
        txn.average_price.to_string(),
        txn.amount.to_string(),
        txn.market_value.to_string(),
        txn.profit.to_string(),
    ]
}

/// Write one view of the ledgers as CSV. Each fund block ends with a `Total`
/// row carrying the negated current value as the closing cash flow, then a
/// blank row.
pub fn write_view<W: std::io::Write>(
    writer: W,
    ledgers: &[FundLedger],
    view: View,
    as_of: NaiveDate,
) -> Result<usize> {
    let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(writer);
    wtr.write_record(HEADER)?;

    let mut rows = 0;
    for ledger in ledgers {
        let txns = view.rows(ledger);
        for txn in txns {
            wtr.write_record(transaction_record(txn))?;
            rows += 1;
        }

        // + 0.0 keeps a sold-out fund from printing "-0"
        let closing = -current_value(txns) + 0.0;
        wtr.write_record([
            "Total".to_string(),
            as_of.format("%Y-%m-%d").to_string(),
            String::new(),
            String::new(),
            String::new(),
            closing.to_string(),
            String::new(),
            String::new(),
        ])?;
        wtr.write_record([""; 8])?;
    }

    wtr.flush()?;
    Ok(rows)
}

/// Export `by_date.csv` and `by_holdings.csv` into `dir`
pub fn export_views(dir: &Path, ledgers: &[FundLedger], as_of: NaiveDate) -> Result<()> {
    for (name, view) in [("by_date.csv", View::ByDate), ("by_holdings.csv", View::ByHolding)] {
        let path = dir.join(name);
        let file = std::fs::File::create(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        let rows = write_view(file, ledgers, view, as_of)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        log::info!("Wrote {} transactions to {}", rows, path.display());
    }
    Ok(())
}
