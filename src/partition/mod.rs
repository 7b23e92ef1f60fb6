//! Fund breakdown
//!
//! Groups normalized transactions by fund and cuts each fund's history into
//! what has been sold and what is still held:
//! - funds are presented by the date of their first transaction
//! - within a fund all sells come first, then all buys, each by date, so the
//!   running quantity falls through the sells and climbs back through the buys
//! - the buy at which the running quantity returns to zero is split: the part
//!   that covered earlier sells ends the "sold" block, the rest starts the
//!   "held" block (FIFO)
//! - optionally the held block is cut again every `profit_step` of cumulative
//!   profit

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::EngineError;
use crate::milestone::{scan_to_milestone, Metric};
use crate::models::{FundLedger, Transaction};

pub const DEFAULT_PROFIT_STEP: f64 = 25_000.0;

pub const SOLD_LABEL: &str = "Sold till here";
pub const HOLDING_LABEL: &str = "Holding start";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BreakdownOptions {
    /// Size of each profit band in currency units
    pub profit_step: f64,
    /// Cut the held block into profit bands
    pub profit_bands: bool,
}

impl Default for BreakdownOptions {
    fn default() -> Self {
        Self {
            profit_step: DEFAULT_PROFIT_STEP,
            profit_bands: true,
        }
    }
}

impl BreakdownOptions {
    pub fn validate(&self) -> Result<(), EngineError> {
        if !self.profit_step.is_finite() || self.profit_step <= 0.0 {
            return Err(EngineError::InvalidProfitStep(self.profit_step));
        }
        Ok(())
    }
}

/// Group by fund, funds ordered by their earliest transaction date.
/// Funds starting on the same day keep the order in which they first appear.
pub fn group_by_fund(txns: &[Transaction]) -> Vec<(String, Vec<Transaction>)> {
    let mut index_by_fund: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<Transaction>)> = Vec::new();

    for txn in txns {
        let idx = *index_by_fund.entry(txn.fund.as_str()).or_insert_with(|| {
            groups.push((txn.fund.clone(), Vec::new()));
            groups.len() - 1
        });
        groups[idx].1.push(txn.clone());
    }

    groups.sort_by_key(|(_, fund_txns)| fund_txns.iter().map(|t| t.date).min());
    groups
}

/// Sells before buys, each side by date ascending. Stable, so rows on the same
/// day keep their execution order.
pub fn order_for_holding(txns: &mut [Transaction]) {
    txns.sort_by(|a, b| {
        a.direction
            .holding_rank()
            .cmp(&b.direction.holding_rank())
            .then(a.date.cmp(&b.date))
    });
}

/// Cut `held` at every multiple of `profit_step` of cumulative profit until the
/// next multiple is out of reach. Returns the number of bands reached.
pub fn add_profit_bands(held: &mut Vec<Transaction>, profit_step: f64) -> usize {
    let mut reached = 0;

    loop {
        let target = profit_step * (reached + 1) as f64;
        let label = format!("Profit reached {}", target);

        if !scan_to_milestone(held, Metric::Profit, target, Some(&label), None).is_reached() {
            break;
        }
        reached += 1;
    }

    reached
}

/// Order one fund's transactions and split them at the holding boundary and,
/// if enabled, at the profit bands. Returns the ledger and the index where the
/// held block starts.
pub fn split_fund(
    fund: &str,
    mut txns: Vec<Transaction>,
    options: &BreakdownOptions,
) -> (Vec<Transaction>, Option<usize>) {
    order_for_holding(&mut txns);

    let milestone = scan_to_milestone(
        &mut txns,
        Metric::Quantity,
        0.0,
        Some(SOLD_LABEL),
        Some(HOLDING_LABEL),
    );

    let Some(held_from) = milestone.next_index() else {
        let net: f64 = txns.iter().map(|t| t.quantity).sum();
        log::warn!("{}: more units sold than bought ({} net), nothing held", fund, net);
        return (txns, None);
    };

    let mut held = txns.split_off(held_from);

    if options.profit_bands && !held.is_empty() {
        let bands = add_profit_bands(&mut held, options.profit_step);
        log::debug!("{}: {} profit bands of {}", fund, bands, options.profit_step);
    }

    log::info!(
        "{}: {} sold rows, {} held rows",
        fund,
        held_from,
        held.len()
    );

    txns.extend(held);
    (txns, Some(held_from))
}

/// Run the whole breakdown over normalized transactions
pub fn build_breakdown(
    txns: &[Transaction],
    options: &BreakdownOptions,
) -> Result<Vec<FundLedger>, EngineError> {
    options.validate()?;

    let ledgers: Vec<FundLedger> = group_by_fund(txns)
        .into_iter()
        .map(|(fund, by_date)| {
            let (by_holding, held_from) = split_fund(&fund, by_date.clone(), options);
            FundLedger {
                fund,
                by_date,
                by_holding,
                held_from,
            }
        })
        .collect();

    log::info!("Built breakdown for {} funds", ledgers.len());
    Ok(ledgers)
}
