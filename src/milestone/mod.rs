//! Milestone scanning
//!
//! Walks an ordered list of transactions accumulating one numeric field. The
//! transaction at which the running sum reaches the target is split so the sum
//! lands exactly on the target: the first fragment completes the target, the
//! second carries the overshoot forward.
//!
//! ```text
//! target 25000, profits [10000, 20000, 5000]
//!   -> [10000, 15000 (Profit reached 25000), 5000, 5000]
//! ```

mod split;

pub use split::{split_transaction, Fragments, QUANTITY_DECIMALS};

use crate::models::Transaction;

/// Relative tolerance for zero and target checks
pub const RELATIVE_EPSILON: f64 = 1e-9;

/// Comparison tolerance scaled to the magnitude of the operand
pub(crate) fn tolerance(magnitude: f64) -> f64 {
    RELATIVE_EPSILON * magnitude.abs().max(1.0)
}

/// Field accumulated while scanning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Quantity,
    Profit,
}

impl Metric {
    pub fn value(self, txn: &Transaction) -> f64 {
        match self {
            Metric::Quantity => txn.quantity,
            Metric::Profit => txn.profit,
        }
    }
}

/// Outcome of a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Milestone {
    /// The list ran out before the target; the list is unchanged
    Unreached,
    /// `boundary` is the last transaction on or before the target,
    /// `None` when the very first transaction already lies past it
    Reached { boundary: Option<usize> },
}

impl Milestone {
    pub fn is_reached(&self) -> bool {
        matches!(self, Milestone::Reached { .. })
    }

    /// Index of the first transaction after the boundary
    pub fn next_index(&self) -> Option<usize> {
        match self {
            Milestone::Unreached => None,
            Milestone::Reached { boundary } => Some(boundary.map_or(0, |i| i + 1)),
        }
    }
}

/// Scan `txns` until the running sum of `metric` reaches `target`, splitting the
/// boundary transaction in place.
///
/// `label_at` is appended to the fund of the boundary transaction and
/// `label_after` to the one following it, where those exist.
pub fn scan_to_milestone(
    txns: &mut Vec<Transaction>,
    metric: Metric,
    target: f64,
    label_at: Option<&str>,
    label_after: Option<&str>,
) -> Milestone {
    let tol = tolerance(target);
    let mut sum = 0.0;
    let mut index = None;

    // Always visits the first transaction, even for a target of zero
    for (i, txn) in txns.iter().enumerate() {
        sum += metric.value(txn);
        index = Some(i);
        if target - sum <= tol {
            break;
        }
    }

    let Some(index) = index else {
        return Milestone::Unreached;
    };
    if target - sum > tol {
        return Milestone::Unreached;
    }

    let excess = sum - target;
    let boundary_value = metric.value(&txns[index]);
    let (first, second) = split_transaction(&txns[index], boundary_value - excess, excess);

    let boundary = if first.is_some() { Some(index) } else { index.checked_sub(1) };
    txns.splice(index..=index, first.into_iter().chain(second));

    log::debug!(
        "{:?} milestone {} reached at index {:?} (excess {})",
        metric,
        target,
        boundary,
        excess
    );

    if let (Some(label), Some(i)) = (label_at, boundary) {
        if let Some(txn) = txns.get_mut(i) {
            txn.add_label(label);
        }
    }

    let next = boundary.map_or(0, |i| i + 1);
    if let Some(label) = label_after {
        if let Some(txn) = txns.get_mut(next) {
            txn.add_label(label);
        }
    }

    Milestone::Reached { boundary }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Direction;
    use chrono::NaiveDate;

    fn txn(day: u32, quantity: f64, average_price: f64, last_price: f64) -> Transaction {
        let direction = if quantity < 0.0 { Direction::Sell } else { Direction::Buy };
        let amount = average_price * quantity;
        let market_value = last_price * quantity;
        Transaction {
            fund: "FundX".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            direction,
            quantity,
            average_price,
            amount,
            last_price,
            market_value,
            profit: market_value - amount,
        }
    }

    #[test]
    fn test_full_liquidation_reaches_at_last_buy() {
        // SELL -100 then BUY 100: the running quantity lands on 0 at the buy
        let mut txns = vec![txn(2, -100.0, 12.0, 12.0), txn(1, 100.0, 10.0, 12.0)];

        let result = scan_to_milestone(
            &mut txns,
            Metric::Quantity,
            0.0,
            Some("Sold till here"),
            Some("Holding start"),
        );

        assert_eq!(result, Milestone::Reached { boundary: Some(1) });
        assert_eq!(result.next_index(), Some(2));
        assert_eq!(txns.len(), 2, "no split expected");
        assert_eq!(txns[0].fund, "FundX");
        assert_eq!(txns[1].fund, "FundX (Sold till here)");
    }

    #[test]
    fn test_all_buys_boundary_before_first() {
        let mut txns = vec![txn(1, 50.0, 10.0, 10.0), txn(2, 50.0, 10.0, 10.0)];
        let before = txns.clone();

        let result = scan_to_milestone(
            &mut txns,
            Metric::Quantity,
            0.0,
            Some("Sold till here"),
            Some("Holding start"),
        );

        assert_eq!(result, Milestone::Reached { boundary: None });
        assert_eq!(result.next_index(), Some(0));
        assert_eq!(txns.len(), 2);
        assert_eq!(txns[0].fund, "FundX (Holding start)");
        assert_eq!(txns[0].quantity, before[0].quantity);
        assert_eq!(txns[1], before[1]);
    }

    #[test]
    fn test_quantity_zero_splits_boundary_buy() {
        let mut txns = vec![
            txn(5, -30.0, 11.0, 12.0),
            txn(1, 20.0, 10.0, 12.0),
            txn(2, 50.0, 10.0, 12.0),
        ];

        let result = scan_to_milestone(
            &mut txns,
            Metric::Quantity,
            0.0,
            Some("Sold till here"),
            Some("Holding start"),
        );

        assert_eq!(result, Milestone::Reached { boundary: Some(2) });
        assert_eq!(txns.len(), 4);

        let quantities: Vec<f64> = txns.iter().map(|t| t.quantity).collect();
        assert_eq!(quantities, vec![-30.0, 20.0, 10.0, 40.0]);

        // Running quantity rises monotonically to exactly zero at the boundary
        let mut running = 0.0;
        let mut previous = f64::NEG_INFINITY;
        for t in &txns[..=2] {
            running += t.quantity;
            assert!(running > previous);
            previous = running;
        }
        assert!(running.abs() < 1e-9, "expected 0, got {}", running);

        assert_eq!(txns[2].fund, "FundX (Sold till here)");
        assert_eq!(txns[3].fund, "FundX (Holding start)");
        assert_eq!(txns[2].amount + txns[3].amount, 500.0);
        assert_eq!(txns[2].profit + txns[3].profit, 100.0);
    }

    #[test]
    fn test_profit_band_split() {
        // Profits 10000, 20000, 5000
        let mut txns = vec![
            txn(1, 100.0, 100.0, 200.0),
            txn(2, 100.0, 100.0, 300.0),
            txn(3, 50.0, 100.0, 200.0),
        ];

        let result = scan_to_milestone(
            &mut txns,
            Metric::Profit,
            25000.0,
            Some("Profit reached 25000"),
            None,
        );

        assert_eq!(result, Milestone::Reached { boundary: Some(1) });
        assert!(result.is_reached());
        let profits: Vec<f64> = txns.iter().map(|t| t.profit).collect();
        assert_eq!(profits, vec![10000.0, 15000.0, 5000.0, 5000.0]);
        assert_eq!(txns[1].fund, "FundX (Profit reached 25000)");
        assert_eq!(txns[2].fund, "FundX");

        // Remaining profit is 35000, short of the next band
        let snapshot = txns.clone();
        let result = scan_to_milestone(
            &mut txns,
            Metric::Profit,
            50000.0,
            Some("Profit reached 50000"),
            None,
        );
        assert_eq!(result, Milestone::Unreached);
        assert!(!result.is_reached());
        assert_eq!(txns, snapshot);
    }

    #[test]
    fn test_exact_hit_needs_no_split() {
        let mut txns = vec![txn(1, 100.0, 100.0, 200.0), txn(2, 100.0, 100.0, 250.0)];

        let result = scan_to_milestone(
            &mut txns,
            Metric::Profit,
            25000.0,
            Some("Profit reached 25000"),
            None,
        );

        assert_eq!(result, Milestone::Reached { boundary: Some(1) });
        assert_eq!(txns.len(), 2);
        assert_eq!(txns[1].fund, "FundX (Profit reached 25000)");
    }

    #[test]
    fn test_first_fragment_missing_moves_label_back() {
        // The completing share of the buy is 0.0004 units, which rounds away
        let mut txns = vec![txn(1, -0.0004, 10.0, 10.0), txn(2, 5.0, 10.0, 10.0)];

        let result = scan_to_milestone(&mut txns, Metric::Quantity, 0.0, Some("at"), Some("after"));

        assert_eq!(result, Milestone::Reached { boundary: Some(0) });
        assert_eq!(txns.len(), 2);
        assert_eq!(txns[0].fund, "FundX (at)");
        assert_eq!(txns[1].fund, "FundX (after)");
        assert_eq!(txns[1].quantity, 5.0);
    }

    #[test]
    fn test_unreached_leaves_list_untouched() {
        let mut txns = vec![txn(1, -10.0, 10.0, 10.0), txn(2, 4.0, 10.0, 10.0)];
        let snapshot = txns.clone();

        let result = scan_to_milestone(&mut txns, Metric::Quantity, 0.0, Some("at"), Some("after"));

        assert_eq!(result, Milestone::Unreached);
        assert_eq!(result.next_index(), None);
        assert_eq!(txns, snapshot);
    }

    #[test]
    fn test_empty_list() {
        let mut txns: Vec<Transaction> = Vec::new();
        assert_eq!(
            scan_to_milestone(&mut txns, Metric::Quantity, 0.0, None, None),
            Milestone::Unreached
        );
    }

    #[test]
    fn test_rounding_noise_counts_as_reached() {
        let mut txns = vec![
            txn(1, -0.3, 10.0, 10.0),
            txn(2, 0.1, 10.0, 10.0),
            txn(3, 0.2, 10.0, 10.0),
        ];

        let result = scan_to_milestone(&mut txns, Metric::Quantity, 0.0, Some("at"), None);

        assert_eq!(result, Milestone::Reached { boundary: Some(2) });
        assert_eq!(txns.len(), 3);
        assert_eq!(txns[2].fund, "FundX (at)");
    }
}
