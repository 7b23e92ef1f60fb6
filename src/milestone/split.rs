//! Proportional split of one transaction into two fragments.

use super::tolerance;
use crate::models::Transaction;
use crate::normalize::round_to;

/// Decimals kept on a fragment's quantity
pub const QUANTITY_DECIMALS: i32 = 3;

/// The two sides of a split. At least one side is always present.
pub type Fragments = (Option<Transaction>, Option<Transaction>);

/// Split `txn` in the proportion `weight_a : weight_b`.
///
/// Fragment A gets the rounded share of the quantity and is valued from the
/// original unit prices; fragment B gets the exact remainder of every total, so
/// quantity, amount, market value and profit of both fragments add up to the
/// original. A side whose share is negligible (or negative) gets nothing and the
/// whole transaction goes to the other side.
pub fn split_transaction(txn: &Transaction, weight_a: f64, weight_b: f64) -> Fragments {
    let zero = tolerance(0.0);
    if weight_a.abs() <= zero && weight_b.abs() <= zero {
        return (Some(txn.clone()), None);
    }
    if weight_a.abs() <= tolerance(weight_b) {
        return (None, Some(txn.clone()));
    }
    if weight_b.abs() <= tolerance(weight_a) {
        return (Some(txn.clone()), None);
    }
    if weight_a < 0.0 {
        return (None, Some(txn.clone()));
    }
    if weight_b < 0.0 {
        return (Some(txn.clone()), None);
    }

    let ratio = weight_a / (weight_a + weight_b);
    let quantity_a = round_to(txn.quantity * ratio, QUANTITY_DECIMALS);
    let quantity_b = txn.quantity - quantity_a;

    // Rounding may leave one side empty
    if round_to(quantity_a, QUANTITY_DECIMALS) == 0.0 {
        return (None, Some(txn.clone()));
    }
    if round_to(quantity_b, QUANTITY_DECIMALS) == 0.0 {
        return (Some(txn.clone()), None);
    }

    let amount_a = (txn.average_price * quantity_a).round();
    let market_value_a = (txn.last_price * quantity_a).round();

    let fragment_a = Transaction {
        quantity: quantity_a,
        amount: amount_a,
        market_value: market_value_a,
        profit: market_value_a - amount_a,
        ..txn.clone()
    };

    let amount_b = txn.amount - amount_a;
    let market_value_b = txn.market_value - market_value_a;

    let fragment_b = Transaction {
        quantity: quantity_b,
        amount: amount_b,
        market_value: market_value_b,
        profit: market_value_b - amount_b,
        ..txn.clone()
    };

    (Some(fragment_a), Some(fragment_b))
}
