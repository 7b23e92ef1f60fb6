//! Transaction normalization
//!
//! Turns broker order rows into signed `Transaction`s:
//! - only completed orders are kept
//! - rows are ordered by execution timestamp, ties by fund name
//! - quantity and amount carry the direction as their sign
//! - last price is adjusted by the fund's daily change before valuing the position

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::daily_change::DailyChange;
use crate::error::EngineError;
use crate::models::{Direction, RawOrder, Transaction};

/// Round to a fixed number of decimals
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// Parse an order timestamp - handles "YYYY-MM-DD", "YYYY-MM-DD HH:MM:SS",
/// "YYYY-MM-DDTHH:MM:SS" (optionally with fractional seconds) and RFC 3339
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();

    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.naive_local())
        .or_else(|| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").ok())
        .or_else(|| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S").ok())
        .or_else(|| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f").ok())
        .or_else(|| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn parse_number(field: &'static str, value: &str, fund: &str) -> Result<f64, EngineError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| EngineError::InvalidNumber {
            field,
            fund: fund.to_string(),
            value: value.to_string(),
        })
}

/// Quantities are reported unsigned; the direction supplies the sign
fn parse_quantity(value: &str, fund: &str) -> Result<f64, EngineError> {
    let quantity = parse_number("quantity", value, fund)?;
    if quantity < 0.0 {
        return Err(EngineError::InvalidNumber {
            field: "quantity",
            fund: fund.to_string(),
            value: value.to_string(),
        });
    }
    Ok(quantity)
}

/// Normalize a single completed order row
pub fn normalize_order(
    raw: &RawOrder,
    daily_change: &DailyChange,
) -> Result<Transaction, EngineError> {
    let fund = raw.fund.as_str();

    let direction: Direction = raw
        .transaction_type
        .parse()
        .map_err(|_| EngineError::InvalidDirection {
            fund: fund.to_string(),
            value: raw.transaction_type.clone(),
        })?;

    let executed_at =
        parse_timestamp(&raw.order_timestamp).ok_or_else(|| EngineError::InvalidTimestamp {
            fund: fund.to_string(),
            value: raw.order_timestamp.clone(),
        })?;

    let quantity = parse_quantity(&raw.quantity, fund)? * direction.sign();
    let average_price = parse_number("average_price", &raw.average_price, fund)?;
    let reported_last_price = parse_number("last_price", &raw.last_price, fund)?;

    // Buys are valued at cost; sells keep the reported proceeds
    let amount = match direction {
        Direction::Buy => round_to(average_price * quantity, 2),
        Direction::Sell => parse_number("amount", &raw.amount, fund)?.round() * direction.sign(),
    };

    let last_price = round_to(reported_last_price * daily_change.price_factor(fund), 4);
    let market_value = (last_price * quantity).round();

    Ok(Transaction {
        fund: raw.fund.clone(),
        date: executed_at.date(),
        direction,
        quantity,
        average_price,
        amount,
        last_price,
        market_value,
        profit: market_value - amount,
    })
}

/// Normalize all completed orders, in execution order
pub fn normalize_orders(
    rows: &[RawOrder],
    daily_change: &DailyChange,
) -> Result<Vec<Transaction>, EngineError> {
    let mut completed: Vec<(NaiveDateTime, &RawOrder)> = Vec::with_capacity(rows.len());

    for raw in rows.iter().filter(|r| r.is_complete()) {
        let executed_at =
            parse_timestamp(&raw.order_timestamp).ok_or_else(|| EngineError::InvalidTimestamp {
                fund: raw.fund.clone(),
                value: raw.order_timestamp.clone(),
            })?;
        completed.push((executed_at, raw));
    }

    let skipped = rows.len() - completed.len();
    if skipped > 0 {
        log::info!("Skipping {} orders that are not complete", skipped);
    }

    completed.sort_by(|(ts_a, a), (ts_b, b)| ts_a.cmp(ts_b).then_with(|| a.fund.cmp(&b.fund)));

    completed
        .into_iter()
        .map(|(_, raw)| normalize_order(raw, daily_change))
        .collect()
}
