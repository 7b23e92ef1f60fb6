//! Money-weighted return (XIRR)
//!
//! The rate r at which the discounted cash flows sum to zero, found by
//! Newton-Raphson:
//!
//! ```text
//! NPV(r)  = Σ CF_i / (1 + r)^t_i
//! NPV'(r) = Σ -t_i × CF_i / (1 + r)^(t_i + 1)
//! ```
//!
//! t_i is in 365-day years from the earliest flow. Amounts follow the
//! transaction convention (buy cost positive, proceeds negative) and are
//! flipped to the investor's side before solving.

use chrono::NaiveDate;

/// A dated transaction amount
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CashFlow {
    pub date: NaiveDate,
    pub amount: f64,
}

const MAX_ITERATIONS: usize = 100;
const STEP_TOLERANCE: f64 = 1e-10;
const MIN_RATE: f64 = -0.99;
const MAX_RATE: f64 = 10.0;
const DAYS_PER_YEAR: f64 = 365.0;

/// Annual rate at which `flows` grow into `closing_value` on `as_of`.
///
/// `None` for an empty history, or when the iteration stalls or does not settle.
pub fn solve_xirr(flows: &[CashFlow], closing_value: f64, as_of: NaiveDate) -> Option<f64> {
    let start = flows.iter().map(|cf| cf.date).min()?;
    let years = |date: NaiveDate| (date - start).num_days() as f64 / DAYS_PER_YEAR;

    let series: Vec<(f64, f64)> = flows
        .iter()
        .map(|cf| (years(cf.date), -cf.amount))
        .chain(std::iter::once((years(as_of), closing_value)))
        .collect();

    let mut rate: f64 = 0.1;
    for _ in 0..MAX_ITERATIONS {
        let growth = 1.0 + rate;
        let (npv, slope) = series.iter().fold((0.0, 0.0), |(npv, slope), &(t, cf)| {
            let discounted = cf / growth.powf(t);
            (npv + discounted, slope - t * discounted / growth)
        });

        if slope.abs() < STEP_TOLERANCE {
            return None;
        }

        let next = rate - npv / slope;
        if (next - rate).abs() < STEP_TOLERANCE {
            return Some(next);
        }
        rate = next.clamp(MIN_RATE, MAX_RATE);
    }

    None
}

/// Like `solve_xirr`, but an empty history has a rate of zero
pub(crate) fn xirr_or_zero(
    flows: &[CashFlow],
    closing_value: f64,
    as_of: NaiveDate,
) -> Option<f64> {
    if flows.is_empty() {
        return Some(0.0);
    }
    solve_xirr(flows, closing_value, as_of)
}
