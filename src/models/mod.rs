use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Side of an order. The sign of `Transaction::quantity` always agrees with it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    /// +1 for buys, -1 for sells
    pub fn sign(self) -> f64 {
        match self {
            Direction::Buy => 1.0,
            Direction::Sell => -1.0,
        }
    }

    /// Rank used when exposing the holding boundary: sells come first
    pub fn holding_rank(self) -> u8 {
        match self {
            Direction::Sell => 0,
            Direction::Buy => 1,
        }
    }
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(Direction::Buy),
            "SELL" => Ok(Direction::Sell),
            other => Err(format!("'{}' is not a valid order direction", other)),
        }
    }
}

/// A single executed order in canonical, signed form.
///
/// Amounts follow the sign of the quantity: buys carry a positive cost,
/// sells carry negative proceeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Fund name; milestone labels are appended as " (<label>)"
    pub fund: String,
    pub date: NaiveDate,
    pub direction: Direction,
    pub quantity: f64,
    pub average_price: f64,
    pub amount: f64,
    pub last_price: f64,
    /// Current value of the position at `last_price`
    pub market_value: f64,
    pub profit: f64,
}

impl Transaction {
    /// Append a milestone label to the fund column
    pub fn add_label(&mut self, label: &str) {
        self.fund.push_str(" (");
        self.fund.push_str(label);
        self.fund.push(')');
    }
}

/// One order row as exported by the broker, kept as text until normalization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawOrder {
    pub fund: String,
    pub status: String,
    pub order_timestamp: String,
    pub transaction_type: String,
    pub quantity: String,
    pub amount: String,
    pub last_price: String,
    pub average_price: String,
}

impl RawOrder {
    pub fn is_complete(&self) -> bool {
        self.status.trim().eq_ignore_ascii_case("complete")
    }
}

/// Both views of one fund produced by a breakdown run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundLedger {
    pub fund: String,
    /// Normalized transactions in execution order, untouched
    pub by_date: Vec<Transaction>,
    /// Sells first, then buys, split and labelled at the milestones
    pub by_holding: Vec<Transaction>,
    /// Index into `by_holding` where the still-held units begin
    pub held_from: Option<usize>,
}

impl FundLedger {
    /// Transactions still held after all sells are accounted for
    pub fn held(&self) -> &[Transaction] {
        match self.held_from {
            Some(start) => &self.by_holding[start.min(self.by_holding.len())..],
            None => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_parse() {
        assert_eq!("BUY".parse::<Direction>().unwrap(), Direction::Buy);
        assert_eq!(" sell ".parse::<Direction>().unwrap(), Direction::Sell);
        assert!("DIVIDEND".parse::<Direction>().is_err());
    }

    #[test]
    fn test_add_label_appends() {
        let mut txn = Transaction {
            fund: "FundX".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            direction: Direction::Buy,
            quantity: 1.0,
            average_price: 1.0,
            amount: 1.0,
            last_price: 1.0,
            market_value: 1.0,
            profit: 0.0,
        };

        txn.add_label("Holding start");
        txn.add_label("Profit reached 25000");

        assert_eq!(txn.fund, "FundX (Holding start) (Profit reached 25000)");
    }

    #[test]
    fn test_raw_order_status() {
        let mut raw = RawOrder {
            status: "COMPLETE".to_string(),
            ..Default::default()
        };
        assert!(raw.is_complete());

        raw.status = "REJECTED".to_string();
        assert!(!raw.is_complete());
    }
}
