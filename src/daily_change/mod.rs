//! Per-fund daily price change
//!
//! The broker export carries yesterday's closing price. A small JSON file maps
//! fund names to today's change in percent so the valuation can be brought up to
//! date by hand. Funds seen for the first time are written back with 0 so they
//! show up in the file for the next run.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DailyChange {
    percent_by_fund: BTreeMap<String, f64>,
}

impl DailyChange {
    /// Load from a JSON object file. A missing or empty file is an empty map.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("No daily change file at {}, starting empty", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read daily change file {}", path.display()))?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse daily change file {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write daily change file {}", path.display()))
    }

    /// Change in percent, 0 for unknown funds
    pub fn percent(&self, fund: &str) -> f64 {
        self.percent_by_fund.get(fund).copied().unwrap_or(0.0)
    }

    /// Multiplier applied to the reported last price
    pub fn price_factor(&self, fund: &str) -> f64 {
        (100.0 + self.percent(fund)) / 100.0
    }

    pub fn set(&mut self, fund: &str, percent: f64) {
        self.percent_by_fund.insert(fund.to_string(), percent);
    }

    /// Record 0 for every fund not yet present; returns how many were added
    pub fn register_funds<'a, I>(&mut self, funds: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut added = 0;
        for fund in funds {
            if !self.percent_by_fund.contains_key(fund) {
                self.percent_by_fund.insert(fund.to_string(), 0.0);
                added += 1;
            }
        }
        added
    }

    pub fn len(&self) -> usize {
        self.percent_by_fund.len()
    }

    pub fn is_empty(&self) -> bool {
        self.percent_by_fund.is_empty()
    }
}
