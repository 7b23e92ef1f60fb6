//! Order history CSV import.
//!
//! Reads the broker's mutual fund order export. Only the columns the breakdown
//! needs are picked up by name; everything else in the file is ignored. Values
//! stay text here so normalization can report which field is malformed.

use anyhow::{Context, Result};
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::models::RawOrder;

pub fn read_orders<R: Read>(reader: R) -> Result<Vec<RawOrder>> {
    let mut csv_reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);

    let mut orders = Vec::new();
    for (line, row) in csv_reader.deserialize::<RawOrder>().enumerate() {
        // +2: header line and 1-based numbering
        let order = row.with_context(|| format!("Malformed order row at line {}", line + 2))?;
        orders.push(order);
    }

    Ok(orders)
}

pub fn read_orders_file(path: &Path) -> Result<Vec<RawOrder>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open order file {}", path.display()))?;
    let orders = read_orders(file)
        .with_context(|| format!("Failed to read order file {}", path.display()))?;

    log::info!("Read {} orders from {}", orders.len(), path.display());
    Ok(orders)
}
