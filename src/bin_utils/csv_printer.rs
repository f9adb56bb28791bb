use std::io::Write;

use crate::account::TransactionKind;
use csv::Writer;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct AccountRow {
    pub holder: String,
    pub opening_balance: Decimal,
    pub balance: Decimal,
}

#[derive(Debug, Serialize)]
pub struct HistoryRow {
    pub holder: String,
    pub seq: usize,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub counterparty: Option<String>,
}

pub fn print_accounts<W>(
    output: &mut W,
    accounts: impl Iterator<Item = AccountRow>,
) -> anyhow::Result<()>
where
    W: Write,
{
    print_rows(output, accounts)
}

pub fn print_history<W>(
    output: &mut W,
    entries: impl Iterator<Item = HistoryRow>,
) -> anyhow::Result<()>
where
    W: Write,
{
    print_rows(output, entries)
}

fn print_rows<W, T>(output: &mut W, rows: impl Iterator<Item = T>) -> anyhow::Result<()>
where
    W: Write,
    T: Serialize,
{
    let mut writer = Writer::from_writer(output);
    for row in rows {
        if let Err(err) = writer.serialize(row) {
            anyhow::bail!("Failed to write to CSV: {err}")
        }
    }
    // Ensure all data is flushed to the output
    if let Err(err) = writer.flush() {
        anyhow::bail!("Failed to flush CSV writer: {err}")
    }
    Ok(())
}
