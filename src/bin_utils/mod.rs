//! Bootstraps [`toy_bank`](crate) for the command line: reads an operation script,
//! runs it against a fresh registry and prints the resulting accounts.

use std::io::{Read, Write};

use crate::processor::{
    OperationProcessError, OperationProcessor, in_memory_processor::InMemoryOperationProcessor,
};
use anyhow::{Context, Result};
use csv_parser::CsvOperationParser;
use csv_printer::{AccountRow, HistoryRow, print_accounts, print_history};
pub mod csv_parser;
pub mod csv_printer;

pub struct Service<'w, R, W: 'w> {
    pub input: R,
    pub output: &'w mut W,
    /// Print every account history after the balances
    pub with_history: bool,
    pub error_printer: Box<dyn FnMut(u64, OperationProcessError)>,
}

impl<'w, R, W> Service<'w, R, W>
where
    R: Read,
    W: Write + 'w,
{
    pub fn run(mut self) -> Result<()> {
        let parser = CsvOperationParser::new(self.input);

        let mut processor = InMemoryOperationProcessor::default();

        for (line, row) in parser {
            let row = row.with_context(|| format!("Malformed operation at line {line}"))?;
            if let Err(err) = processor.process_operation(
                row.kind,
                &row.account,
                row.amount,
                row.counterparty.as_deref(),
            ) {
                (self.error_printer)(line, err);
            }
        }

        let accounts = processor.registry.accounts();
        print_accounts(
            &mut *self.output,
            accounts.iter().map(|acc| AccountRow {
                holder: acc.holder().to_owned(),
                opening_balance: acc.opening_balance(),
                balance: acc.check_balance(),
            }),
        )?;

        if self.with_history {
            writeln!(self.output)?;
            print_history(
                &mut *self.output,
                accounts.iter().flat_map(|acc| {
                    let holder = acc.holder();
                    acc.history()
                        .into_iter()
                        .enumerate()
                        .map(move |(idx, tx)| HistoryRow {
                            holder: holder.to_owned(),
                            seq: idx + 1,
                            kind: tx.kind(),
                            amount: tx.amount(),
                            counterparty: tx.counterparty().map(ToOwned::to_owned),
                        })
                }),
            )?;
        }
        Ok(())
    }
}
