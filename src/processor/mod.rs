use rust_decimal::Decimal;
use thiserror::Error;

use crate::{
    account::AccountError,
    command::{BankCommandError, OperationKind},
    registry::RegistryError,
};

pub mod in_memory_processor;

#[derive(Debug, Error)]
pub enum OperationProcessError {
    #[error(transparent)]
    CommandErr(#[from] BankCommandError),
    #[error(transparent)]
    RegistryErr(#[from] RegistryError),
    #[error(transparent)]
    AccountErr(#[from] AccountError),
}

pub trait OperationProcessor {
    fn process_operation(
        &mut self,
        kind: OperationKind,
        holder: &str,
        amount: Option<Decimal>,
        counterparty: Option<&str>,
    ) -> Result<(), OperationProcessError>;
}
