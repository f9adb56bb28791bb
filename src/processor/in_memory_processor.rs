use rust_decimal::Decimal;
use tracing::warn;

use crate::{
    command::{BankCommand, OperationKind},
    registry::AccountRegistry,
};

use super::{OperationProcessError, OperationProcessor};

#[derive(Default)]
pub struct InMemoryOperationProcessor {
    pub registry: AccountRegistry,
}

impl InMemoryOperationProcessor {
    fn execute(&self, command: BankCommand) -> Result<(), OperationProcessError> {
        match command {
            BankCommand::Open {
                holder,
                initial_deposit,
            } => {
                self.registry.create_account(holder, initial_deposit)?;
            }
            BankCommand::Deposit { holder, amount } => {
                self.registry.get_account(&holder)?.deposit(amount)?;
            }
            BankCommand::Withdraw { holder, amount } => {
                self.registry.get_account(&holder)?.withdraw(amount)?;
            }
            BankCommand::Transfer {
                holder,
                amount,
                recipient,
            } => {
                let sender = self.registry.get_account(&holder)?;
                let recipient = self.registry.get_account(&recipient)?;
                sender.transfer(amount, &recipient)?;
            }
        };
        Ok(())
    }
}

impl OperationProcessor for InMemoryOperationProcessor {
    fn process_operation(
        &mut self,
        kind: OperationKind,
        holder: &str,
        amount: Option<Decimal>,
        counterparty: Option<&str>,
    ) -> Result<(), OperationProcessError> {
        let result = BankCommand::parse_command(kind, holder, amount, counterparty)
            .map_err(OperationProcessError::from)
            .and_then(|command| self.execute(command));
        if let Err(err) = &result {
            warn!(?kind, holder, %err, "operation rejected");
        }
        result
    }
}
