use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Open,
    Deposit,
    Withdraw,
    Transfer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BankCommand {
    Open {
        holder: String,
        initial_deposit: Option<Decimal>,
    },
    Deposit {
        holder: String,
        amount: Decimal,
    },
    Withdraw {
        holder: String,
        amount: Decimal,
    },
    Transfer {
        holder: String,
        amount: Decimal,
        recipient: String,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BankCommandError {
    #[error("Amount is required for {kind:?}")]
    AmountRequired { kind: OperationKind },
    #[error("Recipient account is required for Transfer")]
    CounterpartyRequired,
}

impl BankCommand {
    /// Checks that every field the operation needs is present.
    /// Amount sign and balances are validated later, by the account itself.
    pub fn parse_command(
        kind: OperationKind,
        holder: &str,
        amount: Option<Decimal>,
        counterparty: Option<&str>,
    ) -> Result<Self, BankCommandError> {
        let holder = holder.to_owned();
        match kind {
            OperationKind::Open => Ok(Self::Open {
                holder,
                initial_deposit: amount,
            }),
            OperationKind::Deposit => Ok(Self::Deposit {
                holder,
                amount: Self::require_amount(kind, amount)?,
            }),
            OperationKind::Withdraw => Ok(Self::Withdraw {
                holder,
                amount: Self::require_amount(kind, amount)?,
            }),
            OperationKind::Transfer => {
                let amount = Self::require_amount(kind, amount)?;
                let Some(recipient) = counterparty.filter(|name| !name.is_empty()) else {
                    return Err(BankCommandError::CounterpartyRequired);
                };
                Ok(Self::Transfer {
                    holder,
                    amount,
                    recipient: recipient.to_owned(),
                })
            }
        }
    }

    fn require_amount(
        kind: OperationKind,
        amount: Option<Decimal>,
    ) -> Result<Decimal, BankCommandError> {
        amount.ok_or(BankCommandError::AmountRequired { kind })
    }
}
