use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use parking_lot::{Mutex, MutexGuard};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

pub type AccountId = u64;

static NEXT_ACCOUNT_ID: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    TransferOut,
    TransferIn,
}

/// Single entry of the account history.
/// Entries are only ever appended, and the balance is derived from them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transaction {
    Deposit { amount: Decimal },
    Withdrawal { amount: Decimal },
    TransferOut { amount: Decimal, to: String },
    TransferIn { amount: Decimal, from: String },
}

impl Transaction {
    pub fn kind(&self) -> TransactionKind {
        match self {
            Transaction::Deposit { .. } => TransactionKind::Deposit,
            Transaction::Withdrawal { .. } => TransactionKind::Withdrawal,
            Transaction::TransferOut { .. } => TransactionKind::TransferOut,
            Transaction::TransferIn { .. } => TransactionKind::TransferIn,
        }
    }

    pub fn amount(&self) -> Decimal {
        match self {
            Transaction::Deposit { amount }
            | Transaction::Withdrawal { amount }
            | Transaction::TransferOut { amount, .. }
            | Transaction::TransferIn { amount, .. } => *amount,
        }
    }

    /// Holder name of the other side of a transfer
    pub fn counterparty(&self) -> Option<&str> {
        match self {
            Transaction::TransferOut { to, .. } => Some(to),
            Transaction::TransferIn { from, .. } => Some(from),
            Transaction::Deposit { .. } | Transaction::Withdrawal { .. } => None,
        }
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transaction::Deposit { amount } => write!(f, "Deposit {amount}"),
            Transaction::Withdrawal { amount } => write!(f, "Withdrawal {amount}"),
            Transaction::TransferOut { amount, to } => write!(f, "Transfer-out {amount} to {to}"),
            Transaction::TransferIn { amount, from } => {
                write!(f, "Transfer-in {amount} from {from}")
            }
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccountError {
    #[error("Amount must be positive, got {amount}")]
    InvalidAmount { amount: Decimal },
    #[error("Insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds {
        requested: Decimal,
        available: Decimal,
    },
    #[error("Cannot transfer funds to the same account")]
    SelfTransfer,
    #[error("Crediting {amount} would overflow balance {balance}")]
    BalanceOverflow { amount: Decimal, balance: Decimal },
}

/// Mutable part of an account, always accessed under the account lock.
#[derive(Debug, Default)]
struct Ledger {
    balance: Decimal,
    history: Vec<Transaction>,
}

impl Ledger {
    fn apply(&mut self, transaction: Transaction) {
        match &transaction {
            Transaction::Deposit { amount } | Transaction::TransferIn { amount, .. } => {
                self.balance += *amount;
            }
            Transaction::Withdrawal { amount } | Transaction::TransferOut { amount, .. } => {
                self.balance -= *amount;
            }
        }
        self.history.push(transaction);
    }

    fn handle_deposit(&self, amount: Decimal) -> Result<Transaction, AccountError> {
        ensure_positive(amount)?;
        self.ensure_creditable(amount)?;
        Ok(Transaction::Deposit { amount })
    }

    fn handle_withdraw(&self, amount: Decimal) -> Result<Transaction, AccountError> {
        self.ensure_covered(amount)?;
        Ok(Transaction::Withdrawal { amount })
    }

    /// Returns the pair of entries for sender and recipient, in that order.
    /// Both sides are validated before either entry exists.
    fn handle_transfer(
        &self,
        recipient_ledger: &Ledger,
        amount: Decimal,
        sender: &str,
        recipient: &str,
    ) -> Result<(Transaction, Transaction), AccountError> {
        self.ensure_covered(amount)?;
        recipient_ledger.ensure_creditable(amount)?;
        Ok((
            Transaction::TransferOut {
                amount,
                to: recipient.to_owned(),
            },
            Transaction::TransferIn {
                amount,
                from: sender.to_owned(),
            },
        ))
    }

    fn ensure_creditable(&self, amount: Decimal) -> Result<(), AccountError> {
        match self.balance.checked_add(amount) {
            Some(_) => Ok(()),
            None => Err(AccountError::BalanceOverflow {
                amount,
                balance: self.balance,
            }),
        }
    }

    fn ensure_covered(&self, amount: Decimal) -> Result<(), AccountError> {
        ensure_positive(amount)?;
        if self.balance >= amount {
            Ok(())
        } else {
            Err(AccountError::InsufficientFunds {
                requested: amount,
                available: self.balance,
            })
        }
    }
}

fn ensure_positive(amount: Decimal) -> Result<(), AccountError> {
    if amount > Decimal::ZERO {
        Ok(())
    } else {
        Err(AccountError::InvalidAmount { amount })
    }
}

/// Named balance holder. Instances are created by [`crate::registry::AccountRegistry`]
/// and shared with callers as `Arc<Account>`.
///
/// Every operation either applies completely or returns an error and leaves
/// balance and history untouched.
#[derive(Debug)]
pub struct Account {
    id: AccountId,
    holder: String,
    opening_balance: Decimal,
    ledger: Mutex<Ledger>,
}

impl Account {
    pub(crate) fn new(holder: String, opening_balance: Decimal) -> Self {
        Self {
            id: NEXT_ACCOUNT_ID.fetch_add(1, Ordering::Relaxed),
            holder,
            opening_balance,
            ledger: Mutex::new(Ledger {
                balance: opening_balance,
                history: Vec::new(),
            }),
        }
    }

    pub fn id(&self) -> AccountId {
        self.id
    }

    pub fn holder(&self) -> &str {
        &self.holder
    }

    pub fn opening_balance(&self) -> Decimal {
        self.opening_balance
    }

    pub fn check_balance(&self) -> Decimal {
        self.ledger.lock().balance
    }

    /// Snapshot of the transaction log, oldest first
    pub fn history(&self) -> Vec<Transaction> {
        self.ledger.lock().history.clone()
    }

    pub fn deposit(&self, amount: Decimal) -> Result<(), AccountError> {
        let mut ledger = self.ledger.lock();
        let transaction = ledger.handle_deposit(amount)?;
        debug!(holder = %self.holder, %transaction, "applying transaction");
        ledger.apply(transaction);
        Ok(())
    }

    pub fn withdraw(&self, amount: Decimal) -> Result<(), AccountError> {
        let mut ledger = self.ledger.lock();
        let transaction = ledger.handle_withdraw(amount)?;
        debug!(holder = %self.holder, %transaction, "applying transaction");
        ledger.apply(transaction);
        Ok(())
    }

    /// Moves `amount` to `recipient`.
    /// Both accounts stay locked until debit and credit are recorded on both sides.
    pub fn transfer(&self, amount: Decimal, recipient: &Account) -> Result<(), AccountError> {
        if self.id == recipient.id {
            return Err(AccountError::SelfTransfer);
        }
        let (mut sender_ledger, mut recipient_ledger) = self.lock_with(recipient);
        let (transfer_out, transfer_in) = sender_ledger.handle_transfer(
            &recipient_ledger,
            amount,
            &self.holder,
            &recipient.holder,
        )?;
        debug!(holder = %self.holder, transaction = %transfer_out, "applying transaction");
        sender_ledger.apply(transfer_out);
        debug!(holder = %recipient.holder, transaction = %transfer_in, "applying transaction");
        recipient_ledger.apply(transfer_in);
        Ok(())
    }

    /// Locks both ledgers in ascending id order, returns `(self, other)` guards.
    fn lock_with<'a>(
        &'a self,
        other: &'a Account,
    ) -> (MutexGuard<'a, Ledger>, MutexGuard<'a, Ledger>) {
        if self.id < other.id {
            let own = self.ledger.lock();
            let others = other.ledger.lock();
            (own, others)
        } else {
            let others = other.ledger.lock();
            let own = self.ledger.lock();
            (own, others)
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::prelude::FromPrimitive;

    use super::*;

    fn dec(value: i64) -> Decimal {
        Decimal::from_i64(value).unwrap()
    }

    fn account(holder: &str, opening_balance: i64) -> Account {
        Account::new(holder.to_owned(), dec(opening_balance))
    }

    /// Opening balance plus every credit minus every debit found in the history
    fn replayed_balance(acc: &Account) -> Decimal {
        acc.history()
            .iter()
            .fold(acc.opening_balance(), |balance, tx| match tx.kind() {
                TransactionKind::Deposit | TransactionKind::TransferIn => balance + tx.amount(),
                TransactionKind::Withdrawal | TransactionKind::TransferOut => {
                    balance - tx.amount()
                }
            })
    }

    #[test]
    fn apply_transactions() {
        let mut ledger = Ledger::default();
        ledger.apply(Transaction::Deposit { amount: dec(10) });
        assert_eq!(ledger.balance, dec(10));
        ledger.apply(Transaction::Withdrawal { amount: dec(3) });
        assert_eq!(ledger.balance, dec(7));
        ledger.apply(Transaction::TransferIn {
            amount: dec(5),
            from: "Jane Doe".to_owned(),
        });
        assert_eq!(ledger.balance, dec(12));
        // entries are the source of truth, there's no more validation happening
        ledger.apply(Transaction::TransferOut {
            amount: dec(20),
            to: "Jane Doe".to_owned(),
        });
        assert_eq!(ledger.balance, dec(-8));
        assert_eq!(
            ledger.history.iter().map(Transaction::kind).collect::<Vec<_>>(),
            vec![
                TransactionKind::Deposit,
                TransactionKind::Withdrawal,
                TransactionKind::TransferIn,
                TransactionKind::TransferOut,
            ]
        );
    }

    #[test]
    fn deposit() {
        let acc = account("John Doe", 0);
        acc.deposit(dec(500)).unwrap();
        assert_eq!(acc.check_balance(), dec(500));
        assert_eq!(acc.history(), vec![Transaction::Deposit { amount: dec(500) }]);

        let fraction = Decimal::new(25, 2);
        acc.deposit(fraction).unwrap();
        assert_eq!(acc.check_balance(), Decimal::new(50025, 2));
    }

    #[test]
    fn deposit_rejects_non_positive_amount() {
        let acc = account("John Doe", 100);
        for amount in [dec(-50), Decimal::ZERO] {
            let err = acc.deposit(amount).unwrap_err();
            assert_eq!(err, AccountError::InvalidAmount { amount });
        }
        assert_eq!(acc.check_balance(), dec(100));
        assert!(acc.history().is_empty());
    }

    #[test]
    fn withdraw() {
        let acc = account("John Doe", 1000);
        acc.withdraw(dec(200)).unwrap();
        assert_eq!(acc.check_balance(), dec(800));
        acc.withdraw(dec(800)).unwrap();
        assert_eq!(acc.check_balance(), Decimal::ZERO);
        assert_eq!(
            acc.history(),
            vec![
                Transaction::Withdrawal { amount: dec(200) },
                Transaction::Withdrawal { amount: dec(800) },
            ]
        );
    }

    #[test]
    fn withdraw_more_than_balance() {
        let acc = account("John Doe", 100);
        let err = acc.withdraw(dec(200)).unwrap_err();
        assert_eq!(
            err,
            AccountError::InsufficientFunds {
                requested: dec(200),
                available: dec(100),
            }
        );
        assert_eq!(
            err.to_string(),
            "Insufficient funds: requested 200, available 100"
        );
        assert_eq!(acc.check_balance(), dec(100));
        assert!(acc.history().is_empty());
    }

    #[test]
    fn withdraw_checks_amount_before_funds() {
        let acc = account("John Doe", 0);
        let err = acc.withdraw(dec(-1)).unwrap_err();
        assert!(matches!(err, AccountError::InvalidAmount { .. }));
        let err = acc.withdraw(dec(1)).unwrap_err();
        assert!(matches!(err, AccountError::InsufficientFunds { .. }));
    }

    #[test]
    fn transfer() {
        let john = account("John Doe", 1000);
        let jane = account("Jane Doe", 500);
        john.transfer(dec(300), &jane).unwrap();

        assert_eq!(john.check_balance(), dec(700));
        assert_eq!(jane.check_balance(), dec(800));
        assert_eq!(
            john.history(),
            vec![Transaction::TransferOut {
                amount: dec(300),
                to: "Jane Doe".to_owned()
            }]
        );
        assert_eq!(
            jane.history(),
            vec![Transaction::TransferIn {
                amount: dec(300),
                from: "John Doe".to_owned()
            }]
        );

        // recipient has lower id, so it gets locked first
        assert!(john.id() < jane.id());
        jane.transfer(dec(800), &john).unwrap();
        assert_eq!(jane.check_balance(), Decimal::ZERO);
        assert_eq!(john.check_balance(), dec(1500));
        assert_eq!(replayed_balance(&john), john.check_balance());
        assert_eq!(replayed_balance(&jane), jane.check_balance());
    }

    #[test]
    fn failed_transfer_changes_nothing() {
        let john = account("John Doe", 100);
        let jane = account("Jane Doe", 50);

        let err = john.transfer(dec(101), &jane).unwrap_err();
        assert!(matches!(err, AccountError::InsufficientFunds { .. }));
        let err = john.transfer(Decimal::ZERO, &jane).unwrap_err();
        assert!(matches!(err, AccountError::InvalidAmount { .. }));

        assert_eq!(john.check_balance(), dec(100));
        assert_eq!(jane.check_balance(), dec(50));
        assert!(john.history().is_empty());
        assert!(jane.history().is_empty());
    }

    #[test]
    fn deposit_overflow() {
        let acc = Account::new("Rich".to_owned(), Decimal::MAX);
        let err = acc.deposit(Decimal::ONE).unwrap_err();
        assert_eq!(
            err,
            AccountError::BalanceOverflow {
                amount: Decimal::ONE,
                balance: Decimal::MAX,
            }
        );
        assert_eq!(acc.check_balance(), Decimal::MAX);
        assert!(acc.history().is_empty());

        // still accepts credits that fit
        let acc = Account::new("Almost".to_owned(), Decimal::MAX - dec(10));
        acc.deposit(dec(10)).unwrap();
        assert_eq!(acc.check_balance(), Decimal::MAX);
        assert_eq!(replayed_balance(&acc), Decimal::MAX);
    }

    #[test]
    fn transfer_into_full_account() {
        let sender = account("A", 10);
        let recipient = Account::new("B".to_owned(), Decimal::MAX);

        let err = sender.transfer(dec(10), &recipient).unwrap_err();
        assert!(matches!(err, AccountError::BalanceOverflow { .. }));
        assert_eq!(sender.check_balance(), dec(10));
        assert_eq!(recipient.check_balance(), Decimal::MAX);
        assert!(sender.history().is_empty());
        assert!(recipient.history().is_empty());

        // same outcome when the recipient has the lower id and is locked first
        let full = Account::new("C".to_owned(), Decimal::MAX);
        let late_sender = account("D", 10);
        assert!(full.id() < late_sender.id());
        let err = late_sender.transfer(dec(10), &full).unwrap_err();
        assert!(matches!(err, AccountError::BalanceOverflow { .. }));
        assert_eq!(late_sender.check_balance(), dec(10));
        assert_eq!(full.check_balance(), Decimal::MAX);
        assert!(late_sender.history().is_empty());
        assert!(full.history().is_empty());
    }

    #[test]
    fn transfer_to_self() {
        let john = account("John Doe", 100);
        let err = john.transfer(dec(10), &john).unwrap_err();
        assert_eq!(err, AccountError::SelfTransfer);
        assert_eq!(john.check_balance(), dec(100));
        assert!(john.history().is_empty());
    }

    #[test]
    fn display_transactions() {
        let out = Transaction::TransferOut {
            amount: dec(300),
            to: "Jane Doe".to_owned(),
        };
        assert_eq!(out.to_string(), "Transfer-out 300 to Jane Doe");
        assert_eq!(out.counterparty(), Some("Jane Doe"));
        let deposit = Transaction::Deposit { amount: dec(500) };
        assert_eq!(deposit.to_string(), "Deposit 500");
        assert_eq!(deposit.counterparty(), None);
    }
}
