use std::{
    collections::{HashMap, hash_map::Entry},
    sync::Arc,
};

use parking_lot::RwLock;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::info;

use crate::account::Account;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Account holder name must not be empty")]
    EmptyHolderName,
    #[error("Account for `{0}` already exists")]
    DuplicateAccount(String),
    #[error("Account for `{0}` not found")]
    AccountNotFound(String),
    #[error("Initial deposit must not be negative, got {amount}")]
    InvalidInitialDeposit { amount: Decimal },
}

#[derive(Debug, Default)]
struct Accounts {
    ordered: Vec<Arc<Account>>,
    by_holder: HashMap<String, Arc<Account>>,
}

/// Owns every account and keeps holder names unique.
#[derive(Debug, Default)]
pub struct AccountRegistry {
    accounts: RwLock<Accounts>,
}

impl AccountRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens an account for `name`, starting with `initial_deposit` (zero when absent).
    pub fn create_account(
        &self,
        name: impl Into<String>,
        initial_deposit: Option<Decimal>,
    ) -> Result<Arc<Account>, RegistryError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(RegistryError::EmptyHolderName);
        }
        let opening_balance = initial_deposit.unwrap_or_default();
        if opening_balance < Decimal::ZERO {
            return Err(RegistryError::InvalidInitialDeposit {
                amount: opening_balance,
            });
        }

        // lookup and insert must happen under the same guard
        let mut guard = self.accounts.write();
        let accounts = &mut *guard;
        match accounts.by_holder.entry(name) {
            Entry::Occupied(entry) => Err(RegistryError::DuplicateAccount(entry.key().clone())),
            Entry::Vacant(entry) => {
                let account = Arc::new(Account::new(entry.key().clone(), opening_balance));
                entry.insert(Arc::clone(&account));
                accounts.ordered.push(Arc::clone(&account));
                info!(holder = account.holder(), %opening_balance, "account created");
                Ok(account)
            }
        }
    }

    pub fn find_account(&self, name: &str) -> Option<Arc<Account>> {
        self.accounts.read().by_holder.get(name).cloned()
    }

    pub fn get_account(&self, name: &str) -> Result<Arc<Account>, RegistryError> {
        self.find_account(name)
            .ok_or_else(|| RegistryError::AccountNotFound(name.to_owned()))
    }

    /// All accounts in creation order
    pub fn accounts(&self) -> Vec<Arc<Account>> {
        self.accounts.read().ordered.clone()
    }

    pub fn len(&self) -> usize {
        self.accounts.read().ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
