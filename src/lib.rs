/// Account balance and transaction log management.
/// Every change is validated into a transaction record first, then applied.
pub mod account;

/// Owning collection of accounts, keyed by unique holder name.
pub mod registry;

/// Operation commands that later are executed against [`registry`] and [`account`].
pub mod command;

/// Operation processor interface, plus "in memory" implementation.
/// Coordinates command parsing and dispatching to accounts.
pub mod processor;

/// CSV script runner used by the binary and the integration tests.
pub mod bin_utils;
