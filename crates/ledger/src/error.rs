//! The module contains the errors the ledger engine can return.
//!
//! Every variant is a validation failure: the engine is a pure function over
//! caller-supplied data, so nothing here is retried or fatal. Callers surface
//! the message verbatim.

use thiserror::Error;

use crate::Money;

/// Ledger validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Settlement amount must be greater than zero.")]
    SettlementNotPositive { requested: Money },
    #[error("Cannot settle more than the outstanding amount.")]
    SettlementExceedsOutstanding { outstanding: Money, requested: Money },
    #[error("Nothing left to settle for this group.")]
    NothingOutstanding,
    #[error("All shared groups are already settled.")]
    NoOutstandingGroups,
    #[error("Assigned shares must match the total amount.")]
    ShareSumMismatch { assigned: Money, total: Money },
    #[error("Total amount must be greater than zero.")]
    TotalNotPositive { total: Money },
}
