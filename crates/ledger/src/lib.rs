//! Pure ledger engine for the expense-splitting client.
//!
//! The engine owns no persistent state: balances are derived fresh from the
//! expense and settlement history supplied by the caller, never cached. All
//! monetary arithmetic happens in integer cents via [`Money`].

pub use aggregate::{
    Expense, GroupBalance, GroupSlug, LedgerSummary, Participant, aggregate, normalize_group_label,
    viewer_delta,
};
pub use error::LedgerError;
pub use money::{CENT_TOLERANCE, Money};
pub use settlement::{Direction, SettleAllPlan, SettlementOutcome, settle_all, settle_group};
pub use split::{Share, redistribute, split_evenly, validate_shares};

mod aggregate;
mod error;
mod money;
mod settlement;
mod split;

type LedgerResult<T> = Result<T, LedgerError>;
