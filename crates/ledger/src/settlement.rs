//! Settlement processing.
//!
//! A settlement reduces an outstanding group balance, partially or in full.
//! The engine only validates and computes; the audit record and the
//! notification side effect belong to the remote collaborator, whose response
//! carries both (`api_types::settlement::SettlementView`).

use crate::{GroupBalance, GroupSlug, LedgerError, LedgerResult, Money};

/// Which way a balance points, as seen from the viewer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// The counterparty owes the viewer.
    OwesYou,
    /// The viewer owes the counterparty.
    YouOwe,
}

impl Direction {
    /// Direction of a signed balance. Zero is treated as [`Direction::YouOwe`]
    /// for display stability; cleared balances never reach display anyway.
    #[must_use]
    pub const fn of(amount: Money) -> Self {
        if amount.is_positive() {
            Direction::OwesYou
        } else {
            Direction::YouOwe
        }
    }

    /// Canonical wire string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Direction::OwesYou => "owes_you",
            Direction::YouOwe => "you_owe",
        }
    }
}

/// Outcome of applying one settlement against an outstanding balance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SettlementOutcome {
    /// Outstanding magnitude left after the settlement.
    pub new_outstanding: Money,
    /// Amount actually applied (always the requested amount on success).
    pub applied: Money,
    /// True when the group dropped below the clearing threshold and leaves
    /// the outstanding views. The settlement history remains for audit.
    pub cleared: bool,
}

/// Plan for settling every outstanding group with one counterparty at once.
///
/// The caller hands the whole plan to the remote collaborator as a single
/// logical transaction: either every group is recorded as settled or, on
/// failure, none are and the in-memory reflection stays untouched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SettleAllPlan {
    /// Full-settlement amount per outstanding group.
    pub requests: Vec<(GroupSlug, Money)>,
    /// Sum of every requested amount.
    pub total: Money,
    /// Number of groups in the plan.
    pub count: usize,
}

/// Applies a settlement request against an outstanding group magnitude.
///
/// `outstanding` is the absolute outstanding amount (direction is tracked
/// separately). Validation runs before anything is mutated anywhere:
/// - the request must be greater than zero
/// - the request must not exceed the outstanding amount
///
/// A partial settlement just decrements; the group stays outstanding until a
/// later settlement clears it.
pub fn settle_group(outstanding: Money, requested: Money) -> LedgerResult<SettlementOutcome> {
    if outstanding.is_cleared() {
        return Err(LedgerError::NothingOutstanding);
    }
    if !requested.is_positive() {
        return Err(LedgerError::SettlementNotPositive { requested });
    }
    if requested > outstanding {
        return Err(LedgerError::SettlementExceedsOutstanding {
            outstanding,
            requested,
        });
    }

    let new_outstanding = outstanding - requested;
    let cleared = new_outstanding.is_cleared();
    tracing::debug!(
        outstanding = outstanding.cents(),
        requested = requested.cents(),
        cleared,
        "settlement applied"
    );
    Ok(SettlementOutcome {
        new_outstanding: if cleared { Money::ZERO } else { new_outstanding },
        applied: requested,
        cleared,
    })
}

/// Builds the full-settlement plan for every currently outstanding group.
///
/// Cleared groups are skipped; an empty outstanding set is a validation
/// error so callers can surface "already settled" without a network call.
pub fn settle_all(groups: &[GroupBalance]) -> LedgerResult<SettleAllPlan> {
    let mut requests = Vec::new();
    let mut total = Money::ZERO;

    for group in groups {
        let magnitude = group.amount.abs();
        if magnitude.is_cleared() {
            continue;
        }
        total += magnitude;
        requests.push((group.slug.clone(), magnitude));
    }

    if requests.is_empty() {
        return Err(LedgerError::NoOutstandingGroups);
    }

    let count = requests.len();
    Ok(SettleAllPlan {
        requests,
        total,
        count,
    })
}
