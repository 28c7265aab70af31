//! Balance aggregation.
//!
//! Folds a list of expenses into signed per-friend and per-group balances as
//! seen from one viewer. The fold is pure and order-independent: running it
//! over any permutation of the same expense list produces identical totals.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};

use crate::Money;

/// Display label used when an expense carries no explicit group.
pub const PERSONAL_SPLIT_LABEL: &str = "Personal split";

/// One row per person on an expense.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Participant {
    pub user_id: String,
    pub user_name: String,
    pub amount: Money,
    pub is_payer: bool,
}

/// An expense as supplied by the external expense store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Expense {
    pub id: String,
    pub total: Money,
    pub note: String,
    /// Free-text group label; empty means a personal split.
    pub group_label: Option<String>,
    pub payer_id: String,
    pub participants: Vec<Participant>,
    pub created_at: DateTime<Utc>,
}

/// Case-insensitive bucket key derived from a group label.
///
/// Lowercased, with non-alphanumeric runs collapsed to `-`. Two labels that
/// differ only in case or punctuation land in the same bucket; the wire
/// contract (settlement requests) is keyed on this slug.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupSlug(String);

impl GroupSlug {
    /// Builds the slug for a display label.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        let mut slug = String::with_capacity(label.len());
        let mut pending_dash = false;
        for ch in label.chars() {
            if ch.is_ascii_alphanumeric() {
                if pending_dash && !slug.is_empty() {
                    slug.push('-');
                }
                pending_dash = false;
                slug.push(ch.to_ascii_lowercase());
            } else {
                pending_dash = true;
            }
        }
        if slug.is_empty() {
            slug.push_str("general");
        }
        Self(slug)
    }

    /// Wraps a slug that already exists on the wire.
    #[must_use]
    pub fn from_raw(slug: impl Into<String>) -> Self {
        Self(slug.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for GroupSlug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derived balance for one group bucket, as seen from the viewer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupBalance {
    pub slug: GroupSlug,
    pub label: String,
    /// Signed: positive = the group owes the viewer.
    pub amount: Money,
    /// Distinct participant names seen across the group's expenses.
    pub member_count: usize,
}

#[derive(Clone, Debug, Default)]
struct GroupAccumulator {
    label: String,
    amount: Money,
    members: BTreeSet<String>,
}

/// Result of folding an expense list for one viewer.
///
/// Balances are derived, never persisted: callers re-run [`aggregate`] after
/// every mutation instead of patching cached values.
#[derive(Clone, Debug, Default)]
pub struct LedgerSummary {
    per_friend: HashMap<String, Money>,
    per_group: HashMap<GroupSlug, GroupAccumulator>,
}

impl LedgerSummary {
    /// Signed balance against one counterparty, zero if none.
    #[must_use]
    pub fn friend_balance(&self, friend_id: &str) -> Money {
        self.per_friend.get(friend_id).copied().unwrap_or(Money::ZERO)
    }

    /// Signed balance for one group bucket, zero if none.
    #[must_use]
    pub fn group_balance(&self, slug: &GroupSlug) -> Money {
        self.per_group
            .get(slug)
            .map(|entry| entry.amount)
            .unwrap_or(Money::ZERO)
    }

    /// Net balance across all counterparties.
    #[must_use]
    pub fn net_balance(&self) -> Money {
        self.per_friend.values().copied().sum()
    }

    /// Outstanding friend balances sorted by descending magnitude.
    ///
    /// Cleared (sub-tolerance) entries are pruned; the ordering is a
    /// presentation policy, ties break on the friend id for determinism.
    #[must_use]
    pub fn sorted_friends(&self) -> Vec<(String, Money)> {
        let mut entries: Vec<(String, Money)> = self
            .per_friend
            .iter()
            .filter(|(_, amount)| !amount.is_cleared())
            .map(|(id, amount)| (id.clone(), *amount))
            .collect();
        entries.sort_by(|a, b| {
            b.1.abs()
                .cmp(&a.1.abs())
                .then_with(|| a.0.cmp(&b.0))
        });
        entries
    }

    /// Outstanding group balances sorted by descending magnitude.
    #[must_use]
    pub fn sorted_groups(&self) -> Vec<GroupBalance> {
        let mut entries: Vec<GroupBalance> = self
            .per_group
            .iter()
            .filter(|(_, entry)| !entry.amount.is_cleared())
            .map(|(slug, entry)| GroupBalance {
                slug: slug.clone(),
                label: entry.label.clone(),
                amount: entry.amount,
                member_count: entry.members.len(),
            })
            .collect();
        entries.sort_by(|a, b| {
            b.amount
                .abs()
                .cmp(&a.amount.abs())
                .then_with(|| a.slug.cmp(&b.slug))
        });
        entries
    }
}

/// Normalizes a group label: trimmed, falling back to the expense note and
/// then to the personal-split bucket.
#[must_use]
pub fn normalize_group_label(group_label: Option<&str>, note: &str) -> String {
    let raw = group_label
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .unwrap_or_else(|| note.trim());
    if raw.is_empty() {
        PERSONAL_SPLIT_LABEL.to_string()
    } else {
        raw.to_string()
    }
}

/// The viewer's signed delta for one expense.
///
/// - viewer paid: `+` the sum of everyone else's shares
/// - viewer owes: `-` the viewer's own share
/// - viewer absent: zero (the expense is excluded)
#[must_use]
pub fn viewer_delta(expense: &Expense, viewer_id: &str) -> Money {
    let Some(viewer_entry) = expense
        .participants
        .iter()
        .find(|part| part.user_id == viewer_id)
    else {
        return Money::ZERO;
    };

    if viewer_entry.is_payer {
        expense
            .participants
            .iter()
            .filter(|part| part.user_id != viewer_id)
            .map(|part| part.amount)
            .sum()
    } else {
        -viewer_entry.amount
    }
}

/// Folds an expense list into per-friend and per-group balances for `viewer_id`.
///
/// Counterparty attribution is per-participant: when the viewer paid, each
/// other participant owes exactly their own share; when someone else paid,
/// the viewer's whole share is owed to that payer. Expenses the viewer is not
/// part of contribute nothing.
#[must_use]
pub fn aggregate(expenses: &[Expense], viewer_id: &str) -> LedgerSummary {
    let mut summary = LedgerSummary::default();

    for expense in expenses {
        let delta = viewer_delta(expense, viewer_id);
        if delta.is_zero() {
            continue;
        }

        let viewer_is_payer = expense
            .participants
            .iter()
            .any(|part| part.user_id == viewer_id && part.is_payer);

        if viewer_is_payer {
            for part in &expense.participants {
                if part.user_id == viewer_id || part.amount.is_zero() {
                    continue;
                }
                *summary
                    .per_friend
                    .entry(part.user_id.clone())
                    .or_insert(Money::ZERO) += part.amount;
            }
        } else {
            *summary
                .per_friend
                .entry(expense.payer_id.clone())
                .or_insert(Money::ZERO) += delta;
        }

        let label = normalize_group_label(expense.group_label.as_deref(), &expense.note);
        let slug = GroupSlug::from_label(&label);
        let entry = summary
            .per_group
            .entry(slug)
            .or_insert_with(|| GroupAccumulator {
                label,
                ..GroupAccumulator::default()
            });
        entry.amount += delta;
        for part in &expense.participants {
            if !part.user_name.is_empty() {
                entry.members.insert(part.user_name.clone());
            }
        }
    }

    summary
}
