//! Wire-to-engine conversions.
//!
//! Upstream payloads carry decimal dollars; everything past this module is
//! integer cents. Conversion rounds to the nearest cent, which also absorbs
//! the float noise the services introduce.

use api_types::BalanceDirection;
use api_types::expense::{ExpenseView, ParticipantView};
use api_types::friend::BreakdownGroup;
use chrono::Utc;
use ledger::{Expense, GroupBalance, GroupSlug, Money, Participant};

pub fn expense(view: &ExpenseView) -> Expense {
    Expense {
        id: view.id.clone(),
        total: Money::from_dollars(view.total_amount),
        note: view.note.clone(),
        group_label: view.group_name.clone(),
        payer_id: view.payer.id.clone(),
        participants: view.participants.iter().map(participant).collect(),
        created_at: view
            .created_at
            .map_or_else(Utc::now, |at| at.with_timezone(&Utc)),
    }
}

fn participant(view: &ParticipantView) -> Participant {
    Participant {
        user_id: view.user.id.clone(),
        user_name: view.user.name.clone(),
        amount: Money::from_dollars(view.amount),
        is_payer: view.is_payer,
    }
}

/// Signed group balance from a breakdown row. The wire keeps magnitude and
/// direction apart; the engine wants one signed amount.
pub fn group_balance(group: &BreakdownGroup) -> GroupBalance {
    let magnitude = Money::from_dollars(group.amount).abs();
    let amount = match group.direction {
        BalanceDirection::OwesYou => magnitude,
        BalanceDirection::YouOwe => -magnitude,
    };
    GroupBalance {
        slug: GroupSlug::from_raw(group.slug.clone()),
        label: group.label.clone(),
        amount,
        // A friend breakdown is always pairwise.
        member_count: 2,
    }
}
