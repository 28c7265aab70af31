use chrono::Utc;

use ledger::{
    Direction, Expense, GroupSlug, LedgerError, Money, Participant, Share, aggregate, redistribute,
    settle_all, settle_group, split_evenly, validate_shares,
};

fn participant(id: &str, name: &str, cents: i64, is_payer: bool) -> Participant {
    Participant {
        user_id: id.to_string(),
        user_name: name.to_string(),
        amount: Money::new(cents),
        is_payer,
    }
}

fn expense(id: &str, group: Option<&str>, payer: &str, participants: Vec<Participant>) -> Expense {
    let total = participants.iter().map(|p| p.amount).sum();
    Expense {
        id: id.to_string(),
        total,
        note: String::new(),
        group_label: group.map(str::to_string),
        payer_id: payer.to_string(),
        participants,
        created_at: Utc::now(),
    }
}

#[test]
fn split_then_aggregate_then_settle_round_trip() {
    // Viewer fronts $100.00 for a trip with two friends.
    let shares = split_evenly(Money::new(10_000), 3);
    assert_eq!(shares, vec![Money::new(3334), Money::new(3333), Money::new(3333)]);

    let trip = expense(
        "e1",
        Some("Glow Trip"),
        "viewer",
        vec![
            participant("viewer", "Viewer", 0, true),
            participant("friend-a", "Sarah Chen", 3334, false),
            participant("friend-b", "Mike Ross", 3333, false),
        ],
    );
    // A friend fronts dinner; viewer owes their share back.
    let dinner = expense(
        "e2",
        Some("Dinner"),
        "friend-a",
        vec![
            participant("friend-a", "Sarah Chen", 0, true),
            participant("viewer", "Viewer", 2000, false),
        ],
    );

    let summary = aggregate(&[trip, dinner], "viewer");
    assert_eq!(summary.friend_balance("friend-a"), Money::new(1334));
    assert_eq!(summary.friend_balance("friend-b"), Money::new(3333));
    assert_eq!(summary.net_balance(), Money::new(4667));

    let groups = summary.sorted_groups();
    assert_eq!(groups.len(), 2);
    // Presentation order: biggest magnitude first.
    assert_eq!(groups[0].slug, GroupSlug::from_raw("glow-trip"));
    assert_eq!(groups[0].amount, Money::new(6667));
    assert_eq!(groups[1].slug, GroupSlug::from_raw("dinner"));
    assert_eq!(groups[1].amount, Money::new(-2000));

    // Partially settle the trip, then clear the remainder.
    let outstanding = groups[0].amount.abs();
    let partial = settle_group(outstanding, Money::new(4000)).unwrap();
    assert_eq!(partial.new_outstanding, Money::new(2667));
    assert!(!partial.cleared);

    let rest = settle_group(partial.new_outstanding, Money::new(2667)).unwrap();
    assert_eq!(rest.new_outstanding, Money::ZERO);
    assert!(rest.cleared);
}

#[test]
fn settle_all_covers_every_outstanding_group() {
    let expenses = vec![
        expense(
            "e1",
            Some("Trip"),
            "viewer",
            vec![
                participant("viewer", "Viewer", 0, true),
                participant("friend-a", "Ada", 5000, false),
            ],
        ),
        expense(
            "e2",
            Some("Dinner"),
            "friend-a",
            vec![
                participant("friend-a", "Ada", 0, true),
                participant("viewer", "Viewer", 2500, false),
            ],
        ),
    ];
    let summary = aggregate(&expenses, "viewer");
    let groups = summary.sorted_groups();

    let plan = settle_all(&groups).unwrap();
    assert_eq!(plan.count, 2);
    assert_eq!(plan.total, Money::new(7500));

    // Applying each request clears its group.
    for (slug, amount) in &plan.requests {
        let outstanding = summary.group_balance(slug).abs();
        let outcome = settle_group(outstanding, *amount).unwrap();
        assert!(outcome.cleared, "group {slug} not cleared");
    }
}

#[test]
fn manual_share_survives_total_changes() {
    let mut shares = vec![
        Share::Auto(Money::ZERO),
        Share::Auto(Money::ZERO),
        Share::Auto(Money::ZERO),
    ];
    redistribute(Money::new(9000), &mut shares);
    assert_eq!(shares.iter().map(|s| s.amount().cents()).sum::<i64>(), 9000);

    // One participant pins their share, the rest keeps absorbing the total.
    shares[1] = Share::Manual(Money::new(1000));
    redistribute(Money::new(12_000), &mut shares);
    assert_eq!(shares[1].amount(), Money::new(1000));
    assert_eq!(shares[0].amount(), Money::new(5500));
    assert_eq!(shares[2].amount(), Money::new(5500));

    let total: Money = shares.iter().map(|s| s.amount()).sum();
    assert!(validate_shares(Money::new(12_000), shares.iter().map(|s| s.amount())).is_ok());
    assert_eq!(total, Money::new(12_000));
}

#[test]
fn commit_validation_runs_before_any_side_effect() {
    let total = Money::from_commit("100.00");
    let err = validate_shares(total, [Money::new(3000), Money::new(3000)]).unwrap_err();
    assert_eq!(
        err,
        LedgerError::ShareSumMismatch {
            assigned: Money::new(6000),
            total: Money::new(10_000),
        }
    );
    assert_eq!(err.to_string(), "Assigned shares must match the total amount.");
}

#[test]
fn settlement_direction_matches_group_sign() {
    let summary = aggregate(
        &[expense(
            "e1",
            Some("Rent"),
            "friend-a",
            vec![
                participant("friend-a", "Ada", 0, true),
                participant("viewer", "Viewer", 80_000, false),
            ],
        )],
        "viewer",
    );
    let groups = summary.sorted_groups();
    assert_eq!(Direction::of(groups[0].amount), Direction::YouOwe);
    assert_eq!(Direction::of(groups[0].amount).as_str(), "you_owe");
}
