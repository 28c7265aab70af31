//! Even-split allocation.
//!
//! Splitting divides the total in integer cents: every participant gets the
//! floor share and the first `total mod n` participants (in list order)
//! absorb one extra cent each, so the shares always sum back to the total.

use crate::{LedgerError, LedgerResult, Money, money::CENT_TOLERANCE};

/// A participant's share of an expense.
///
/// The variant records who last decided the amount: the allocator
/// ([`Share::Auto`]) or the user ([`Share::Manual`]). Redistribution never
/// touches manual shares, the type makes that rule structural instead of a
/// convention on a boolean flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Share {
    /// Allocator-assigned share; rewritten on every redistribution.
    Auto(Money),
    /// User-entered share; preserved across redistributions.
    Manual(Money),
}

impl Share {
    /// The current amount regardless of who assigned it.
    #[must_use]
    pub const fn amount(self) -> Money {
        match self {
            Share::Auto(amount) | Share::Manual(amount) => amount,
        }
    }

    #[must_use]
    pub const fn is_manual(self) -> bool {
        matches!(self, Share::Manual(_))
    }
}

/// Splits `total` into `n` rounding-fair shares.
///
/// Guarantees for every `n ≥ 1`:
/// - the shares sum to `total` exactly
/// - any two shares differ by at most one cent
/// - earlier entries absorb the remainder
///
/// `n == 0` returns an empty vector; a zero total yields all-zero shares.
#[must_use]
pub fn split_evenly(total: Money, n: usize) -> Vec<Money> {
    if n == 0 {
        return Vec::new();
    }

    let count = n as i64;
    let base = total.cents().div_euclid(count);
    let remainder = total.cents().rem_euclid(count) as usize;

    (0..n)
        .map(|idx| {
            if idx < remainder {
                Money::new(base + 1)
            } else {
                Money::new(base)
            }
        })
        .collect()
}

/// Reassigns the automatic shares so the list adds up to `total` again.
///
/// Manual shares are left untouched; whatever remains of the total after
/// subtracting them is split evenly across the automatic entries, in list
/// order. If manual entries already exceed the total, the automatic shares
/// drop to zero and the mismatch surfaces through [`validate_shares`] when
/// the expense is committed.
pub fn redistribute(total: Money, shares: &mut [Share]) {
    let manual_total: Money = shares
        .iter()
        .filter(|share| share.is_manual())
        .map(|share| share.amount())
        .sum();

    let auto_count = shares.iter().filter(|share| !share.is_manual()).count();
    if auto_count == 0 {
        return;
    }

    let remaining = if manual_total.cents() >= total.cents() {
        Money::ZERO
    } else {
        total - manual_total
    };

    let allocation = split_evenly(remaining, auto_count);
    let mut next = allocation.into_iter();
    for share in shares.iter_mut() {
        if let Share::Auto(amount) = share {
            // split_evenly returned exactly auto_count entries
            *amount = next.next().unwrap_or(Money::ZERO);
        }
    }
}

/// Checks that participant shares add up to the expense total.
///
/// A 1-cent slack absorbs decimal-dollar round-trip noise from upstream
/// payloads. Run before any network call so a bad form never leaves the
/// client.
pub fn validate_shares(
    total: Money,
    shares: impl IntoIterator<Item = Money>,
) -> LedgerResult<()> {
    if !total.is_positive() {
        return Err(LedgerError::TotalNotPositive { total });
    }

    let assigned: Money = shares.into_iter().sum();
    if (assigned - total).cents().abs() > CENT_TOLERANCE {
        return Err(LedgerError::ShareSumMismatch { assigned, total });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_absorbs_remainder_in_order() {
        assert_eq!(
            split_evenly(Money::new(1000), 3),
            vec![Money::new(334), Money::new(333), Money::new(333)]
        );
    }

    #[test]
    fn split_sums_back_to_total() {
        for total in [0, 1, 2, 99, 100, 101, 99_999] {
            for n in 1..=7 {
                let shares = split_evenly(Money::new(total), n);
                assert_eq!(shares.len(), n);
                let sum: Money = shares.iter().copied().sum();
                assert_eq!(sum.cents(), total, "total={total} n={n}");
                let max = shares.iter().map(|s| s.cents()).max().unwrap();
                let min = shares.iter().map(|s| s.cents()).min().unwrap();
                assert!(max - min <= 1, "total={total} n={n}");
            }
        }
    }

    #[test]
    fn split_zero_participants_is_empty() {
        assert!(split_evenly(Money::new(1000), 0).is_empty());
    }

    #[test]
    fn split_zero_total_is_all_zero() {
        assert_eq!(
            split_evenly(Money::ZERO, 3),
            vec![Money::ZERO, Money::ZERO, Money::ZERO]
        );
    }

    #[test]
    fn redistribute_preserves_manual_shares() {
        let mut shares = vec![
            Share::Auto(Money::ZERO),
            Share::Manual(Money::new(4000)),
            Share::Auto(Money::ZERO),
        ];
        redistribute(Money::new(10_000), &mut shares);
        assert_eq!(
            shares,
            vec![
                Share::Auto(Money::new(3000)),
                Share::Manual(Money::new(4000)),
                Share::Auto(Money::new(3000)),
            ]
        );
    }

    #[test]
    fn redistribute_handles_manual_overrun() {
        let mut shares = vec![Share::Manual(Money::new(5000)), Share::Auto(Money::ZERO)];
        redistribute(Money::new(3000), &mut shares);
        assert_eq!(shares[1].amount(), Money::ZERO);
        assert_eq!(shares[0].amount(), Money::new(5000));
    }

    #[test]
    fn redistribute_all_manual_is_a_no_op() {
        let mut shares = vec![Share::Manual(Money::new(1)), Share::Manual(Money::new(2))];
        redistribute(Money::new(9999), &mut shares);
        assert_eq!(shares[0].amount(), Money::new(1));
        assert_eq!(shares[1].amount(), Money::new(2));
    }

    #[test]
    fn validate_shares_allows_one_cent_slack() {
        let total = Money::new(1000);
        assert!(validate_shares(total, [Money::new(334), Money::new(333), Money::new(334)]).is_ok());
        assert_eq!(
            validate_shares(total, [Money::new(300), Money::new(300)]),
            Err(LedgerError::ShareSumMismatch {
                assigned: Money::new(600),
                total,
            })
        );
    }

    #[test]
    fn validate_shares_rejects_non_positive_total() {
        assert_eq!(
            validate_shares(Money::ZERO, [Money::ZERO]),
            Err(LedgerError::TotalNotPositive { total: Money::ZERO })
        );
    }
}
