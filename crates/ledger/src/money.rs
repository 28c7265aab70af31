use std::{
    fmt,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
};

/// Integer-cent tolerance used when comparing amounts that round-tripped
/// through upstream systems still emitting decimal dollars.
pub const CENT_TOLERANCE: i64 = 1;

/// Signed money amount represented as **integer cents**.
///
/// Use this type for **all** monetary values in the engine (balances, shares,
/// settlement amounts) to avoid floating-point drift. Floating point appears
/// only at the wire boundary, where upstream payloads carry decimal dollars.
///
/// The value is signed:
/// - positive = the counterparty owes the viewer
/// - negative = the viewer owes the counterparty
///
/// # Examples
///
/// ```rust
/// use ledger::Money;
///
/// let amount = Money::new(12_34);
/// assert_eq!(amount.cents(), 1234);
/// assert_eq!(amount.to_string(), "12.34");
/// assert_eq!(amount.format_usd(true), "+$12.34");
/// ```
///
/// Parsing user input while typing truncates a third decimal digit instead of
/// rounding, and malformed input degrades to zero instead of erroring:
///
/// ```rust
/// use ledger::Money;
///
/// assert_eq!(Money::from_input("12.345").cents(), 1234);
/// assert_eq!(Money::from_input("$1,200.50").cents(), 120050);
/// assert_eq!(Money::from_input("abc").cents(), 0);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Creates a new amount from integer cents.
    #[must_use]
    pub const fn new(cents: i64) -> Self {
        Self(cents)
    }

    /// Returns the raw value in cents.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Returns `true` if the amount is 0.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if the amount is positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Returns `true` if the amount is negative.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Absolute value.
    #[must_use]
    pub const fn abs(self) -> Money {
        Money(self.0.abs())
    }

    /// Sign of the amount (`-1`, `0` or `1`).
    #[must_use]
    pub const fn signum(self) -> i64 {
        self.0.signum()
    }

    /// Returns `true` if the two amounts match within [`CENT_TOLERANCE`].
    ///
    /// Used for "do these amounts agree" checks against values that came back
    /// from a decimal-dollar wire format.
    #[must_use]
    pub const fn approx_eq(self, other: Money) -> bool {
        (self.0 - other.0).abs() <= CENT_TOLERANCE
    }

    /// Returns `true` if the amount is below the clearing threshold, i.e.
    /// small enough to be treated as fully settled.
    #[must_use]
    pub const fn is_cleared(self) -> bool {
        self.0.abs() < CENT_TOLERANCE
    }

    /// Checked addition (returns `None` on overflow).
    #[must_use]
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// Checked subtraction (returns `None` on overflow).
    #[must_use]
    pub fn checked_sub(self, rhs: Money) -> Option<Money> {
        self.0.checked_sub(rhs.0).map(Money)
    }

    /// Converts decimal dollars into cents, rounding to the nearest cent.
    ///
    /// This is the commit-time conversion for values arriving from upstream
    /// payloads that still carry floats. Non-finite input degrades to zero.
    #[must_use]
    pub fn from_dollars(dollars: f64) -> Money {
        if !dollars.is_finite() {
            return Money::ZERO;
        }
        Money((dollars * 100.0).round() as i64)
    }

    /// Returns the amount as decimal dollars for the wire boundary.
    #[must_use]
    pub fn to_dollars(self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Parses a live-typing amount string into cents.
    ///
    /// Mirrors the input sanitizer of the expense form:
    /// - strips everything except digits and the first decimal point
    /// - **truncates** fractional digits beyond two (no rounding while the
    ///   user is still typing: `"12.345"` → 1234 cents)
    /// - malformed or empty input degrades to [`Money::ZERO`]; this never
    ///   errors, validation happens on the resulting value
    #[must_use]
    pub fn from_input(raw: &str) -> Money {
        let mut whole: i64 = 0;
        let mut frac: i64 = 0;
        let mut frac_digits = 0u32;
        let mut seen_separator = false;
        let mut seen_digit = false;

        for ch in raw.chars() {
            match ch {
                '0'..='9' => {
                    seen_digit = true;
                    let digit = (ch as u8 - b'0') as i64;
                    if seen_separator {
                        if frac_digits < 2 {
                            frac = frac * 10 + digit;
                            frac_digits += 1;
                        }
                        // third and later decimals are dropped
                    } else {
                        whole = whole.saturating_mul(10).saturating_add(digit);
                    }
                }
                '.' if !seen_separator => seen_separator = true,
                // currency symbols, grouping commas, stray text
                _ => {}
            }
        }

        if !seen_digit {
            return Money::ZERO;
        }

        if frac_digits == 1 {
            frac *= 10;
        }
        Money(whole.saturating_mul(100).saturating_add(frac))
    }

    /// Parses a committed amount string into cents, rounding a third decimal
    /// digit instead of truncating it.
    #[must_use]
    pub fn from_commit(raw: &str) -> Money {
        let sanitized: String = {
            let mut out = String::with_capacity(raw.len());
            let mut seen_separator = false;
            for ch in raw.chars() {
                match ch {
                    '0'..='9' => out.push(ch),
                    '.' if !seen_separator => {
                        seen_separator = true;
                        out.push(ch);
                    }
                    _ => {}
                }
            }
            out
        };

        sanitized
            .parse::<f64>()
            .map(Money::from_dollars)
            .unwrap_or(Money::ZERO)
    }

    /// Formats the amount as a USD display string.
    ///
    /// With `signed` a positive amount gets an explicit `+` prefix; negative
    /// amounts always carry `-`.
    #[must_use]
    pub fn format_usd(self, signed: bool) -> String {
        let abs = self.0.unsigned_abs();
        let dollars = abs / 100;
        let cents = abs % 100;
        let prefix = if self.0 < 0 {
            "-"
        } else if signed && self.0 > 0 {
            "+"
        } else {
            ""
        };
        format!("{prefix}${dollars}.{cents:02}")
    }
}

impl fmt::Display for Money {
    /// Plain decimal string with exactly two fractional digits.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Money> for i64 {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Self::Output {
        Money(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Self::Output {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_two_fraction_digits() {
        assert_eq!(Money::new(0).to_string(), "0.00");
        assert_eq!(Money::new(1).to_string(), "0.01");
        assert_eq!(Money::new(10).to_string(), "0.10");
        assert_eq!(Money::new(1050).to_string(), "10.50");
        assert_eq!(Money::new(-1050).to_string(), "-10.50");
    }

    #[test]
    fn format_usd_signs() {
        assert_eq!(Money::new(1234).format_usd(false), "$12.34");
        assert_eq!(Money::new(1234).format_usd(true), "+$12.34");
        assert_eq!(Money::new(-1234).format_usd(true), "-$12.34");
        assert_eq!(Money::ZERO.format_usd(true), "$0.00");
    }

    #[test]
    fn input_parse_truncates_third_decimal() {
        assert_eq!(Money::from_input("12.345").cents(), 1234);
        assert_eq!(Money::from_input("12.349").cents(), 1234);
        assert_eq!(Money::from_input("0.001").cents(), 0);
    }

    #[test]
    fn input_parse_strips_noise() {
        assert_eq!(Money::from_input("$1,200.50").cents(), 120050);
        assert_eq!(Money::from_input("  42 ").cents(), 4200);
        assert_eq!(Money::from_input("10.5").cents(), 1050);
    }

    #[test]
    fn input_parse_degrades_to_zero() {
        assert_eq!(Money::from_input(""), Money::ZERO);
        assert_eq!(Money::from_input("abc"), Money::ZERO);
        assert_eq!(Money::from_input("$."), Money::ZERO);
    }

    #[test]
    fn commit_parse_rounds_third_decimal() {
        assert_eq!(Money::from_commit("12.345").cents(), 1235);
        assert_eq!(Money::from_commit("12.344").cents(), 1234);
    }

    #[test]
    fn dollars_round_trip() {
        assert_eq!(Money::from_dollars(33.33).cents(), 3333);
        assert_eq!(Money::from_dollars(0.1 + 0.2).cents(), 30);
        assert_eq!(Money::from_dollars(f64::NAN), Money::ZERO);
        assert!((Money::new(3333).to_dollars() - 33.33).abs() < f64::EPSILON);
    }

    #[test]
    fn tolerance_comparisons() {
        assert!(Money::new(5000).approx_eq(Money::new(5001)));
        assert!(!Money::new(5000).approx_eq(Money::new(5002)));
        assert!(Money::ZERO.is_cleared());
        assert!(!Money::new(1).is_cleared());
        assert!(!Money::new(-1).is_cleared());
    }
}
