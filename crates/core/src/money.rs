//! Monetary amounts in minor currency units.
//!
//! Amounts are stored as integer cents. The only place a major-unit (dollar)
//! figure is turned into cents is [`Cents::from_major`]; everything downstream
//! carries the integer.

use serde::{Deserialize, Serialize};

/// Largest integer an `f64` represents exactly (2^53).
const MAX_EXACT: f64 = 9_007_199_254_740_992.0;

/// An amount of money in cents.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cents(i64);

impl Cents {
    pub const ZERO: Cents = Cents(0);

    pub fn new(cents: i64) -> Self {
        Self(cents)
    }

    /// Convert a major-unit amount (e.g. dollars) into cents: `amount * 100`,
    /// rounded to the nearest cent.
    ///
    /// Returns `None` for non-finite input or when the result would not be an
    /// exactly representable integer.
    pub fn from_major(amount: f64) -> Option<Self> {
        if !amount.is_finite() {
            return None;
        }
        let cents = (amount * 100.0).round();
        if cents.abs() >= MAX_EXACT {
            return None;
        }
        Some(Self(cents as i64))
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }

    /// The amount in major units, as shown in edit forms.
    pub fn to_major(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn checked_add(self, other: Cents) -> Option<Cents> {
        self.0.checked_add(other.0).map(Cents)
    }

    /// Render as US dollars with thousands separators, e.g. `$1,234.56`.
    pub fn format_usd(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let dollars = (abs / 100).to_string();
        let cents = abs % 100;

        let mut grouped = String::with_capacity(dollars.len() + dollars.len() / 3);
        for (i, ch) in dollars.chars().enumerate() {
            if i > 0 && (dollars.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }

        format!("{sign}${grouped}.{cents:02}")
    }
}

impl core::fmt::Display for Cents {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.format_usd())
    }
}

impl core::iter::Sum for Cents {
    fn sum<I: Iterator<Item = Cents>>(iter: I) -> Self {
        iter.fold(Cents::ZERO, |acc, c| Cents(acc.0.saturating_add(c.0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn from_major_multiplies_by_one_hundred() {
        assert_eq!(Cents::from_major(50.0), Some(Cents::new(5000)));
        assert_eq!(Cents::from_major(12.34), Some(Cents::new(1234)));
    }

    #[test]
    fn from_major_rounds_float_noise_to_the_nearest_cent() {
        // 0.29 * 100 == 28.999999999999996 in binary floating point.
        assert_eq!(Cents::from_major(0.29), Some(Cents::new(29)));
        assert_eq!(Cents::from_major(1.005), Some(Cents::new(100)));
    }

    #[test]
    fn from_major_rejects_non_finite_and_huge_values() {
        assert_eq!(Cents::from_major(f64::NAN), None);
        assert_eq!(Cents::from_major(f64::INFINITY), None);
        assert_eq!(Cents::from_major(1e300), None);
    }

    #[test]
    fn format_usd_groups_thousands() {
        assert_eq!(Cents::new(0).format_usd(), "$0.00");
        assert_eq!(Cents::new(5).format_usd(), "$0.05");
        assert_eq!(Cents::new(123_456).format_usd(), "$1,234.56");
        assert_eq!(Cents::new(100_000_000).format_usd(), "$1,000,000.00");
        assert_eq!(Cents::new(-1999).to_string(), "-$19.99");
    }

    #[test]
    fn sum_saturates_instead_of_overflowing() {
        let total: Cents = [Cents::new(i64::MAX), Cents::new(1)].into_iter().sum();
        assert_eq!(total, Cents::new(i64::MAX));
        let total: Cents = [Cents::new(250), Cents::new(-50)].into_iter().sum();
        assert_eq!(total, Cents::new(200));
    }

    proptest! {
        /// Whole-dollar amounts convert exactly.
        #[test]
        fn whole_dollars_convert_exactly(dollars in 1i64..10_000_000i64) {
            prop_assert_eq!(Cents::from_major(dollars as f64), Some(Cents::new(dollars * 100)));
        }
    }
}
