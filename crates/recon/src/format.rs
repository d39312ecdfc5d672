//! The one formatting rule that turns a request amount into its display form.
//!
//! Stores never take a display string from callers; they derive it here so
//! `formattedAmount` can always be reproduced from `requestAmount`.

use serde::Serialize;

const MILLION: f64 = 1_000_000.0;

/// A request amount as written back to the store.
///
/// Floats with no fractional part collapse to `Whole` so that `$10.0`
/// scaled to ten million is stored as the integer `10000000`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Amount {
    Whole(i64),
    Fractional(f64),
}

impl Amount {
    pub fn from_f64(value: f64) -> Self {
        if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
            Self::Whole(value as i64)
        } else {
            Self::Fractional(value)
        }
    }

    pub fn as_f64(&self) -> f64 {
        match *self {
            Self::Whole(n) => n as f64,
            Self::Fractional(x) => x,
        }
    }

    pub fn formatted(&self) -> String {
        format_amount(self)
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Whole(n) => write!(f, "{n}"),
            Self::Fractional(x) => write!(f, "{x}"),
        }
    }
}

/// `$N MILLION` / `$N.N MILLION` at or above one million, otherwise the plain
/// dollar figure with thousands separators.
pub fn format_amount(amount: &Amount) -> String {
    let value = amount.as_f64();
    if value >= MILLION {
        let millions = value / MILLION;
        if millions.fract() == 0.0 {
            format!("${millions:.0} MILLION")
        } else {
            format!("${} MILLION", group_thousands(&format!("{millions:.1}")))
        }
    } else {
        match amount {
            Amount::Whole(n) => format!("${}", group_thousands(&n.to_string())),
            Amount::Fractional(x) => format!("${}", group_thousands(&x.to_string())),
        }
    }
}

/// Insert `,` every three digits in the integer part of a plain decimal string.
pub fn group_thousands(number: &str) -> String {
    let (sign, unsigned) = match number.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", number),
    };
    let (int_part, frac_part) = match unsigned.find('.') {
        Some(dot) => unsigned.split_at(dot),
        None => (unsigned, ""),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{sign}{grouped}{frac_part}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_millions_drop_decimals() {
        assert_eq!(format_amount(&Amount::Whole(450_000_000)), "$450 MILLION");
        assert_eq!(format_amount(&Amount::Whole(10_000_000)), "$10 MILLION");
        assert_eq!(format_amount(&Amount::Whole(1_000_000)), "$1 MILLION");
    }

    #[test]
    fn fractional_millions_use_one_decimal() {
        assert_eq!(format_amount(&Amount::Whole(12_500_000)), "$12.5 MILLION");
        assert_eq!(format_amount(&Amount::Whole(1_234_567)), "$1.2 MILLION");
        assert_eq!(format_amount(&Amount::Fractional(2_500_000.5)), "$2.5 MILLION");
    }

    #[test]
    fn thousands_of_millions_are_grouped_only_with_decimals() {
        assert_eq!(format_amount(&Amount::Whole(1_500_000_000)), "$1500 MILLION");
        assert_eq!(format_amount(&Amount::Whole(1_500_500_000)), "$1,500.5 MILLION");
    }

    #[test]
    fn huge_whole_millions_are_not_clamped() {
        // 2^70 millions, well past what an i64 holds.
        let value = (1u128 << 70) as f64 * 1e6;
        let amount = Amount::from_f64(value);
        assert_eq!(amount, Amount::Fractional(value));
        assert_eq!(format_amount(&amount), "$1180591620717411303424 MILLION");
    }

    #[test]
    fn below_a_million_is_plain_dollars() {
        assert_eq!(format_amount(&Amount::Whole(3_979)), "$3,979");
        assert_eq!(format_amount(&Amount::Whole(999_999)), "$999,999");
        assert_eq!(format_amount(&Amount::Whole(0)), "$0");
        assert_eq!(format_amount(&Amount::Fractional(3_979.5)), "$3,979.5");
        assert_eq!(format_amount(&Amount::Fractional(0.25)), "$0.25");
    }

    #[test]
    fn integral_floats_become_whole() {
        assert_eq!(Amount::from_f64(10_000_000.0), Amount::Whole(10_000_000));
        assert_eq!(Amount::from_f64(3_979.0), Amount::Whole(3_979));
        assert_eq!(Amount::from_f64(3_979.25), Amount::Fractional(3_979.25));
    }

    #[test]
    fn grouping_keeps_sign_and_fraction() {
        assert_eq!(group_thousands("1234567.891"), "1,234,567.891");
        assert_eq!(group_thousands("-1000"), "-1,000");
        assert_eq!(group_thousands("100"), "100");
    }
}
