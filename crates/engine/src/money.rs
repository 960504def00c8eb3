use std::{fmt, str::FromStr};

use crate::EngineError;

/// Scale of [`UnitValue`]: one gold is this many units.
const MICROS_PER_GOLD: i64 = 1_000_000;
const FRACTION_DIGITS: usize = 6;

/// Per-item gold value as reported by a price addon, stored as an integer
/// number of **millionths of gold**.
///
/// Price data is written with arbitrary decimals (`12.7`, `0.3333333`); keeping
/// six fractional digits makes `count × value` exact integer arithmetic, so
/// truncating the product to whole gold never suffers from floating-point
/// drift. Digits past the sixth are dropped.
///
/// # Examples
///
/// ```rust
/// use engine::UnitValue;
///
/// let value: UnitValue = "12.7".parse().unwrap();
/// assert_eq!(value.micros(), 12_700_000);
/// assert_eq!(value.total_gold(3), 38);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UnitValue(i64);

impl UnitValue {
    /// Creates a value from millionths of gold.
    #[must_use]
    pub const fn from_micros(micros: i64) -> Self {
        Self(micros)
    }

    /// Creates a value from whole gold.
    #[must_use]
    pub const fn from_gold(gold: i64) -> Self {
        Self(gold * MICROS_PER_GOLD)
    }

    #[must_use]
    pub const fn micros(self) -> i64 {
        self.0
    }

    /// Value of `count` items in whole gold, truncated toward zero.
    ///
    /// Saturates instead of overflowing.
    #[must_use]
    pub fn total_gold(self, count: i64) -> i64 {
        let total = i128::from(self.0) * i128::from(count) / i128::from(MICROS_PER_GOLD);
        i64::try_from(total).unwrap_or(if total < 0 { i64::MIN } else { i64::MAX })
    }
}

impl fmt::Display for UnitValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let whole = abs / MICROS_PER_GOLD.unsigned_abs();
        let fraction = abs % MICROS_PER_GOLD.unsigned_abs();
        if fraction == 0 {
            return write!(f, "{sign}{whole}");
        }
        let digits = format!("{fraction:06}");
        write!(f, "{sign}{whole}.{}", digits.trim_end_matches('0'))
    }
}

impl FromStr for UnitValue {
    type Err = EngineError;

    /// Parses a decimal string (`"12"`, `"12.7"`, `"-0.25"`, `".5"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::Decode(format!("invalid item value: {s:?}"));

        let trimmed = s.trim();
        let (negative, rest) = match trimmed.strip_prefix('-') {
            Some(stripped) => (true, stripped),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };

        let (whole_str, fraction_str) = rest.split_once('.').unwrap_or((rest, ""));
        if whole_str.is_empty() && fraction_str.is_empty() {
            return Err(invalid());
        }
        if !whole_str.chars().all(|c| c.is_ascii_digit())
            || !fraction_str.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }

        let whole: i64 = if whole_str.is_empty() {
            0
        } else {
            whole_str.parse().map_err(|_| invalid())?
        };

        let kept = &fraction_str[..fraction_str.len().min(FRACTION_DIGITS)];
        let fraction: i64 = if kept.is_empty() {
            0
        } else {
            let padded = format!("{kept:0<width$}", width = FRACTION_DIGITS);
            padded.parse().map_err(|_| invalid())?
        };

        let total = whole
            .checked_mul(MICROS_PER_GOLD)
            .and_then(|v| v.checked_add(fraction))
            .ok_or_else(invalid)?;

        Ok(UnitValue(if negative { -total } else { total }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_decimal_text() {
        assert_eq!("12".parse::<UnitValue>().unwrap().micros(), 12_000_000);
        assert_eq!("12.7".parse::<UnitValue>().unwrap().micros(), 12_700_000);
        assert_eq!(".5".parse::<UnitValue>().unwrap().micros(), 500_000);
        assert_eq!("3.".parse::<UnitValue>().unwrap().micros(), 3_000_000);
        assert_eq!("-0.25".parse::<UnitValue>().unwrap().micros(), -250_000);
        assert_eq!(
            "0.33333333".parse::<UnitValue>().unwrap().micros(),
            333_333
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!("".parse::<UnitValue>().is_err());
        assert!(".".parse::<UnitValue>().is_err());
        assert!("nil".parse::<UnitValue>().is_err());
        assert!("1e5".parse::<UnitValue>().is_err());
        assert!("1.2.3".parse::<UnitValue>().is_err());
    }

    #[test]
    fn total_truncates_toward_zero() {
        let value: UnitValue = "12.7".parse().unwrap();
        assert_eq!(value.total_gold(3), 38);
        assert_eq!(value.total_gold(10), 127);
        assert_eq!(UnitValue::from_micros(999_999).total_gold(1), 0);
        assert_eq!(UnitValue::from_micros(0).total_gold(50), 0);
    }

    #[test]
    fn display_drops_trailing_zeros() {
        assert_eq!(UnitValue::from_gold(5).to_string(), "5");
        assert_eq!("12.70".parse::<UnitValue>().unwrap().to_string(), "12.7");
        assert_eq!("-0.05".parse::<UnitValue>().unwrap().to_string(), "-0.05");
    }
}
