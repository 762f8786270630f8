//! Mathematical utility functions

use rust_decimal::prelude::*;
use rust_decimal_macros::dec;

/// Relative spread between two prices in percent, measured against the
/// lower price. Zero when either price is non-positive, `None` when the
/// ratio does not fit in a `Decimal`.
pub fn percent_spread(a: Decimal, b: Decimal) -> Option<Decimal> {
    let low = a.min(b);
    if low <= Decimal::ZERO {
        return Some(Decimal::ZERO);
    }
    (a - b).abs().checked_div(low)?.checked_mul(dec!(100))
}

/// Absolute move from `previous` to `current` in percent of `previous`.
pub fn percent_change(previous: Decimal, current: Decimal) -> Option<Decimal> {
    if previous.is_zero() {
        return None;
    }
    Some((current - previous).abs() / previous.abs() * dec!(100))
}

pub fn mean(values: &[Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    let sum = values
        .iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(*v))?;
    Some(sum / Decimal::from(values.len()))
}

/// Sample standard deviation (n - 1 denominator).
pub fn sample_std_dev(values: &[Decimal]) -> Option<Decimal> {
    if values.len() < 2 {
        return None;
    }
    let avg = mean(values)?;
    let sum_sq = values.iter().try_fold(Decimal::ZERO, |acc, v| {
        let diff = v.checked_sub(avg)?;
        acc.checked_add(diff.checked_mul(diff)?)
    })?;
    let variance = sum_sq / Decimal::from(values.len() - 1);
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spread_uses_lower_price() {
        assert_eq!(percent_spread(dec!(100), dec!(101)), Some(dec!(1)));
        assert_eq!(percent_spread(dec!(101), dec!(100)), Some(dec!(1)));
        assert_eq!(percent_spread(dec!(0), dec!(100)), Some(dec!(0)));
    }

    #[test]
    fn test_spread_overflow_is_none() {
        let dust = Decimal::new(1, 28);
        assert_eq!(percent_spread(dust, dec!(100000)), None);
    }

    #[test]
    fn test_percent_change() {
        assert_eq!(percent_change(dec!(100), dec!(106)), Some(dec!(6)));
        assert_eq!(percent_change(dec!(100), dec!(94)), Some(dec!(6)));
        assert_eq!(percent_change(dec!(0), dec!(1)), None);
    }

    #[test]
    fn test_sample_std_dev() {
        let values = [dec!(2), dec!(4), dec!(4), dec!(4), dec!(5), dec!(5), dec!(7), dec!(9)];
        assert_eq!(mean(&values), Some(dec!(5)));
        let sd = sample_std_dev(&values).unwrap();
        // sqrt(32 / 7)
        assert!((sd - dec!(2.138089935)).abs() < dec!(0.000001));
        assert_eq!(sample_std_dev(&[dec!(1)]), None);
    }
}
