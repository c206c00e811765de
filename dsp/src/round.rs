//! Decimal rounding with half-up tie breaking.

/// Rounds `value` to `places` decimal places, half away from zero.
///
/// Operates on the shortest decimal representation of the value, so ties
/// are resolved on the printed digits rather than on a scaled binary
/// product. Non-finite values pass through unchanged.
pub fn round_to(value: f64, places: usize) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let text = format!("{value}");
    let (negative, unsigned) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.as_str()),
    };
    let Some((int_part, frac_part)) = unsigned.split_once('.') else {
        return value;
    };
    if frac_part.len() <= places {
        return value;
    }

    let mut digits: Vec<u8> = int_part
        .bytes()
        .chain(frac_part.bytes().take(places))
        .map(|b| b - b'0')
        .collect();
    if frac_part.as_bytes()[places] >= b'5' {
        let mut idx = digits.len();
        loop {
            if idx == 0 {
                digits.insert(0, 1);
                break;
            }
            idx -= 1;
            if digits[idx] == 9 {
                digits[idx] = 0;
            } else {
                digits[idx] += 1;
                break;
            }
        }
    }

    let int_len = digits.len() - places;
    let mut rounded = String::with_capacity(digits.len() + 2);
    if negative {
        rounded.push('-');
    }
    for (i, d) in digits.iter().enumerate() {
        if i == int_len {
            rounded.push('.');
        }
        rounded.push((b'0' + d) as char);
    }
    rounded.parse().unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_four_places() {
        assert_eq!(round_to(2.56789, 4), 2.5679);
        assert_eq!(round_to(2.56784, 4), 2.5678);
        assert_eq!(round_to(1.23, 4), 1.23);
    }

    #[test]
    fn ties_round_away_from_zero() {
        // 0.03125 is exactly representable, so the printed digit is a true 5
        assert_eq!(round_to(0.03125, 4), 0.0313);
        assert_eq!(round_to(-0.03125, 4), -0.0313);
        assert_eq!(round_to(0.00005, 4), 0.0001);
    }

    #[test]
    fn carries_across_the_point() {
        assert_eq!(round_to(9.99995, 4), 10.0);
        assert_eq!(round_to(-0.99999, 4), -1.0);
    }

    #[test]
    fn non_finite_passes_through() {
        assert!(round_to(f64::NAN, 4).is_nan());
        assert_eq!(round_to(f64::INFINITY, 4), f64::INFINITY);
        assert_eq!(round_to(f64::NEG_INFINITY, 4), f64::NEG_INFINITY);
    }

    #[test]
    fn integers_unchanged() {
        assert_eq!(round_to(42.0, 4), 42.0);
        assert_eq!(round_to(-7.0, 4), -7.0);
        assert_eq!(round_to(0.0, 4), 0.0);
    }
}
