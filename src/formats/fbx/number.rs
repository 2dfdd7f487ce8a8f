//! The locale-independent numeric grammar shared by every field the baker
//! rewrites. Output formatting is part of the observable contract: rewritten
//! files must diff only in digits, never in notation style.

/// Parses a double using the dot-decimal grammar, independent of locale.
pub fn parse_f64(field: &str) -> Option<f64> {
    field.trim().parse().ok()
}

/// Parses an integer array element.
pub fn parse_i64(field: &str) -> Option<i64> {
    field.trim().parse().ok()
}

/// Formats a double the way the scene format stores it: exact zero prints as
/// `0`, magnitudes in `[1e-4, 1e15)` print in fixed notation with up to ten
/// fractional digits and no trailing zeros, and everything else falls back
/// to scientific notation with 15 significant digits.
pub fn format_f64(value: f64) -> String {
    if value == 0. {
        return String::from("0");
    }

    let magnitude = value.abs();
    if (1e-4..1e15).contains(&magnitude) {
        let fixed = format!("{:.10}", value);
        fixed.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        let scientific = format!("{:.14e}", value);
        match scientific.split_once('e') {
            Some((mantissa, exponent)) => {
                let mantissa = mantissa.trim_end_matches('0').trim_end_matches('.');
                format!("{}e{}", mantissa, exponent)
            }
            // Non-finite values carry no exponent; emit them as-is.
            None => scientific,
        }
    }
}

pub fn format_i64(value: i64) -> String {
    value.to_string()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn zero_prints_bare() {
        assert_eq!("0", format_f64(0.));
        assert_eq!("0", format_f64(-0.));
    }

    #[test]
    fn fixed_notation_strips_trailing_zeros() {
        assert_eq!("1", format_f64(1.));
        assert_eq!("-1.5", format_f64(-1.5));
        assert_eq!("0.0001", format_f64(1e-4));
        assert_eq!("12.25", format_f64(12.25));
        assert_eq!("0.3333333333", format_f64(1. / 3.));
    }

    #[test]
    fn extreme_magnitudes_use_scientific_notation() {
        assert_eq!("1e-5", format_f64(1e-5));
        assert_eq!("1e15", format_f64(1e15));
        assert_eq!("6.12323399573677e-17", format_f64(6.123233995736766e-17));
    }

    #[test]
    fn parse_accepts_signs_and_exponents() {
        assert_eq!(Some(-1.5), parse_f64(" -1.5 "));
        assert_eq!(Some(250.), parse_f64("2.5e2"));
        assert_eq!(Some(-3), parse_i64("-3"));
        assert_eq!(None, parse_f64("banana"));
    }
}
