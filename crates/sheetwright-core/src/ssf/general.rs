//! The `General` format heuristic.
//!
//! Pure integers print as plain decimal. Floats in the magnitude window
//! `10^-4 .. 10^10` use fixed-point with adaptive precision (about eleven
//! significant digits); beyond the window the rendering switches to
//! exponential. Non-finite values map to Excel error glyphs.

/// Render a number the way Excel's General format does.
pub fn format_general(value: f64) -> String {
    if value.is_nan() {
        return "#NUM!".to_string();
    }
    if value.is_infinite() {
        return "#DIV/0!".to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }

    let abs = value.abs();
    if (1e-4..1e10).contains(&abs) {
        // Fixed-point with up to 11 significant digits.
        let int_digits = if abs >= 1.0 {
            (abs.log10().floor() as i32) + 1
        } else {
            0
        };
        let precision = (11 - int_digits).clamp(0, 10) as usize;
        let s = format!("{value:.precision$}");
        trim_trailing_zeros(&s)
    } else {
        let s = format!("{value:.5E}");
        normalize_exponent(&s)
    }
}

fn trim_trailing_zeros(s: &str) -> String {
    if !s.contains('.') {
        return s.to_string();
    }
    let trimmed = s.trim_end_matches('0').trim_end_matches('.');
    trimmed.to_string()
}

/// Rust emits `1.23E4`; Excel prints `1.23E+04`.
fn normalize_exponent(s: &str) -> String {
    let Some(pos) = s.find('E') else {
        return s.to_string();
    };
    let (mantissa, exp) = s.split_at(pos);
    let exp = &exp[1..];
    let (sign, digits) = match exp.strip_prefix('-') {
        Some(d) => ('-', d),
        None => ('+', exp),
    };
    let mantissa = trim_trailing_zeros(mantissa);
    format!("{mantissa}E{sign}{digits:0>2}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_general_integers() {
        assert_eq!(format_general(0.0), "0");
        assert_eq!(format_general(42.0), "42");
        assert_eq!(format_general(-7.0), "-7");
        assert_eq!(format_general(1234567.0), "1234567");
    }

    #[test]
    fn test_general_floats() {
        assert_eq!(format_general(3.14), "3.14");
        assert_eq!(format_general(-0.5), "-0.5");
        assert_eq!(format_general(0.001), "0.001");
    }

    #[test]
    fn test_general_trims_float_noise() {
        assert_eq!(format_general(0.1 + 0.2), "0.3");
        assert_eq!(format_general(1.0 / 3.0), "0.3333333333");
    }

    #[test]
    fn test_general_large_magnitudes_use_exponent() {
        // A non-integer beyond the fixed-point window; integers always
        // print as plain decimal.
        let s = format_general(15_000_000_000.5);
        assert!(s.contains("E+"), "expected exponent form, got {s}");
        assert_eq!(format_general(1.5e12), "1500000000000");
    }

    #[test]
    fn test_general_small_magnitudes_use_exponent() {
        let s = format_general(0.00001);
        assert!(s.contains("E-"), "expected exponent form, got {s}");
        assert_eq!(s, "1E-05");
    }

    #[test]
    fn test_general_non_finite() {
        assert_eq!(format_general(f64::NAN), "#NUM!");
        assert_eq!(format_general(f64::INFINITY), "#DIV/0!");
        assert_eq!(format_general(f64::NEG_INFINITY), "#DIV/0!");
    }

    #[test]
    fn test_normalize_exponent_padding() {
        assert_eq!(normalize_exponent("1.50000E5"), "1.5E+05");
        assert_eq!(normalize_exponent("2.00000E-7"), "2E-07");
    }
}
