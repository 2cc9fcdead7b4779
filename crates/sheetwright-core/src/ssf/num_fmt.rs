//! Number rendering for the format engine: digit masks, grouping,
//! percentage and thousands scaling, scientific notation, fractions, and
//! multi-group masks (dash and phone patterns).

use super::general::format_general;
use super::section::{classify_bracket, BracketKind};

/// A lexed element of a number section.
#[derive(Debug, Clone, PartialEq)]
enum Tok {
    /// Literal text emitted verbatim.
    Lit(String),
    /// `_x` padding: emits one space.
    Pad,
    /// `*x` fill: emits nothing.
    Fill,
    /// `0`, `#`, or `?`.
    Digit(char),
    /// `,` adjacent to digit placeholders.
    Comma,
    Dot,
    Percent,
    /// `E+` / `E-` exponent marker (true when the sign is `+`).
    Exp(bool),
    /// `/` fraction bar.
    Slash,
    /// `@` text placeholder.
    At,
    /// The `General` keyword.
    General,
}

/// Lex a number section. Color and condition brackets vanish; currency
/// brackets collapse to their symbol.
fn lex(section: &str) -> Vec<Tok> {
    let chars: Vec<char> = section.chars().collect();
    let mut toks: Vec<Tok> = Vec::new();
    let mut i = 0;

    fn push_lit(toks: &mut Vec<Tok>, c: char) {
        if let Some(Tok::Lit(s)) = toks.last_mut() {
            s.push(c);
        } else {
            toks.push(Tok::Lit(c.to_string()));
        }
    }

    while i < chars.len() {
        let ch = chars[i];
        match ch {
            '"' => {
                let mut j = i + 1;
                let mut lit = String::new();
                while j < chars.len() && chars[j] != '"' {
                    lit.push(chars[j]);
                    j += 1;
                }
                toks.push(Tok::Lit(lit));
                i = j + 1;
            }
            '\\' => {
                if i + 1 < chars.len() {
                    push_lit(&mut toks, chars[i + 1]);
                }
                i += 2;
            }
            '_' => {
                toks.push(Tok::Pad);
                i += 2;
            }
            '*' => {
                toks.push(Tok::Fill);
                i += 2;
            }
            '[' => {
                let close = chars[i + 1..].iter().position(|&c| c == ']');
                match close {
                    Some(off) => {
                        let content: String = chars[i + 1..i + 1 + off].iter().collect();
                        match classify_bracket(&content) {
                            BracketKind::Currency(sym) => {
                                for c in sym.chars() {
                                    push_lit(&mut toks, c);
                                }
                            }
                            BracketKind::Color | BracketKind::Condition(_) => {}
                            _ => {
                                for c in content.chars() {
                                    push_lit(&mut toks, c);
                                }
                            }
                        }
                        i += off + 2;
                    }
                    None => {
                        push_lit(&mut toks, ch);
                        i += 1;
                    }
                }
            }
            '0' | '#' | '?' => {
                toks.push(Tok::Digit(ch));
                i += 1;
            }
            ',' => {
                toks.push(Tok::Comma);
                i += 1;
            }
            '.' => {
                toks.push(Tok::Dot);
                i += 1;
            }
            '%' => {
                toks.push(Tok::Percent);
                i += 1;
            }
            '/' => {
                toks.push(Tok::Slash);
                i += 1;
            }
            '@' => {
                toks.push(Tok::At);
                i += 1;
            }
            'E' | 'e' if i + 1 < chars.len() && (chars[i + 1] == '+' || chars[i + 1] == '-') => {
                toks.push(Tok::Exp(chars[i + 1] == '+'));
                i += 2;
            }
            'G' | 'g' => {
                let rest: String = chars[i..chars.len().min(i + 7)].iter().collect();
                if rest.eq_ignore_ascii_case("general") {
                    toks.push(Tok::General);
                    i += 7;
                } else {
                    push_lit(&mut toks, ch);
                    i += 1;
                }
            }
            c => {
                push_lit(&mut toks, c);
                i += 1;
            }
        }
    }

    toks
}

/// Render a numeric value under a number-classified section. `add_sign`
/// is set when the section does not supply its own sign presentation (the
/// caller passes the absolute value either way).
pub fn format_number(value: f64, section: &str, add_sign: bool) -> String {
    if section.trim().eq_ignore_ascii_case("general") || section.is_empty() {
        let rendered = format_general(value);
        return if add_sign {
            format!("-{rendered}")
        } else {
            rendered
        };
    }

    let toks = lex(section);

    if toks.iter().any(|t| matches!(t, Tok::Slash))
        && toks.iter().any(|t| matches!(t, Tok::Digit(_)))
    {
        return format_fraction(value, &toks, add_sign);
    }
    if toks.iter().any(|t| matches!(t, Tok::Exp(_))) {
        return format_scientific(value, &toks, add_sign);
    }
    format_decimal(value, &toks, add_sign)
}

/// Render a text value through a text section: `@` substitutes the text,
/// literals pass through, digit placeholders are ignored.
pub fn format_text_section(section: &str, text: &str) -> String {
    let mut out = String::new();
    for t in lex(section) {
        match t {
            Tok::At | Tok::General => out.push_str(text),
            Tok::Lit(s) => out.push_str(&s),
            Tok::Pad => out.push(' '),
            Tok::Percent => out.push('%'),
            _ => {}
        }
    }
    out
}

// -------------------------------------------------------------------------
// Decimal / integer masks
// -------------------------------------------------------------------------

struct MaskInfo {
    /// Placeholder chars of each integer digit group, in order. Multiple
    /// groups mean a distribution mask (dash/phone).
    int_groups: Vec<Vec<char>>,
    /// Placeholder chars after the decimal point.
    dec_slots: Vec<char>,
    grouping: bool,
    /// Trailing commas: each divides the value by 1000.
    scale_commas: u32,
    percent_count: u32,
}

fn analyze(toks: &[Tok]) -> MaskInfo {
    let mut int_groups: Vec<Vec<char>> = Vec::new();
    let mut dec_slots: Vec<char> = Vec::new();
    let mut percent_count = 0u32;

    let mut after_dot = false;
    let mut current: Vec<char> = Vec::new();

    for t in toks {
        match t {
            Tok::Digit(c) => {
                if after_dot {
                    dec_slots.push(*c);
                } else {
                    current.push(*c);
                }
            }
            Tok::Dot => {
                after_dot = true;
                if !current.is_empty() {
                    int_groups.push(std::mem::take(&mut current));
                }
            }
            Tok::Percent => percent_count += 1,
            Tok::Lit(_) => {
                if !after_dot && !current.is_empty() {
                    int_groups.push(std::mem::take(&mut current));
                }
            }
            _ => {}
        }
    }
    if !current.is_empty() {
        int_groups.push(current);
    }

    // A comma with digit placeholders on both sides turns on grouping; a
    // comma with no digit placeholder after it scales by a thousand.
    let mut grouping = false;
    let mut scale_commas = 0u32;
    for (i, t) in toks.iter().enumerate() {
        if !matches!(t, Tok::Comma) {
            continue;
        }
        let digit_before = toks[..i].iter().any(|t| matches!(t, Tok::Digit(_)));
        let digit_after = toks[i + 1..].iter().any(|t| matches!(t, Tok::Digit(_)));
        if digit_before && digit_after {
            grouping = true;
        } else if digit_before {
            scale_commas += 1;
        }
    }

    MaskInfo {
        int_groups,
        dec_slots,
        grouping,
        scale_commas,
        percent_count,
    }
}

/// Split a rounded non-negative value into integer and fraction digit
/// strings with exactly `decimals` fraction digits.
fn split_digits(value: f64, decimals: usize) -> (String, String) {
    let factor = 10f64.powi(decimals as i32);
    let rounded = (value * factor).round() / factor;
    let s = format!("{rounded:.decimals$}");
    match s.split_once('.') {
        Some((i, f)) => (i.to_string(), f.to_string()),
        None => (s, String::new()),
    }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    let chars: Vec<char> = digits.chars().collect();
    for (idx, c) in chars.iter().enumerate() {
        if idx > 0 && (chars.len() - idx) % 3 == 0 && c.is_ascii_digit() {
            out.push(',');
        }
        out.push(*c);
    }
    out
}

/// Left-pad `digits` out to the mask slots: `0` pads zeros, `?` pads
/// spaces, `#` pads nothing. A bare zero vanishes under a pure-`#` mask.
fn pad_to_slots(digits: &str, slots: &[char]) -> String {
    let digits = if digits == "0" && !slots.contains(&'0') {
        ""
    } else {
        digits
    };
    if digits.len() >= slots.len() {
        return digits.to_string();
    }
    let missing = slots.len() - digits.len();
    let mut out = String::new();
    for slot in &slots[..missing] {
        match slot {
            '0' => out.push('0'),
            '?' => out.push(' '),
            _ => {}
        }
    }
    out.push_str(digits);
    out
}

fn format_decimal(value: f64, toks: &[Tok], add_sign: bool) -> String {
    let info = analyze(toks);

    let mut v = value.abs();
    v *= 100f64.powi(info.percent_count as i32);
    v /= 1000f64.powi(info.scale_commas as i32);

    let decimals = info.dec_slots.len();
    let (int_str, frac_str) = split_digits(v, decimals);

    // Distribute integer digits across the groups, right to left; the
    // first group absorbs any overflow.
    let groups = &info.int_groups;
    let mut group_digits: Vec<String> = vec![String::new(); groups.len()];
    if !groups.is_empty() {
        let mut remaining = int_str.clone();
        for gi in (1..groups.len()).rev() {
            let take = groups[gi].len().min(remaining.len());
            let split = remaining.len() - take;
            group_digits[gi] = remaining[split..].to_string();
            remaining.truncate(split);
        }
        group_digits[0] = remaining;
    }

    // Insignificant decimal digits: trailing zeros drop for `#`, become
    // spaces for `?`, stay for `0`.
    let frac_chars: Vec<char> = frac_str.chars().collect();
    let mut keep = frac_chars.len();
    while keep > 0 && frac_chars[keep - 1] == '0' && info.dec_slots[keep - 1] != '0' {
        keep -= 1;
    }

    let mut out = String::new();
    let mut after_dot = false;
    let mut group_idx = 0usize;
    let mut digits_in_group = 0usize;
    let mut dec_idx = 0usize;

    for t in toks {
        match t {
            Tok::Lit(s) => out.push_str(s),
            Tok::Pad => out.push(' '),
            Tok::Fill => {}
            Tok::Percent => out.push('%'),
            Tok::General | Tok::At => out.push_str(&format_general(value)),
            Tok::Comma => {}
            Tok::Dot => {
                after_dot = true;
                let has_question_slots = info.dec_slots.contains(&'?');
                if keep > 0 || decimals == 0 || has_question_slots {
                    out.push('.');
                }
            }
            Tok::Digit(_) if !after_dot => {
                if group_idx >= groups.len() {
                    continue;
                }
                if digits_in_group == 0 {
                    let digits = pad_to_slots(&group_digits[group_idx], &groups[group_idx]);
                    let rendered = if info.grouping && groups.len() == 1 {
                        let spaces: String = digits.chars().take_while(|c| *c == ' ').collect();
                        let rest: String = digits.chars().skip_while(|c| *c == ' ').collect();
                        format!("{spaces}{}", group_thousands(&rest))
                    } else {
                        digits
                    };
                    out.push_str(&rendered);
                }
                digits_in_group += 1;
                if digits_in_group == groups[group_idx].len() {
                    group_idx += 1;
                    digits_in_group = 0;
                }
            }
            Tok::Digit(slot) => {
                if dec_idx < frac_chars.len() {
                    if dec_idx < keep {
                        out.push(frac_chars[dec_idx]);
                    } else if *slot == '?' {
                        out.push(' ');
                    }
                    dec_idx += 1;
                }
            }
            Tok::Exp(_) | Tok::Slash => {}
        }
    }

    if add_sign {
        out.insert(0, '-');
    }
    out
}

// -------------------------------------------------------------------------
// Scientific notation
// -------------------------------------------------------------------------

fn format_scientific(value: f64, toks: &[Tok], add_sign: bool) -> String {
    let exp_pos = toks
        .iter()
        .position(|t| matches!(t, Tok::Exp(_)))
        .unwrap_or(toks.len());
    let plus = matches!(toks.get(exp_pos), Some(Tok::Exp(true)));

    let mut int_slots = 0usize;
    let mut int_zero_slots = 0usize;
    let mut dec_slots = 0usize;
    let mut after_dot = false;
    for t in &toks[..exp_pos] {
        match t {
            Tok::Dot => after_dot = true,
            Tok::Digit(c) => {
                if after_dot {
                    dec_slots += 1;
                } else {
                    int_slots += 1;
                    if *c == '0' {
                        int_zero_slots += 1;
                    }
                }
            }
            _ => {}
        }
    }
    let exp_slots = toks[exp_pos..]
        .iter()
        .filter(|t| matches!(t, Tok::Digit(_)))
        .count()
        .max(1);
    let int_slots = int_slots.max(1);
    let int_zero_slots = int_zero_slots.max(1);

    let v = value.abs();
    let (mantissa, exponent) = if v == 0.0 {
        (0.0, 0i32)
    } else {
        let e10 = v.log10().floor() as i32;
        // Engineering masks (more than one integer placeholder) snap the
        // exponent to a multiple of the placeholder count.
        let mut exp = if int_slots > 1 {
            (f64::from(e10) / int_slots as f64).floor() as i32 * int_slots as i32
        } else {
            e10
        };
        let mut m = v / 10f64.powi(exp);
        // Rounding may push the mantissa past the integer placeholders.
        let factor = 10f64.powi(dec_slots as i32);
        m = (m * factor).round() / factor;
        if m >= 10f64.powi(int_slots as i32) {
            m /= 10f64.powi(int_slots as i32);
            exp += int_slots as i32;
        }
        (m, exp)
    };

    let (int_str, frac_str) = split_digits(mantissa, dec_slots);
    let mut out = String::new();
    if add_sign {
        out.push('-');
    }
    out.push_str(&format!("{int_str:0>int_zero_slots$}"));
    if dec_slots > 0 {
        out.push('.');
        out.push_str(&frac_str);
    }
    out.push('E');
    if exponent < 0 {
        out.push('-');
    } else if plus {
        out.push('+');
    }
    out.push_str(&format!("{:0>exp_slots$}", exponent.abs()));
    out
}

// -------------------------------------------------------------------------
// Fractions
// -------------------------------------------------------------------------

/// Continued-fraction approximation of `x` with the denominator bounded by
/// `max_den`. Returns `(numerator, denominator)`.
fn approximate_fraction(x: f64, max_den: u64) -> (u64, u64) {
    if x == 0.0 {
        return (0, 1);
    }
    let (mut p0, mut q0, mut p1, mut q1) = (0u64, 1u64, 1u64, 0u64);
    let mut b = x;
    for _ in 0..64 {
        let a = b.floor();
        let a_int = a as u64;
        let p2 = a_int.saturating_mul(p1).saturating_add(p0);
        let q2 = a_int.saturating_mul(q1).saturating_add(q0);
        if q2 > max_den {
            break;
        }
        p0 = p1;
        q0 = q1;
        p1 = p2;
        q1 = q2;
        let frac = b - a;
        if frac.abs() < 1e-12 {
            break;
        }
        b = 1.0 / frac;
    }
    if q1 == 0 {
        (x.round() as u64, 1)
    } else {
        (p1, q1)
    }
}

fn format_fraction(value: f64, toks: &[Tok], add_sign: bool) -> String {
    let slash = toks
        .iter()
        .position(|t| matches!(t, Tok::Slash))
        .unwrap_or(toks.len());

    // Denominator: placeholder run or a literal integer.
    let mut den_slots = 0usize;
    let mut fixed_den: Option<u64> = None;
    for t in &toks[slash + 1..] {
        match t {
            Tok::Digit(_) => den_slots += 1,
            Tok::Lit(s) if fixed_den.is_none() && s.trim().chars().all(|c| c.is_ascii_digit()) => {
                if let Ok(n) = s.trim().parse::<u64>() {
                    if n > 0 {
                        fixed_den = Some(n);
                    }
                }
            }
            _ => {}
        }
    }

    // Numerator: the digit run immediately before the slash. Anything
    // before that run is the integer mask.
    let mut num_slots = 0usize;
    let mut idx = slash;
    while idx > 0 {
        if let Tok::Digit(_) = toks[idx - 1] {
            num_slots += 1;
            idx -= 1;
        } else {
            break;
        }
    }
    let int_slots: Vec<char> = toks[..idx]
        .iter()
        .filter_map(|t| match t {
            Tok::Digit(c) => Some(*c),
            _ => None,
        })
        .collect();
    let has_int = !int_slots.is_empty();

    let v = value.abs();
    let (whole, target) = if has_int {
        (v.trunc() as u64, v.fract())
    } else {
        (0, v)
    };

    let (mut num, den) = match fixed_den {
        Some(d) => ((target * d as f64).round() as u64, d),
        None => {
            // The denominator is bounded by the pattern's digit count,
            // capped at seven digits.
            let max_den = 10u64.pow(den_slots.min(7) as u32) - 1;
            approximate_fraction(target, max_den.max(1))
        }
    };

    let mut whole = whole;
    if num >= den && den > 0 && has_int {
        whole += num / den;
        num %= den;
    }

    let mut out = String::new();
    if add_sign {
        out.push('-');
    }

    // Walk the prefix tokens, substituting the integer part at its mask.
    let mut int_emitted = false;
    for t in &toks[..idx] {
        match t {
            Tok::Digit(_) => {
                if !int_emitted {
                    if whole > 0 || int_slots.contains(&'0') {
                        out.push_str(&whole.to_string());
                    }
                    int_emitted = true;
                }
            }
            Tok::Lit(s) => out.push_str(s),
            Tok::Pad => out.push(' '),
            _ => {}
        }
    }

    let num_width = num_slots.max(1);
    let den_width = match fixed_den {
        Some(d) => d.to_string().len(),
        None => den_slots.max(1),
    };

    if num == 0 && has_int {
        // No fractional remainder: pad out the fraction's width.
        for _ in 0..(num_width + den_width + 1) {
            out.push(' ');
        }
    } else {
        out.push_str(&format!("{num:>num_width$}"));
        out.push('/');
        out.push_str(&format!("{den:<den_width$}"));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(section: &str, value: f64) -> String {
        format_number(value.abs(), section, value < 0.0)
    }

    // ----- plain masks ----------------------------------------------------

    #[test]
    fn test_integer_mask() {
        assert_eq!(fmt("0", 3.7), "4");
        assert_eq!(fmt("0", 0.0), "0");
        assert_eq!(fmt("00000", 42.0), "00042");
        assert_eq!(fmt("#", 42.0), "42");
        assert_eq!(fmt("#", 0.0), "");
    }

    #[test]
    fn test_decimal_mask() {
        assert_eq!(fmt("0.00", 3.14159), "3.14");
        assert_eq!(fmt("0.00", 2.0), "2.00");
        assert_eq!(fmt("0.0", 2.25), "2.3");
    }

    #[test]
    fn test_hash_decimals_trim_trailing_zeros() {
        assert_eq!(fmt("0.##", 1.5), "1.5");
        assert_eq!(fmt("0.##", 1.0), "1");
        assert_eq!(fmt("0.0#", 1.5), "1.5");
        assert_eq!(fmt("0.0#", 1.25), "1.25");
    }

    #[test]
    fn test_negative_sign_added_for_single_section() {
        assert_eq!(fmt("0.00", -3.5), "-3.50");
    }

    #[test]
    fn test_grouping() {
        assert_eq!(fmt("#,##0", 1234567.0), "1,234,567");
        assert_eq!(fmt("#,##0.00", 1234.5), "1,234.50");
        assert_eq!(fmt("#,##0", 123.0), "123");
    }

    #[test]
    fn test_thousands_scaling() {
        assert_eq!(fmt("0.0,", 12345.0), "12.3");
        assert_eq!(fmt("0.00,,", 12345678.0), "12.35");
    }

    #[test]
    fn test_percent() {
        assert_eq!(fmt("0%", 0.25), "25%");
        assert_eq!(fmt("0.0%", 0.1234), "12.3%");
    }

    #[test]
    fn test_parenthesized_negative_section() {
        // The negative section carries its own parens; value arrives abs.
        assert_eq!(format_number(1234.5, "(#,##0.00)", false), "(1,234.50)");
    }

    #[test]
    fn test_currency_prefix() {
        assert_eq!(fmt("$#,##0.00", 1234.5), "$1,234.50");
    }

    #[test]
    fn test_quoted_literal_and_escape() {
        assert_eq!(fmt("0\" units\"", 3.0), "3 units");
        assert_eq!(fmt("0\\!", 3.0), "3!");
    }

    #[test]
    fn test_pad_marker_emits_space() {
        assert_eq!(fmt("0_)", 5.0), "5 ");
    }

    #[test]
    fn test_fill_marker_emits_nothing() {
        assert_eq!(fmt("*-0", 5.0), "5");
    }

    #[test]
    fn test_currency_bracket() {
        assert_eq!(fmt("[$USD-409] 0.00", 9.5), "USD 9.50");
        assert_eq!(fmt("[$€-407]0", 3.0), "€3");
    }

    // ----- dash and phone masks -------------------------------------------

    #[test]
    fn test_dash_mask() {
        assert_eq!(fmt("000-00-0000", 123456789.0), "123-45-6789");
    }

    #[test]
    fn test_phone_mask() {
        assert_eq!(fmt("(###) ###-####", 2025551234.0), "(202) 555-1234");
    }

    // ----- scientific ------------------------------------------------------

    #[test]
    fn test_scientific_zero() {
        assert_eq!(fmt("0.00E+00", 0.0), "0.00E+00");
    }

    #[test]
    fn test_scientific_basic() {
        assert_eq!(fmt("0.00E+00", 12345.0), "1.23E+04");
        assert_eq!(fmt("0.00E+00", 0.00123), "1.23E-03");
    }

    #[test]
    fn test_scientific_minus_mode() {
        assert_eq!(fmt("0.00E-00", 12345.0), "1.23E04");
        assert_eq!(fmt("0.00E-00", 0.00123), "1.23E-03");
    }

    #[test]
    fn test_engineering_notation() {
        assert_eq!(fmt("##0.0E+0", 12345.6), "12.3E+3");
        assert_eq!(fmt("##0.0E+0", 1234567.0), "1.2E+6");
    }

    // ----- fractions -------------------------------------------------------

    #[test]
    fn test_simple_fraction() {
        assert_eq!(fmt("# ?/?", 0.5), " 1/2");
        assert_eq!(fmt("# ?/?", 2.5), "2 1/2");
    }

    #[test]
    fn test_two_digit_fraction() {
        assert_eq!(fmt("# ??/??", 0.3333333), " 1/3 ");
    }

    #[test]
    fn test_fixed_denominator() {
        assert_eq!(fmt("# ?/8", 0.375), " 3/8");
    }

    #[test]
    fn test_improper_fraction() {
        assert_eq!(fmt("?/?", 1.5), "3/2");
    }

    #[test]
    fn test_whole_number_under_fraction_mask() {
        assert_eq!(fmt("# ?/?", 3.0), "3    ");
    }

    #[test]
    fn test_approximate_fraction_bounds() {
        assert_eq!(approximate_fraction(0.5, 9), (1, 2));
        assert_eq!(approximate_fraction(0.3333333333, 9), (1, 3));
        assert_eq!(approximate_fraction(0.3333333333, 99), (1, 3));
        let (n, d) = approximate_fraction(std::f64::consts::PI - 3.0, 9);
        assert_eq!((n, d), (1, 7)); // 3 1/7
    }

    // ----- general keyword -------------------------------------------------

    #[test]
    fn test_general_keyword_section() {
        assert_eq!(format_number(42.5, "General", false), "42.5");
        assert_eq!(format_number(42.5, "general", false), "42.5");
    }
}
