//! Date/time rendering for the format engine.
//!
//! Converts a serial number through the broken-down date routine and walks
//! the format section emitting each token. Disambiguation: an `m` run is
//! minutes when the nearest preceding date token is an hour, or when the
//! next date token is a second; otherwise it is a month.

use crate::datetime::{from_serial, hijri_year, BrokenDate};
use chrono::Weekday;

const MONTHS_SHORT: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];
const MONTHS_LONG: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];
const DAYS_SHORT: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
const DAYS_LONG: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

fn weekday_index(w: Weekday) -> usize {
    w.num_days_from_sunday() as usize
}

/// Calendar modifier parsed from a leading `B1`/`B2` marker.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
enum Calendar {
    #[default]
    Gregorian,
    Hijri,
}

/// How many sub-second digits the section requests (`s.00` style), if any.
fn subsecond_digits(section: &str) -> usize {
    let chars: Vec<char> = section.chars().collect();
    let mut in_quotes = false;
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '"' => in_quotes = !in_quotes,
            '.' if !in_quotes => {
                let mut k = 0;
                while i + 1 + k < chars.len() && chars[i + 1 + k] == '0' {
                    k += 1;
                }
                if k > 0 {
                    return k;
                }
            }
            _ => {}
        }
        i += 1;
    }
    0
}

/// Render a serial number under a date-classified format section.
pub fn format_date(serial: f64, section: &str, date1904: bool) -> String {
    // Strip the calendar modifier before tokenizing.
    let (section, calendar) = match section
        .strip_prefix("B2")
        .or_else(|| section.strip_prefix("b2"))
    {
        Some(rest) => (rest, Calendar::Hijri),
        None => match section
            .strip_prefix("B1")
            .or_else(|| section.strip_prefix("b1"))
        {
            Some(rest) => (rest, Calendar::Gregorian),
            None => (section, Calendar::Gregorian),
        },
    };

    // Rounding precision depends on the tokens present: sub-second digits
    // round to that decimal, everything else rounds to whole seconds.
    let sub_digits = subsecond_digits(section);
    let scale = 86_400.0 * 10f64.powi(sub_digits as i32);
    let rounded = (serial * scale).round() / scale;

    let date = from_serial(rounded, date1904);
    let lower = section.to_ascii_lowercase();
    let has_meridiem =
        lower.contains("am/pm") || lower.contains("a/p") || section.contains("上午/下午");

    let (hour12, meridiem) = clock_hands(date.hour);

    let chars: Vec<char> = section.chars().collect();
    let len = chars.len();
    let mut out = String::with_capacity(len * 2);
    let mut i = 0;
    let mut in_quotes = false;
    // Tracks the last date field seen, for m-token disambiguation.
    let mut last_field: Option<char> = None;

    while i < len {
        let ch = chars[i];

        if ch == '"' {
            in_quotes = !in_quotes;
            i += 1;
            continue;
        }
        if in_quotes {
            out.push(ch);
            i += 1;
            continue;
        }
        if ch == '\\' && i + 1 < len {
            out.push(chars[i + 1]);
            i += 2;
            continue;
        }
        if ch == '_' && i + 1 < len {
            out.push(' ');
            i += 2;
            continue;
        }
        if ch == '*' && i + 1 < len {
            i += 2;
            continue;
        }

        // Elapsed-time brackets and currency brackets.
        if ch == '[' {
            if let Some(close) = chars[i + 1..].iter().position(|&c| c == ']') {
                let content: String = chars[i + 1..i + 1 + close].iter().collect();
                let consumed = close + 2;
                match super::section::classify_bracket(&content) {
                    super::section::BracketKind::Elapsed(which, _count) => {
                        let total_days = rounded.floor();
                        let day_seconds = ((rounded - total_days) * 86_400.0).round();
                        let total_seconds = total_days * 86_400.0 + day_seconds;
                        let value = match which {
                            'h' => (total_seconds / 3600.0).floor(),
                            'm' => (total_seconds / 60.0).floor(),
                            _ => total_seconds,
                        };
                        out.push_str(&format!("{}", value as i64));
                        last_field = Some(which);
                        i += consumed;
                        continue;
                    }
                    super::section::BracketKind::Currency(symbol) => {
                        out.push_str(&symbol);
                        i += consumed;
                        continue;
                    }
                    super::section::BracketKind::Color
                    | super::section::BracketKind::Condition(_) => {
                        i += consumed;
                        continue;
                    }
                    super::section::BracketKind::Other => {
                        out.push(ch);
                        i += 1;
                        continue;
                    }
                }
            }
            out.push(ch);
            i += 1;
            continue;
        }

        // Meridiem literals.
        if matches_at(&chars, i, "AM/PM") {
            out.push_str(if meridiem == 0 { "AM" } else { "PM" });
            i += 5;
            continue;
        }
        if matches_at(&chars, i, "A/P") {
            out.push(if meridiem == 0 { 'A' } else { 'P' });
            i += 3;
            continue;
        }
        if matches_at(&chars, i, "上午/下午") {
            out.push_str(if meridiem == 0 { "上午" } else { "下午" });
            i += 5;
            continue;
        }

        let l = ch.to_ascii_lowercase();
        if matches!(l, 'y' | 'm' | 'd' | 'h' | 's' | 'e' | 'g' | 'b') {
            let count = run_length(&chars, i, l);
            emit_field(
                &mut out,
                l,
                count,
                &date,
                calendar,
                has_meridiem,
                hour12,
                last_field,
                &chars,
                i + count,
            );
            if l != 'g' {
                last_field = Some(if l == 'm' {
                    // Remember resolved meaning so a following token sees it.
                    if is_minute(last_field, &chars, i + count) {
                        'M' // minute marker
                    } else {
                        'm'
                    }
                } else {
                    l
                });
            }
            i += count;
            continue;
        }

        // Sub-second digits directly after a seconds token.
        if ch == '.' && i + 1 < len && chars[i + 1] == '0' {
            let count = run_length(&chars, i + 1, '0');
            let scaled = (date.subsecond * 10f64.powi(count as i32)).round() as u64;
            out.push('.');
            out.push_str(&format!("{scaled:0>count$}"));
            i += 1 + count;
            continue;
        }

        out.push(ch);
        i += 1;
    }

    out
}

/// 12-hour hands: (hour on a 12-hour clock, 0 for AM / 1 for PM).
fn clock_hands(hour24: u32) -> (u32, u32) {
    match hour24 {
        0 => (12, 0),
        1..=11 => (hour24, 0),
        12 => (12, 1),
        _ => (hour24 - 12, 1),
    }
}

fn matches_at(chars: &[char], at: usize, literal: &str) -> bool {
    let lit: Vec<char> = literal.chars().collect();
    if at + lit.len() > chars.len() {
        return false;
    }
    chars[at..at + lit.len()]
        .iter()
        .zip(lit.iter())
        .all(|(a, b)| a.eq_ignore_ascii_case(b) || a == b)
}

fn run_length(chars: &[char], start: usize, letter: char) -> usize {
    chars[start..]
        .iter()
        .take_while(|c| c.eq_ignore_ascii_case(&letter))
        .count()
}

/// Whether an `m` run at this position means minutes: the nearest
/// preceding date field was an hour, or the next date field is a second.
fn is_minute(last_field: Option<char>, chars: &[char], after: usize) -> bool {
    if last_field == Some('h') {
        return true;
    }
    let mut k = after;
    while k < chars.len() {
        let c = chars[k].to_ascii_lowercase();
        if c == 's' {
            return true;
        }
        if matches!(c, ':' | ' ' | '.' | '0' | '[' | ']') {
            k += 1;
            continue;
        }
        break;
    }
    false
}

#[allow(clippy::too_many_arguments)]
fn emit_field(
    out: &mut String,
    letter: char,
    count: usize,
    date: &BrokenDate,
    calendar: Calendar,
    has_meridiem: bool,
    hour12: u32,
    last_field: Option<char>,
    chars: &[char],
    after: usize,
) {
    match letter {
        'y' => {
            if count <= 2 {
                out.push_str(&format!("{:02}", date.year.rem_euclid(100)));
            } else {
                out.push_str(&format!("{:04}", date.year));
            }
        }
        'e' => {
            // Era year: Hijri shifts by 581, Gregorian prints the year.
            let year = match calendar {
                Calendar::Hijri => hijri_year(date.year),
                Calendar::Gregorian => date.year,
            };
            out.push_str(&format!("{year}"));
        }
        'b' => {
            // Buddhist calendar year.
            let year = date.year + 543;
            if count <= 2 {
                out.push_str(&format!("{:02}", year.rem_euclid(100)));
            } else {
                out.push_str(&format!("{year:04}"));
            }
        }
        'g' => {} // era token: no output
        'm' => {
            if is_minute(last_field, chars, after) {
                if count == 1 {
                    out.push_str(&format!("{}", date.minute));
                } else {
                    out.push_str(&format!("{:02}", date.minute));
                }
            } else {
                match count {
                    1 => out.push_str(&format!("{}", date.month)),
                    2 => out.push_str(&format!("{:02}", date.month)),
                    3 => out.push_str(MONTHS_SHORT[(date.month - 1) as usize]),
                    5 => out.push_str(&MONTHS_LONG[(date.month - 1) as usize][..1]),
                    _ => out.push_str(MONTHS_LONG[(date.month - 1) as usize]),
                }
            }
        }
        'd' => match count {
            1 => out.push_str(&format!("{}", date.day)),
            2 => out.push_str(&format!("{:02}", date.day)),
            3 => out.push_str(DAYS_SHORT[weekday_index(date.weekday)]),
            _ => out.push_str(DAYS_LONG[weekday_index(date.weekday)]),
        },
        'h' => {
            let h = if has_meridiem { hour12 } else { date.hour };
            if count == 1 {
                out.push_str(&format!("{h}"));
            } else {
                out.push_str(&format!("{h:02}"));
            }
        }
        's' => {
            if count == 1 {
                out.push_str(&format!("{}", date.second));
            } else {
                out.push_str(&format!("{:02}", date.second));
            }
        }
        _ => {}
    }
}
