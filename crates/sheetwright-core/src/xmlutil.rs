//! XML text utilities beyond what quick-xml provides: the five named
//! entities, numeric character references, and the Excel-specific
//! `_xHHHH_` escape used for control and surrogate characters.

/// Expand `&lt; &gt; &amp; &quot; &apos;`, numeric entities (decimal and
/// hexadecimal), and `_xHHHH_` sequences in a single pass.
pub fn unescape_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let bytes = input.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        let rest = &input[i..];

        if rest.starts_with('&') {
            if let Some(end) = rest.find(';') {
                let entity = &rest[1..end];
                let expanded = match entity {
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "amp" => Some('&'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    _ => {
                        if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
                            u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
                        } else if let Some(dec) = entity.strip_prefix('#') {
                            dec.parse::<u32>().ok().and_then(char::from_u32)
                        } else {
                            None
                        }
                    }
                };
                if let Some(c) = expanded {
                    out.push(c);
                    i += end + 1;
                    continue;
                }
            }
        }

        if rest.len() >= 7 {
            let b = rest.as_bytes();
            // Byte-level match keeps the slice on char boundaries: the
            // hex digits must be ASCII for the sequence to be valid.
            if b[0] == b'_'
                && b[1] == b'x'
                && b[6] == b'_'
                && b[2..6].iter().all(|c| c.is_ascii_hexdigit())
            {
                if let Some(c) = u32::from_str_radix(&rest[2..6], 16)
                    .ok()
                    .and_then(char::from_u32)
                {
                    out.push(c);
                    i += 7;
                    continue;
                }
            }
        }

        let c = rest.chars().next().unwrap_or('\0');
        out.push(c);
        i += c.len_utf8();
    }

    out
}

/// Escape text for XML content, emitting `_xHHHH_` for C0 control
/// characters (other than tab/LF/CR) and noncharacters.
pub fn escape_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\t' | '\n' | '\r' => out.push(c),
            c if (c as u32) < 0x20 || is_noncharacter(c) => {
                out.push_str(&format!("_x{:04X}_", c as u32));
            }
            c => out.push(c),
        }
    }
    out
}

fn is_noncharacter(c: char) -> bool {
    let v = c as u32;
    (0xFDD0..=0xFDEF).contains(&v) || (v & 0xFFFE) == 0xFFFE
}

/// Whether text content needs `xml:space="preserve"` when written: leading
/// or trailing whitespace, or an embedded newline.
pub fn needs_space_preserve(text: &str) -> bool {
    text.starts_with(' ')
        || text.ends_with(' ')
        || text.starts_with('\t')
        || text.ends_with('\t')
        || text.contains('\n')
}
