// Utility functions
use crate::model::FieldValue;
use chrono::Utc;
use rand::Rng;

/// Characters listing sites inject into copy: zero-width (non-)joiners/space,
/// BOM, soft hyphen, word joiner, Mongolian vowel separator.
pub const INVISIBLE_CHARS: [char; 7] = [
    '\u{200B}', '\u{200C}', '\u{200D}', '\u{FEFF}', '\u{00AD}', '\u{2060}', '\u{180E}',
];

pub fn is_invisible(c: char) -> bool {
    INVISIBLE_CHARS.contains(&c)
}

/// Removes invisible characters.
pub fn strip_invisible(text: &str) -> String {
    text.chars().filter(|c| !is_invisible(*c)).collect()
}

/// Parses a price: every non-digit is dropped. Numbers pass through unchanged.
pub fn parse_price(value: Option<&FieldValue>) -> Option<f64> {
    match value? {
        FieldValue::Text(s) => {
            let digits: String = strip_invisible(s)
                .chars()
                .filter(|c| c.is_ascii_digit())
                .collect();
            if digits.is_empty() {
                None
            } else {
                digits.parse::<f64>().ok()
            }
        }
        number => number.as_f64(),
    }
}

/// Parses an area: the first decimal number (`,` or `.` separator). Numbers pass through.
pub fn parse_size(value: Option<&FieldValue>) -> Option<f64> {
    match value? {
        FieldValue::Text(s) => first_decimal(&strip_invisible(s)),
        number => number.as_f64(),
    }
}

/// First `\d+([.,]\d+)?` in the text, as a number.
pub fn first_decimal(text: &str) -> Option<f64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let rest = &text[start..];
    let int_len = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let mut number = rest[..int_len].to_string();

    let tail = &rest[int_len..];
    let mut chars = tail.chars();
    if let Some('.' | ',') = chars.next() {
        let frac: String = chars.take_while(|c| c.is_ascii_digit()).collect();
        if !frac.is_empty() {
            number.push('.');
            number.push_str(&frac);
        }
    }
    number.parse::<f64>().ok()
}

/// First run of digits in the text ("3+kk" → 3).
pub fn leading_integer(text: &str) -> Option<u32> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let rest = &text[start..];
    let len = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    rest[..len].parse().ok()
}

/// Groups the integer part of a number in threes with `sep`.
fn group_thousands(digits: &str, sep: char) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(sep);
        }
        out.push(c);
    }
    out
}

/// "8 200 000 Kč"; `N/A` for missing or zero prices.
pub fn format_price(price: Option<f64>) -> String {
    match price {
        Some(p) if p != 0.0 && p.is_finite() => {
            let rounded = p.round();
            let digits = format!("{}", rounded.abs() as u64);
            let sign = if rounded < 0.0 { "-" } else { "" };
            format!("{}{} Kč", sign, group_thousands(&digits, ' '))
        }
        _ => "N/A".to_string(),
    }
}

/// Czech locale number formatting: groups separated by `group_sep`,
/// decimal comma, at most three fraction digits.
pub fn format_cs_number(n: f64, group_sep: char) -> String {
    let negative = n < 0.0;
    let scaled = (n.abs() * 1000.0).round() as u64;
    let int_part = scaled / 1000;
    let frac_part = scaled % 1000;

    let mut out = String::new();
    if negative && scaled != 0 {
        out.push('-');
    }
    let digits = int_part.to_string();
    // cs-CZ leaves four-digit numbers ungrouped
    if digits.len() > 4 {
        out.push_str(&group_thousands(&digits, group_sep));
    } else {
        out.push_str(&digits);
    }
    if frac_part != 0 {
        let frac = format!("{:03}", frac_part);
        out.push(',');
        out.push_str(frac.trim_end_matches('0'));
    }
    out
}

/// Fresh offer id: `offer_<unix millis>_<9 base36 chars>`.
pub fn generate_id() -> String {
    const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::rng();
    let suffix: String = (0..9)
        .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
        .collect();
    format!("offer_{}_{}", Utc::now().timestamp_millis(), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_strips_everything_but_digits() {
        let v = FieldValue::text("10 950 000 CZK");
        assert_eq!(parse_price(Some(&v)), Some(10_950_000.0));
        let hidden = FieldValue::text("8\u{200B}200\u{00AD}000 Kč");
        assert_eq!(parse_price(Some(&hidden)), Some(8_200_000.0));
        assert_eq!(parse_price(Some(&FieldValue::text("N/A"))), None);
        assert_eq!(parse_price(Some(&FieldValue::Integer(7))), Some(7.0));
        assert_eq!(parse_price(None), None);
    }

    #[test]
    fn size_takes_first_decimal() {
        assert_eq!(parse_size(Some(&FieldValue::text("74 m²"))), Some(74.0));
        assert_eq!(parse_size(Some(&FieldValue::text("approx 54,5 m2"))), Some(54.5));
        assert_eq!(parse_size(Some(&FieldValue::text("12."))), Some(12.0));
        assert_eq!(parse_size(Some(&FieldValue::text("none"))), None);
        assert_eq!(parse_size(Some(&FieldValue::Decimal(61.2))), Some(61.2));
    }

    #[test]
    fn leading_integer_of_layout() {
        assert_eq!(leading_integer("3+kk"), Some(3));
        assert_eq!(leading_integer("layout 4+1"), Some(4));
        assert_eq!(leading_integer("garsoniera"), None);
    }

    #[test]
    fn formats_prices_and_czech_numbers() {
        assert_eq!(format_price(Some(8_200_000.0)), "8 200 000 Kč");
        assert_eq!(format_price(Some(0.0)), "N/A");
        assert_eq!(format_price(None), "N/A");
        assert_eq!(format_cs_number(8_200_000.0, '\u{a0}'), "8\u{a0}200\u{a0}000");
        assert_eq!(format_cs_number(2500.0, ' '), "2500");
        assert_eq!(format_cs_number(54.5, ' '), "54,5");
    }

    #[test]
    fn ids_are_unique_and_prefixed() {
        let a = generate_id();
        let b = generate_id();
        assert!(a.starts_with("offer_"));
        assert_ne!(a, b);
    }
}
