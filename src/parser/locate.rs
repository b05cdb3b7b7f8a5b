// Locating an arbitrary field value in source text (for values that did not
// come from a rule, e.g. an alternate extractor or a manual edit).
use crate::model::{FieldKey, FieldValue, Span};
use crate::utils::format_cs_number;
use regex::RegexBuilder;

/// Finds the first occurrence of `value` in `text`.
///
/// Tries a case-insensitive substring match first; numeric fields then fall
/// back to the Czech thousands-grouped form ("8 200 000").
pub fn locate_value(text: &str, field: &FieldKey, value: &FieldValue) -> Option<Span> {
    if text.is_empty() || value.is_empty() || *value == FieldValue::Integer(0) {
        return None;
    }

    let needle = value.to_string();
    if let Some(span) = find_case_insensitive(text, &needle) {
        return Some(span);
    }

    if !field.is_numeric() {
        return None;
    }
    let number = match value {
        FieldValue::Text(s) => s.trim().replace(',', ".").parse::<f64>().ok()?,
        other => other.as_f64()?,
    };
    ['\u{a0}', '\u{202f}', ' ']
        .into_iter()
        .map(|sep| format_cs_number(number, sep))
        .find_map(|formatted| find_exact(text, &formatted))
}

fn find_case_insensitive(text: &str, needle: &str) -> Option<Span> {
    let re = RegexBuilder::new(&regex::escape(needle))
        .case_insensitive(true)
        .build()
        .ok()?;
    re.find(text).map(|m| Span {
        start: m.start(),
        end: m.end(),
        text: m.as_str().to_string(),
    })
}

fn find_exact(text: &str, needle: &str) -> Option<Span> {
    text.find(needle).map(|start| Span {
        start,
        end: start + needle.len(),
        text: needle.to_string(),
    })
}
