// Rule-based extraction of listing fields from pasted ad copy
use crate::model::{ExtractionResult, FieldKey, FieldValue, ParserError, Span};
use crate::parser::hints::{scan_hints, HintRule, DEFAULT_HINTS};
use crate::parser::rules::{default_rules, FieldRule};
use crate::parser::Extractor;
use crate::utils::strip_invisible;
use tracing::{debug, trace};

/// Turns free-form listing text into field values with source spans.
pub struct ListingExtractor {
    rules: Vec<Box<dyn FieldRule>>,
    hints: &'static [HintRule],
}

impl ListingExtractor {
    /// Extractor with the default Czech rule set.
    pub fn new() -> Result<Self, ParserError> {
        Ok(Self::with_rules(default_rules()?))
    }

    /// Extractor over a custom rule list. Rules are tried in order; the first
    /// rule to produce a value for a field wins.
    pub fn with_rules(rules: Vec<Box<dyn FieldRule>>) -> Self {
        Self {
            rules,
            hints: DEFAULT_HINTS,
        }
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }
}

impl Extractor for ListingExtractor {
    fn extract(&self, text: &str) -> ExtractionResult {
        let cleaned = strip_invisible(text);
        let mut result = ExtractionResult::default();

        for rule in &self.rules {
            let field = rule.field();
            if result.values.contains_key(&field) {
                continue;
            }
            let Some(found) = rule.apply(&cleaned) else {
                continue;
            };
            trace!("rule {} matched {:?}", rule.name(), found.matched);

            // Spans point into the text the user sees, not the cleaned copy.
            match text.find(&found.matched) {
                Some(start) => {
                    result.sources.insert(
                        field.clone(),
                        Span {
                            start,
                            end: start + found.matched.len(),
                            text: found.matched,
                        },
                    );
                }
                None => debug!("no verbatim source for {} ({})", field, rule.name()),
            }
            result.values.insert(field, found.value);
        }

        if !result.values.contains_key(&FieldKey::Address) {
            if let Some(location) = result.values.get(&FieldKey::Location).cloned() {
                result.values.insert(FieldKey::Address, location);
                if let Some(span) = result.sources.get(&FieldKey::Location).cloned() {
                    result.sources.insert(FieldKey::Address, span);
                }
            }
        }

        result.ratings = scan_hints(&cleaned, self.hints);
        result.name = suggest_name(&result);
        result
    }
}

/// "<street> <rooms>" when both are known, otherwise the street or location alone.
fn suggest_name(result: &ExtractionResult) -> String {
    let street = result
        .values
        .get(&FieldKey::Address)
        .map(|v| {
            let address = v.to_string();
            address.split(',').next().unwrap_or_default().trim().to_string()
        })
        .filter(|s| !s.is_empty())
        .or_else(|| result.values.get(&FieldKey::Location).map(FieldValue::to_string))
        .unwrap_or_default();
    let rooms = result
        .values
        .get(&FieldKey::Rooms)
        .map(FieldValue::to_string)
        .unwrap_or_default();

    if !street.is_empty() && !rooms.is_empty() {
        format!("{} {}", street, rooms)
    } else {
        street
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> ListingExtractor {
        ListingExtractor::new().unwrap()
    }

    #[test]
    fn invisible_chars_do_not_break_matching() {
        let text = "Cena: 8\u{200B} 200 000 Kč, sklep: ano";
        let result = extractor().extract(text);
        assert_eq!(result.values.get(&FieldKey::Price), Some(&FieldValue::Integer(8_200_000)));
        // The matched text only exists in the cleaned copy.
        assert!(!result.sources.contains_key(&FieldKey::Price));
        let cellar = &result.sources[&FieldKey::Cellar];
        assert_eq!(&text[cellar.start..cellar.end], cellar.text);
    }

    #[test]
    fn address_falls_back_to_location() {
        let result = extractor().extract("Krásný byt, Vinohrady, 3+1");
        assert_eq!(result.values[&FieldKey::Address], FieldValue::text("Vinohrady"));
        assert_eq!(result.sources[&FieldKey::Address], result.sources[&FieldKey::Location]);
        assert_eq!(result.name, "Vinohrady 3+1");
    }

    #[test]
    fn street_rule_wins_over_title() {
        let result = extractor().extract("Prodej bytu 2+kk, Letná. Ulice: Milady Horákové");
        assert_eq!(result.values[&FieldKey::Address], FieldValue::text("Milady"));
        assert_eq!(result.name, "Milady 2+kk");
    }

    #[test]
    fn parking_and_building_keywords() {
        let result = extractor().extract("Panelový dům, parkovací stání ve dvoře");
        assert_eq!(result.values[&FieldKey::Parking], FieldValue::text("Dedicated"));
        assert_eq!(result.values[&FieldKey::Building], FieldValue::text("Panel"));
        let result = extractor().extract("Cihlový dům s garáží");
        assert_eq!(result.values[&FieldKey::Parking], FieldValue::text("Garage"));
        assert_eq!(result.values[&FieldKey::Building], FieldValue::text("Brick"));
    }

    #[test]
    fn empty_text_gives_empty_result() {
        let result = extractor().extract("");
        assert!(result.values.is_empty());
        assert!(result.sources.is_empty());
        assert!(result.name.is_empty());
    }
}
