// Add-offer draft: extracted values overlaid with the user's own edits
use crate::collection::NewOffer;
use crate::model::{ExtractionResult, FieldKey, FieldValue, OfferData, Span, SubjectiveParam, SubjectiveRatings};
use crate::parser::Extractor;
use std::collections::BTreeMap;

/// Anything the add form can edit.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum DraftField {
    Field(FieldKey),
    Rating(SubjectiveParam),
    Name,
}

/// A user edit always beats the extracted value and survives re-extraction.
#[derive(Debug, Clone, Default)]
pub struct OfferDraft {
    text: String,
    url: String,
    result: Option<ExtractionResult>,
    edits: BTreeMap<DraftField, FieldValue>,
}

impl OfferDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn result(&self) -> Option<&ExtractionResult> {
        self.result.as_ref()
    }

    /// Runs `extractor` over `text`. Earlier user edits are kept.
    pub fn apply_extraction(&mut self, extractor: &dyn Extractor, text: &str, url: &str) {
        let mut result = extractor.extract(text);
        if !url.trim().is_empty() {
            result.values.insert(FieldKey::Url, FieldValue::text(url.trim()));
        }
        self.text = text.to_string();
        self.url = url.to_string();
        self.result = Some(result);
    }

    /// Back to an empty draft.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn extracted(&self, field: &DraftField) -> Option<FieldValue> {
        let result = self.result.as_ref()?;
        match field {
            DraftField::Field(key) => result.values.get(key).cloned(),
            DraftField::Rating(param) => result
                .ratings
                .get(param)
                .map(|r| FieldValue::Integer(i64::from(*r))),
            DraftField::Name => {
                (!result.name.is_empty()).then(|| FieldValue::text(result.name.clone()))
            }
        }
    }

    /// Current value: user edit, else extracted value, else the rating default.
    pub fn value_of(&self, field: &DraftField) -> Option<FieldValue> {
        if let Some(edit) = self.edits.get(field) {
            return Some(edit.clone());
        }
        if let Some(value) = self.extracted(field) {
            return Some(value);
        }
        match field {
            DraftField::Rating(_) => Some(FieldValue::Integer(i64::from(
                SubjectiveParam::DEFAULT_RATING,
            ))),
            _ => None,
        }
    }

    /// True while the shown value still comes from the extractor.
    pub fn is_extracted(&self, field: &DraftField) -> bool {
        !self.edits.contains_key(field) && self.extracted(field).is_some()
    }

    /// Where in the pasted text an extracted value came from.
    pub fn source(&self, key: &FieldKey) -> Option<&Span> {
        self.result.as_ref()?.sources.get(key)
    }

    /// Pins the extracted value as a user edit, the way focusing a field does.
    pub fn focus(&mut self, field: DraftField) {
        if self.edits.contains_key(&field) {
            return;
        }
        if let Some(value) = self.extracted(&field) {
            self.edits.insert(field, value);
        }
    }

    pub fn set(&mut self, field: DraftField, value: FieldValue) {
        self.edits.insert(field, value);
    }

    /// Builds the offer to add. Empty fields are left out; ratings default to 5.
    pub fn into_new_offer(&self, existing_count: usize) -> NewOffer {
        let data: OfferData = FieldKey::FORM_FIELDS
            .iter()
            .filter_map(|key| {
                let value = self.value_of(&DraftField::Field(key.clone()))?;
                (!value.is_empty()).then(|| (key.clone(), value))
            })
            .collect();

        let mut ratings = SubjectiveRatings::default();
        for param in SubjectiveParam::ALL {
            let rating = self
                .value_of(&DraftField::Rating(param))
                .and_then(|v| match v {
                    FieldValue::Text(s) => s.trim().parse::<f64>().ok(),
                    number => number.as_f64(),
                })
                .filter(|r| r.is_finite() && *r > 0.0)
                .map(|r| r.round().min(10.0) as u8)
                .unwrap_or(SubjectiveParam::DEFAULT_RATING);
            ratings.set(param, rating);
        }

        let name = self
            .value_of(&DraftField::Name)
            .map(|v| v.to_string())
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| format!("Offer {}", existing_count + 1));

        NewOffer {
            name,
            data,
            color: None,
            subjective_ratings: Some(ratings),
        }
    }
}
