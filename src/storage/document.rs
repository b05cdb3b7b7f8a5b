// Persisted/exported document: the offer list plus range metadata
use crate::model::{ImportError, Offer};
use crate::normalizer::ParameterRanges;
use chrono::NaiveDate;
use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    /// `null` in older documents; callers then keep their current ranges.
    #[serde(default)]
    pub parameter_ranges: Option<ParameterRanges>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub palette: Option<Vec<String>>,
}

/// `{ offers, meta: { parameterRanges } }`, the shape shared by local
/// persistence, file export and the realtime room.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default, deserialize_with = "deserialize_offers")]
    pub offers: Vec<Offer>,
    #[serde(default)]
    pub meta: Meta,
    /// Milliseconds since the epoch; only set on documents written to a room.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

/// Offers as an array, or as an index-keyed object the way the realtime
/// store returns arrays. Null and malformed entries are dropped.
fn deserialize_offers<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Offer>, D::Error> {
    let raw = Value::deserialize(deserializer)?;
    let entries: Vec<Value> = match raw {
        Value::Array(items) => items,
        Value::Object(map) => {
            let mut indexed: Vec<(usize, Value)> = map
                .into_iter()
                .filter_map(|(k, v)| k.parse::<usize>().ok().map(|i| (i, v)))
                .collect();
            indexed.sort_by_key(|(i, _)| *i);
            indexed.into_iter().map(|(_, v)| v).collect()
        }
        _ => Vec::new(),
    };

    Ok(entries
        .into_iter()
        .filter(|v| !v.is_null())
        .filter_map(|v| match serde_json::from_value::<Offer>(v) {
            Ok(offer) => Some(offer),
            Err(e) => {
                warn!("Skipping malformed offer: {}", e);
                None
            }
        })
        .collect())
}

impl Document {
    pub fn new(offers: Vec<Offer>, parameter_ranges: ParameterRanges) -> Self {
        Self {
            offers,
            meta: Meta {
                parameter_ranges: Some(parameter_ranges),
                palette: None,
            },
            updated_at: None,
        }
    }

    /// Copy without pasted images, which are too large for local storage and sync.
    pub fn stripped_for_persistence(&self) -> Document {
        let mut doc = self.clone();
        for offer in &mut doc.offers {
            offer.image = None;
        }
        doc
    }

    pub fn to_export_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parses an imported file. The file must carry an `offers` array.
    pub fn parse_import(json: &str) -> Result<Document, ImportError> {
        let value: Value = serde_json::from_str(json)?;
        if !value.get("offers").is_some_and(Value::is_array) {
            return Err(ImportError::MissingOffers);
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Parses a room snapshot (keys already restored).
    pub fn from_remote(value: Value) -> Result<Document, serde_json::Error> {
        serde_json::from_value(value)
    }
}

const SAMPLE_DOCUMENT: &str = include_str!("../../data/sample_offers.json");

/// Four sample Prague offers with the default ranges.
pub fn demo_document() -> Result<Document, ImportError> {
    let mut doc = Document::parse_import(SAMPLE_DOCUMENT)?;
    doc.meta.parameter_ranges = Some(ParameterRanges::default());
    Ok(doc)
}

/// `flat_comparison_YYYY-MM-DD.json`
pub fn export_file_name(date: NaiveDate) -> String {
    format!("flat_comparison_{}.json", date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldKey, FieldValue, ObjectiveParam, SubjectiveParam};
    use serde_json::json;

    #[test]
    fn import_requires_offer_array() {
        assert!(matches!(
            Document::parse_import(r#"{"meta": {}}"#),
            Err(ImportError::MissingOffers)
        ));
        assert!(matches!(
            Document::parse_import(r#"{"offers": {"0": {"id": "a"}}}"#),
            Err(ImportError::MissingOffers)
        ));
        assert!(matches!(
            Document::parse_import("{not json"),
            Err(ImportError::InvalidJson(_))
        ));
    }

    #[test]
    fn import_migrates_legacy_fields() {
        let json = r#"{
            "offers": [{
                "id": "1",
                "name": "Old",
                "data": {"PRICE": "8 200 000 CZK", "BALCONY": null, "CELLAR": true},
                "subjectiveRatings": {"Condition": 8, "Vibe": 7},
                "featured": true
            }],
            "meta": {"parameterRanges": {"Size": {"min": 20, "max": 90, "inverse": false}}}
        }"#;
        let doc = Document::parse_import(json).unwrap();
        let offer = &doc.offers[0];
        assert_eq!(offer.rating(SubjectiveParam::Renovation), 8);
        assert_eq!(offer.rating(SubjectiveParam::Vibe), 7);
        assert!(!offer.data.contains_key(&FieldKey::Balcony));
        assert_eq!(offer.data[&FieldKey::Cellar], FieldValue::text("Yes"));
        let ranges = doc.meta.parameter_ranges.unwrap();
        assert_eq!(
            ranges.get(ObjectiveParam::InteriorArea),
            Some(&crate::normalizer::ParameterRange::continuous(20.0, 90.0, false))
        );
    }

    #[test]
    fn null_ranges_stay_unset() {
        let doc = Document::parse_import(r#"{"offers": [], "meta": {"parameterRanges": null}}"#).unwrap();
        assert!(doc.meta.parameter_ranges.is_none());
    }

    #[test]
    fn remote_offers_may_be_index_keyed() {
        let value = json!({
            "offers": {"1": {"id": "b"}, "0": {"id": "a"}, "2": null},
            "meta": {},
            "updatedAt": 1700000000000_i64
        });
        let doc = Document::from_remote(value).unwrap();
        let ids: Vec<_> = doc.offers.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(doc.updated_at, Some(1_700_000_000_000));
    }

    #[test]
    fn persistence_drops_images() {
        let mut doc: Document = serde_json::from_value(json!({"offers": [{"id": "a", "image": "data:image/png;base64,AAA"}]})).unwrap();
        assert!(doc.offers[0].image.is_some());
        doc = doc.stripped_for_persistence();
        assert!(doc.offers[0].image.is_none());
        assert!(!doc.to_export_json().unwrap().contains("image"));
    }

    #[test]
    fn demo_document_loads() {
        let doc = demo_document().unwrap();
        assert_eq!(doc.offers.len(), 4);
        assert!(doc.offers.iter().all(|o| o.featured));
        assert_eq!(doc.offers[3].data[&FieldKey::Balcony], FieldValue::text("2"));
        assert_eq!(doc.meta.parameter_ranges, Some(ParameterRanges::default()));
    }

    #[test]
    fn export_name_uses_iso_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(export_file_name(date), "flat_comparison_2024-03-09.json");
    }
}
