// Core structs: Offer, field keys/values, comparison parameters, extraction results
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Objective listing attribute stored in `Offer::data`.
///
/// Keys the app does not know about are kept as `Other` so that documents
/// written by newer versions survive a load/save cycle.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldKey {
    Price,
    Size,
    Rooms,
    Floor,
    Address,
    Location,
    Balcony,
    Cellar,
    Parking,
    Building,
    Energy,
    Url,
    Renovation,
    Other(String),
}

impl FieldKey {
    /// Fields the add-offer form edits, in display order.
    pub const FORM_FIELDS: [FieldKey; 12] = [
        FieldKey::Price,
        FieldKey::Size,
        FieldKey::Rooms,
        FieldKey::Floor,
        FieldKey::Address,
        FieldKey::Location,
        FieldKey::Balcony,
        FieldKey::Cellar,
        FieldKey::Parking,
        FieldKey::Building,
        FieldKey::Energy,
        FieldKey::Url,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            FieldKey::Price => "PRICE",
            FieldKey::Size => "SIZE",
            FieldKey::Rooms => "ROOMS",
            FieldKey::Floor => "FLOOR",
            FieldKey::Address => "ADDRESS",
            FieldKey::Location => "LOCATION",
            FieldKey::Balcony => "BALCONY",
            FieldKey::Cellar => "CELLAR",
            FieldKey::Parking => "PARKING",
            FieldKey::Building => "BUILDING",
            FieldKey::Energy => "ENERGY",
            FieldKey::Url => "URL",
            FieldKey::Renovation => "RENOVATION",
            FieldKey::Other(name) => name,
        }
    }

    /// Whether the field holds a number (m², Kč) rather than free text.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            FieldKey::Price | FieldKey::Size | FieldKey::Balcony | FieldKey::Cellar
        )
    }

    pub fn unit(&self) -> Option<&'static str> {
        match self {
            FieldKey::Price => Some("Kč"),
            FieldKey::Size | FieldKey::Balcony | FieldKey::Cellar => Some("m²"),
            _ => None,
        }
    }
}

impl From<&str> for FieldKey {
    fn from(s: &str) -> Self {
        match s {
            "PRICE" => FieldKey::Price,
            "SIZE" => FieldKey::Size,
            "ROOMS" => FieldKey::Rooms,
            "FLOOR" => FieldKey::Floor,
            "ADDRESS" => FieldKey::Address,
            "LOCATION" => FieldKey::Location,
            "BALCONY" => FieldKey::Balcony,
            "CELLAR" => FieldKey::Cellar,
            "PARKING" => FieldKey::Parking,
            "BUILDING" => FieldKey::Building,
            "ENERGY" => FieldKey::Energy,
            "URL" => FieldKey::Url,
            "RENOVATION" => FieldKey::Renovation,
            other => FieldKey::Other(other.to_string()),
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FieldKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FieldKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(FieldKey::from(s.as_str()))
    }
}

/// Raw attribute value as typed or extracted. Absence of a key means "unknown".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Decimal(f64),
    Text(String),
}

impl FieldValue {
    /// Wraps a number, keeping whole numbers integral so they serialize as `54`, not `54.0`.
    pub fn number(n: f64) -> Self {
        if n.is_finite() && n.fract() == 0.0 && n.abs() < 9.0e15 {
            FieldValue::Integer(n as i64)
        } else {
            FieldValue::Decimal(n)
        }
    }

    pub fn text(s: impl Into<String>) -> Self {
        FieldValue::Text(s.into())
    }

    /// Numeric value, only for values that are already numbers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(i) => Some(*i as f64),
            FieldValue::Decimal(d) => Some(*d),
            FieldValue::Text(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, FieldValue::Text(s) if s.trim().is_empty())
    }

    /// Lenient conversion from arbitrary JSON; `null` and containers are dropped.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .map(FieldValue::Integer)
                .or_else(|| n.as_f64().map(FieldValue::Decimal)),
            Value::String(s) => Some(FieldValue::Text(s.clone())),
            Value::Bool(true) => Some(FieldValue::text("Yes")),
            Value::Bool(false) => Some(FieldValue::text("No")),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Decimal(d) => write!(f, "{}", d),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

pub type OfferData = BTreeMap<FieldKey, FieldValue>;

fn deserialize_data<'de, D: Deserializer<'de>>(deserializer: D) -> Result<OfferData, D::Error> {
    let raw: Option<BTreeMap<String, Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(k, v)| FieldValue::from_json(&v).map(|fv| (FieldKey::from(k.as_str()), fv)))
        .collect())
}

/// User-rated, non-measurable quality of a flat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SubjectiveParam {
    Location,
    #[serde(rename = "Light/Views")]
    LightViews,
    Layout,
    Renovation,
    Noise,
    Vibe,
}

impl SubjectiveParam {
    pub const ALL: [SubjectiveParam; 6] = [
        SubjectiveParam::Location,
        SubjectiveParam::LightViews,
        SubjectiveParam::Layout,
        SubjectiveParam::Renovation,
        SubjectiveParam::Noise,
        SubjectiveParam::Vibe,
    ];

    /// Rating used until the user (or a text hint) sets one.
    pub const DEFAULT_RATING: u8 = 5;

    /// Older documents used these names.
    pub const LEGACY_NAMES: [(&'static str, SubjectiveParam); 4] = [
        ("Public Transport", SubjectiveParam::Location),
        ("Condition", SubjectiveParam::Renovation),
        ("Amenities", SubjectiveParam::Vibe),
        ("Building Quality", SubjectiveParam::Layout),
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SubjectiveParam::Location => "Location",
            SubjectiveParam::LightViews => "Light/Views",
            SubjectiveParam::Layout => "Layout",
            SubjectiveParam::Renovation => "Renovation",
            SubjectiveParam::Noise => "Noise",
            SubjectiveParam::Vibe => "Vibe",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

/// Measurable comparison parameter derived from `Offer::data`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ObjectiveParam {
    #[serde(rename = "Low price")]
    LowPrice,
    #[serde(rename = "Low price per m²")]
    LowPricePerSqm,
    #[serde(rename = "Interior area")]
    InteriorArea,
    Rooms,
    Parking,
    Cellar,
    #[serde(rename = "Balcony/Loggia")]
    BalconyLoggia,
}

impl ObjectiveParam {
    pub const ALL: [ObjectiveParam; 7] = [
        ObjectiveParam::LowPrice,
        ObjectiveParam::LowPricePerSqm,
        ObjectiveParam::InteriorArea,
        ObjectiveParam::Rooms,
        ObjectiveParam::Parking,
        ObjectiveParam::Cellar,
        ObjectiveParam::BalconyLoggia,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ObjectiveParam::LowPrice => "Low price",
            ObjectiveParam::LowPricePerSqm => "Low price per m²",
            ObjectiveParam::InteriorArea => "Interior area",
            ObjectiveParam::Rooms => "Rooms",
            ObjectiveParam::Parking => "Parking",
            ObjectiveParam::Cellar => "Cellar",
            ObjectiveParam::BalconyLoggia => "Balcony/Loggia",
        }
    }

    /// Accepts the current names and the ones stored by older versions.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Price" => Some(ObjectiveParam::LowPrice),
            "Price per m²" => Some(ObjectiveParam::LowPricePerSqm),
            "Size" => Some(ObjectiveParam::InteriorArea),
            _ => Self::ALL.into_iter().find(|p| p.name() == name),
        }
    }
}

/// Any axis of the comparison chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Parameter {
    Objective(ObjectiveParam),
    Subjective(SubjectiveParam),
}

impl Parameter {
    /// Chart axis order: objective first, then subjective.
    pub fn all() -> Vec<Parameter> {
        ObjectiveParam::ALL
            .into_iter()
            .map(Parameter::Objective)
            .chain(SubjectiveParam::ALL.into_iter().map(Parameter::Subjective))
            .collect()
    }

    pub fn name(&self) -> &'static str {
        match self {
            Parameter::Objective(p) => p.name(),
            Parameter::Subjective(p) => p.name(),
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        ObjectiveParam::from_name(name)
            .map(Parameter::Objective)
            .or_else(|| SubjectiveParam::from_name(name).map(Parameter::Subjective))
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Parameter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Parameter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Parameter::from_name(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown parameter '{}'", s)))
    }
}

/// Ratings for all six subjective parameters, each in 1..=10.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubjectiveRatings(BTreeMap<SubjectiveParam, u8>);

impl Default for SubjectiveRatings {
    fn default() -> Self {
        Self(
            SubjectiveParam::ALL
                .into_iter()
                .map(|p| (p, SubjectiveParam::DEFAULT_RATING))
                .collect(),
        )
    }
}

impl SubjectiveRatings {
    pub fn get(&self, param: SubjectiveParam) -> u8 {
        self.0
            .get(&param)
            .copied()
            .unwrap_or(SubjectiveParam::DEFAULT_RATING)
    }

    pub fn set(&mut self, param: SubjectiveParam, rating: u8) {
        self.0.insert(param, rating.clamp(1, 10));
    }

    pub fn iter(&self) -> impl Iterator<Item = (SubjectiveParam, u8)> + '_ {
        self.0.iter().map(|(p, r)| (*p, *r))
    }

    /// Builds ratings from a stored name → value map.
    ///
    /// Canonical names win; a legacy name only fills a parameter that is
    /// still at its default.
    pub fn from_raw(raw: &BTreeMap<String, Value>) -> Self {
        let mut ratings = Self::default();
        for param in SubjectiveParam::ALL {
            if let Some(r) = raw.get(param.name()).and_then(rating_from_json) {
                ratings.set(param, r);
            }
        }
        for (legacy, param) in SubjectiveParam::LEGACY_NAMES {
            if ratings.get(param) != SubjectiveParam::DEFAULT_RATING {
                continue;
            }
            if let Some(r) = raw.get(legacy).and_then(rating_from_json) {
                ratings.set(param, r);
            }
        }
        ratings
    }
}

fn rating_from_json(value: &Value) -> Option<u8> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !n.is_finite() {
        return None;
    }
    Some(n.round().clamp(1.0, 10.0) as u8)
}

impl<'de> Deserialize<'de> for SubjectiveRatings {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw: Option<BTreeMap<String, Value>> = Option::deserialize(deserializer)?;
        Ok(raw.map(|r| SubjectiveRatings::from_raw(&r)).unwrap_or_default())
    }
}

/// One listing under comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub color: String,
    #[serde(default, deserialize_with = "deserialize_data")]
    pub data: OfferData,
    #[serde(default)]
    pub subjective_ratings: SubjectiveRatings,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub sold: bool,
    #[serde(default)]
    pub manual_order: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Offer {
    pub fn field(&self, key: &FieldKey) -> Option<&FieldValue> {
        self.data.get(key).filter(|v| !v.is_empty())
    }

    pub fn rating(&self, param: SubjectiveParam) -> u8 {
        self.subjective_ratings.get(param)
    }
}

/// Substring of the original pasted text a value was extracted from.
/// `start`/`end` are byte offsets, so `&text[start..end] == self.text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

/// Outcome of one extraction call. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractionResult {
    pub values: BTreeMap<FieldKey, FieldValue>,
    pub sources: BTreeMap<FieldKey, Span>,
    /// Subjective ratings suggested by wording hints; only triggered ones are present.
    pub ratings: BTreeMap<SubjectiveParam, u8>,
    /// Suggested display name, empty when nothing usable was found.
    pub name: String,
}

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("invalid rule pattern '{rule}': {source}")]
    Pattern {
        rule: &'static str,
        #[source]
        source: regex::Error,
    },
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Invalid JSON file: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("Invalid file: no offers found")]
    MissingOffers,
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid room code '{0}'")]
    InvalidRoomCode(String),
    #[error("remote store error: {0}")]
    Remote(String),
}
