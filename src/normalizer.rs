// Normalization of raw offer attributes onto the common 0–10 chart scale
use crate::model::{FieldKey, FieldValue, ObjectiveParam, Offer, Parameter};
use crate::utils::{first_decimal, format_price, leading_integer, parse_price, parse_size};
use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Neutral score used whenever a parameter cannot be scored meaningfully.
pub const MIDPOINT: f64 = 5.0;
/// Bucket used for a discrete parameter whose value is missing or unknown.
pub const DISCRETE_FALLBACK: &str = "None";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscreteKind {
    #[serde(rename = "discrete")]
    Discrete,
}

/// Normalization window of one objective parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterRange {
    /// Fixed label → score table (parking tiers); ignores min/max/inverse.
    Discrete {
        #[serde(rename = "type")]
        kind: DiscreteKind,
        values: BTreeMap<String, f64>,
    },
    /// Linear window; `inverse` means lower raw values score higher.
    Continuous {
        min: f64,
        max: f64,
        #[serde(default)]
        inverse: bool,
    },
}

impl ParameterRange {
    pub fn continuous(min: f64, max: f64, inverse: bool) -> Self {
        ParameterRange::Continuous { min, max, inverse }
    }

    pub fn discrete<'a>(values: impl IntoIterator<Item = (&'a str, f64)>) -> Self {
        ParameterRange::Discrete {
            kind: DiscreteKind::Discrete,
            values: values.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
        }
    }

    pub fn is_discrete(&self) -> bool {
        matches!(self, ParameterRange::Discrete { .. })
    }
}

/// Compiled-in range for a parameter.
pub fn default_range(param: ObjectiveParam) -> ParameterRange {
    match param {
        ObjectiveParam::LowPrice => ParameterRange::continuous(5_000_000.0, 20_000_000.0, true),
        ObjectiveParam::LowPricePerSqm => ParameterRange::continuous(100_000.0, 150_000.0, true),
        ObjectiveParam::InteriorArea => ParameterRange::continuous(0.0, 150.0, false),
        ObjectiveParam::Rooms => ParameterRange::continuous(1.0, 5.0, false),
        ObjectiveParam::Parking => {
            ParameterRange::discrete([("None", 0.0), ("Dedicated", 5.0), ("Garage", 10.0)])
        }
        ObjectiveParam::Cellar => ParameterRange::continuous(0.0, 15.0, false),
        ObjectiveParam::BalconyLoggia => ParameterRange::continuous(0.0, 20.0, false),
    }
}

/// Per-parameter range overrides. Parameters without an entry use `default_range`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterRanges(BTreeMap<ObjectiveParam, ParameterRange>);

impl Default for ParameterRanges {
    fn default() -> Self {
        Self(
            ObjectiveParam::ALL
                .into_iter()
                .map(|p| (p, default_range(p)))
                .collect(),
        )
    }
}

impl ParameterRanges {
    /// No overrides at all; every lookup falls through to the defaults.
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    pub fn get(&self, param: ObjectiveParam) -> Option<&ParameterRange> {
        self.0.get(&param)
    }

    /// Override if present, otherwise the compiled-in default.
    pub fn resolve(&self, param: ObjectiveParam) -> ParameterRange {
        self.0
            .get(&param)
            .cloned()
            .unwrap_or_else(|| default_range(param))
    }

    pub fn set(&mut self, param: ObjectiveParam, range: ParameterRange) {
        self.0.insert(param, range);
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjectiveParam, &ParameterRange)> {
        self.0.iter().map(|(p, r)| (*p, r))
    }

    /// Stored ranges layered over the defaults; legacy names are migrated and
    /// unknown names dropped.
    pub fn from_stored(stored: BTreeMap<String, ParameterRange>) -> Self {
        let mut ranges = Self::default();
        for (name, range) in stored {
            match ObjectiveParam::from_name(&name) {
                Some(param) => ranges.set(param, range),
                None => warn!("Dropping range for unknown parameter '{}'", name),
            }
        }
        ranges
    }
}

impl Serialize for ParameterRanges {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (param, range) in &self.0 {
            map.serialize_entry(param.name(), range)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ParameterRanges {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let stored: Option<BTreeMap<String, ParameterRange>> = Option::deserialize(deserializer)?;
        Ok(stored.map(ParameterRanges::from_stored).unwrap_or_default())
    }
}

/// Numeric value of a "size-like" optional attribute (cellar, balcony).
/// "no"/"none" count as 0, as does text without a number ("Yes").
fn optional_area(value: Option<&FieldValue>) -> Option<f64> {
    match value? {
        FieldValue::Text(s) => {
            let lowered = s.trim().to_lowercase();
            if lowered == "no" || lowered == "none" {
                Some(0.0)
            } else {
                Some(first_decimal(s).unwrap_or(0.0))
            }
        }
        number => number.as_f64(),
    }
}

/// Single raw number a continuous parameter is scored on, if derivable.
pub fn raw_value(param: ObjectiveParam, offer: &Offer) -> Option<f64> {
    let value = match param {
        ObjectiveParam::LowPrice => parse_price(offer.field(&FieldKey::Price)),
        ObjectiveParam::LowPricePerSqm => {
            let price = parse_price(offer.field(&FieldKey::Price))?;
            let size = parse_size(offer.field(&FieldKey::Size))?;
            (size > 0.0).then(|| price / size)
        }
        ObjectiveParam::InteriorArea => parse_size(offer.field(&FieldKey::Size)),
        ObjectiveParam::Rooms => offer
            .field(&FieldKey::Rooms)
            .and_then(|v| leading_integer(&v.to_string()))
            .map(f64::from),
        ObjectiveParam::Cellar => optional_area(offer.field(&FieldKey::Cellar)),
        ObjectiveParam::BalconyLoggia => optional_area(offer.field(&FieldKey::Balcony)),
        ObjectiveParam::Parking => None,
    };
    value.filter(|v| v.is_finite())
}

/// Linear map of `raw` into [0, 10]; degenerate windows score the midpoint.
pub fn scale(raw: f64, min: f64, max: f64, inverse: bool) -> f64 {
    if !min.is_finite() || !max.is_finite() || max == min || !raw.is_finite() {
        return MIDPOINT;
    }
    let normalized = ((raw - min) / (max - min) * 10.0).clamp(0.0, 10.0);
    if inverse { 10.0 - normalized } else { normalized }
}

/// Score of an objective parameter against a resolved range.
pub fn normalize_objective(param: ObjectiveParam, offer: &Offer, range: &ParameterRange) -> f64 {
    match range {
        ParameterRange::Discrete { values, .. } => {
            let label = offer
                .field(&FieldKey::Parking)
                .map(FieldValue::to_string)
                .unwrap_or_else(|| DISCRETE_FALLBACK.to_string());
            let score = values
                .get(&label)
                .or_else(|| values.get(DISCRETE_FALLBACK))
                .copied()
                .unwrap_or(0.0);
            if score.is_finite() { score.clamp(0.0, 10.0) } else { MIDPOINT }
        }
        ParameterRange::Continuous { min, max, inverse } => {
            // Unknown values count as raw 0.
            let raw = raw_value(param, offer).unwrap_or(0.0);
            scale(raw, *min, *max, *inverse)
        }
    }
}

/// Comparable 0–10 score of one parameter for one offer.
pub fn normalize(param: Parameter, offer: &Offer, ranges: &ParameterRanges) -> f64 {
    match param {
        Parameter::Subjective(p) => f64::from(offer.rating(p)),
        Parameter::Objective(p) => normalize_objective(p, offer, &ranges.resolve(p)),
    }
}

/// Human-readable raw value shown next to a chart axis.
pub fn describe_raw(param: Parameter, offer: &Offer) -> String {
    let text_or = |key: FieldKey, fallback: &str| {
        offer
            .field(&key)
            .map(FieldValue::to_string)
            .unwrap_or_else(|| fallback.to_string())
    };
    match param {
        Parameter::Objective(ObjectiveParam::LowPrice) => {
            format_price(parse_price(offer.field(&FieldKey::Price)))
        }
        Parameter::Objective(ObjectiveParam::LowPricePerSqm) => {
            match raw_value(ObjectiveParam::LowPricePerSqm, offer) {
                Some(per_sqm) => format!("{}/m²", format_price(Some(per_sqm.round()))),
                None => "N/A".to_string(),
            }
        }
        Parameter::Objective(ObjectiveParam::InteriorArea) => match offer.field(&FieldKey::Size) {
            Some(FieldValue::Text(s)) => s.clone(),
            Some(number) => format!("{} m²", number),
            None => "N/A".to_string(),
        },
        Parameter::Objective(ObjectiveParam::Rooms) => text_or(FieldKey::Rooms, "N/A"),
        Parameter::Objective(ObjectiveParam::Parking) => text_or(FieldKey::Parking, "None"),
        Parameter::Objective(ObjectiveParam::Cellar) => text_or(FieldKey::Cellar, "None"),
        Parameter::Objective(ObjectiveParam::BalconyLoggia) => text_or(FieldKey::Balcony, "None"),
        Parameter::Subjective(p) => format!("{}/10", offer.rating(p)),
    }
}
