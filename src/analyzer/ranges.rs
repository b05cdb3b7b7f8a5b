// Auto-fitting of continuous parameter ranges to the starred offers
use crate::model::{ObjectiveParam, Offer};
use crate::normalizer::{raw_value, ParameterRange, ParameterRanges};
use tracing::{debug, info};

/// Share of the observed spread added on each side of a fitted window.
const PADDING_RATIO: f64 = 0.1;
/// Padding relative to the value itself when all observed values are equal.
const FLAT_PADDING_RATIO: f64 = 0.05;

#[derive(Debug, Clone, PartialEq)]
pub struct FitOutcome {
    pub ranges: ParameterRanges,
    /// Parameters whose window was replaced.
    pub updated: Vec<ObjectiveParam>,
}

/// Padded window around `values`, or `None` with fewer than two usable values.
pub fn fit_window(values: &[f64]) -> Option<(f64, f64)> {
    let usable: Vec<f64> = values
        .iter()
        .copied()
        .filter(|v| v.is_finite() && *v > 0.0)
        .collect();
    if usable.len() < 2 {
        return None;
    }
    let min = usable.iter().copied().fold(f64::INFINITY, f64::min);
    let max = usable.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let spread = max - min;
    let pad = if spread > 0.0 {
        spread * PADDING_RATIO
    } else {
        max * FLAT_PADDING_RATIO
    };
    Some(((min - pad).floor(), (max + pad).ceil()))
}

/// Refits every continuous range to the starred, unsold offers.
///
/// Discrete ranges and parameters with fewer than two positive values keep
/// their current window. The `inverse` flag is never changed.
pub fn auto_fit(offers: &[Offer], current: &ParameterRanges) -> FitOutcome {
    let selected: Vec<&Offer> = offers.iter().filter(|o| o.featured && !o.sold).collect();
    let mut ranges = current.clone();
    let mut updated = Vec::new();

    for param in ObjectiveParam::ALL {
        let inverse = match current.resolve(param) {
            ParameterRange::Continuous { inverse, .. } => inverse,
            ParameterRange::Discrete { .. } => continue,
        };
        let values: Vec<f64> = selected
            .iter()
            .filter_map(|o| raw_value(param, o))
            .collect();
        match fit_window(&values) {
            Some((min, max)) => {
                debug!("Fitted {} to [{}, {}]", param.name(), min, max);
                ranges.set(param, ParameterRange::continuous(min, max, inverse));
                updated.push(param);
            }
            None => debug!("Not enough data to fit {}", param.name()),
        }
    }

    info!(
        "📐 Auto-fit over {} offers updated {} ranges",
        selected.len(),
        updated.len()
    );
    FitOutcome { ranges, updated }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldKey, FieldValue, SubjectiveRatings};

    fn offer(price: i64, featured: bool, sold: bool) -> Offer {
        let mut data = crate::model::OfferData::new();
        data.insert(FieldKey::Price, FieldValue::Integer(price));
        Offer {
            id: format!("o{}", price),
            name: String::new(),
            color: String::new(),
            data,
            subjective_ratings: SubjectiveRatings::default(),
            notes: String::new(),
            featured,
            sold,
            manual_order: 0,
            image: None,
        }
    }

    #[test]
    fn window_pads_spread() {
        assert_eq!(fit_window(&[8_000_000.0, 12_000_000.0]), Some((7_600_000.0, 12_400_000.0)));
        assert_eq!(fit_window(&[100.0, 100.0]), Some((95.0, 105.0)));
        assert_eq!(fit_window(&[3.0, 0.0]), None);
        assert_eq!(fit_window(&[f64::NAN, 2.0]), None);
    }

    #[test]
    fn fit_uses_starred_unsold_offers_only() {
        let offers = vec![
            offer(8_000_000, true, false),
            offer(12_000_000, true, false),
            offer(30_000_000, false, false),
            offer(1_000_000, true, true),
        ];
        let outcome = auto_fit(&offers, &ParameterRanges::default());
        assert_eq!(outcome.updated, vec![ObjectiveParam::LowPrice]);
        match outcome.ranges.get(ObjectiveParam::LowPrice) {
            Some(ParameterRange::Continuous { min, max, inverse }) => {
                assert!(*min <= 8_000_000.0 && *max >= 12_000_000.0);
                assert!(*min < 8_000_000.0 && *max > 12_000_000.0);
                assert!(*inverse);
            }
            other => panic!("unexpected range {:?}", other),
        }
    }

    #[test]
    fn single_offer_changes_nothing() {
        let offers = vec![offer(8_000_000, true, false)];
        let before = ParameterRanges::default();
        let outcome = auto_fit(&offers, &before);
        assert!(outcome.updated.is_empty());
        assert_eq!(outcome.ranges, before);
    }
}
