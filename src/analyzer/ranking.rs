use crate::config::EnabledParams;
use crate::model::{FieldKey, ObjectiveParam, Offer, Parameter};
use crate::normalizer::{normalize, raw_value, ParameterRanges};
use crate::utils::{parse_price, parse_size};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

/// Order of the active offer list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortCriterion {
    /// Highest aggregate chart score first.
    #[default]
    GraphScore,
    /// Cheapest first.
    Price,
    /// Largest first.
    Size,
    /// Cheapest per m² first; offers without price or size go last.
    PricePerSqm,
    Name,
    Manual,
}

impl FromStr for SortCriterion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "graphscore" | "score" => Ok(SortCriterion::GraphScore),
            "price" => Ok(SortCriterion::Price),
            "size" => Ok(SortCriterion::Size),
            "pricepersqm" => Ok(SortCriterion::PricePerSqm),
            "name" => Ok(SortCriterion::Name),
            "manual" => Ok(SortCriterion::Manual),
            other => Err(format!("unknown sort criterion '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GroupCriterion {
    #[default]
    None,
    Location,
    Renovation,
}

impl FromStr for GroupCriterion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(GroupCriterion::None),
            "location" => Ok(GroupCriterion::Location),
            "renovation" | "reno" => Ok(GroupCriterion::Renovation),
            other => Err(format!("unknown grouping '{}'", other)),
        }
    }
}

/// A section of the offer list.
#[derive(Debug, Clone)]
pub struct OfferGroup<'a> {
    /// Group value (location, renovation state), `None` for the ungrouped
    /// list and for the sold section.
    pub label: Option<String>,
    pub offers: Vec<&'a Offer>,
    pub is_sold: bool,
}

/// One chart axis: the normalized value of each plotted offer, keyed by offer id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub param: Parameter,
    pub values: Vec<(String, f64)>,
}

/// Unweighted sum of normalized values over the enabled parameters.
pub fn graph_score(offer: &Offer, enabled: &EnabledParams, ranges: &ParameterRanges) -> f64 {
    enabled
        .enabled()
        .into_iter()
        .map(|param| normalize(param, offer, ranges))
        .sum()
}

fn price_of(offer: &Offer) -> f64 {
    parse_price(offer.field(&FieldKey::Price)).unwrap_or(0.0)
}

fn size_of(offer: &Offer) -> f64 {
    parse_size(offer.field(&FieldKey::Size)).unwrap_or(0.0)
}

fn price_per_sqm_of(offer: &Offer) -> f64 {
    raw_value(ObjectiveParam::LowPricePerSqm, offer)
        .filter(|v| *v > 0.0)
        .unwrap_or(f64::INFINITY)
}

/// Sorts offers in place; ties keep their current order.
pub fn sort_offers(
    offers: &mut [&Offer],
    criterion: SortCriterion,
    enabled: &EnabledParams,
    ranges: &ParameterRanges,
) {
    match criterion {
        SortCriterion::GraphScore => {
            let mut scored: Vec<(f64, &Offer)> = offers
                .iter()
                .map(|o| (graph_score(o, enabled, ranges), *o))
                .collect();
            scored.sort_by(|a, b| b.0.total_cmp(&a.0));
            for (slot, (_, offer)) in offers.iter_mut().zip(scored) {
                *slot = offer;
            }
        }
        SortCriterion::Price => offers.sort_by(|a, b| price_of(a).total_cmp(&price_of(b))),
        SortCriterion::Size => offers.sort_by(|a, b| size_of(b).total_cmp(&size_of(a))),
        SortCriterion::PricePerSqm => {
            offers.sort_by(|a, b| price_per_sqm_of(a).total_cmp(&price_per_sqm_of(b)))
        }
        SortCriterion::Name => offers.sort_by(|a, b| compare_names(&a.name, &b.name)),
        SortCriterion::Manual => offers.sort_by_key(|o| o.manual_order),
    }
}

fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn group_key(offer: &Offer, criterion: GroupCriterion) -> Option<String> {
    let key = match criterion {
        GroupCriterion::None => return None,
        GroupCriterion::Location => FieldKey::Location,
        GroupCriterion::Renovation => FieldKey::Renovation,
    };
    Some(
        offer
            .field(&key)
            .map(|v| v.to_string())
            .unwrap_or_else(|| "Unknown".to_string()),
    )
}

/// Active offers sorted and grouped, followed by a trailing sold section
/// when any offer is sold.
pub fn arrange<'a>(
    offers: &'a [Offer],
    sort: SortCriterion,
    group: GroupCriterion,
    enabled: &EnabledParams,
    ranges: &ParameterRanges,
) -> Vec<OfferGroup<'a>> {
    let (mut active, sold): (Vec<&Offer>, Vec<&Offer>) = offers.iter().partition(|o| !o.sold);
    sort_offers(&mut active, sort, enabled, ranges);

    let mut groups: Vec<OfferGroup<'a>> = Vec::new();
    if group == GroupCriterion::None {
        groups.push(OfferGroup {
            label: None,
            offers: active,
            is_sold: false,
        });
    } else {
        for offer in active {
            let key = group_key(offer, group);
            match groups.iter_mut().find(|g| g.label == key) {
                Some(existing) => existing.offers.push(offer),
                None => groups.push(OfferGroup {
                    label: key,
                    offers: vec![offer],
                    is_sold: false,
                }),
            }
        }
    }

    if !sold.is_empty() {
        groups.push(OfferGroup {
            label: None,
            offers: sold,
            is_sold: true,
        });
    }
    groups
}

/// Offers drawn on the chart: starred ones, minus sold unless requested.
pub fn starred(offers: &[Offer], show_sold: bool) -> Vec<&Offer> {
    offers
        .iter()
        .filter(|o| o.featured && (show_sold || !o.sold))
        .collect()
}

pub fn chart_points(
    offers: &[Offer],
    enabled: &EnabledParams,
    ranges: &ParameterRanges,
    show_sold: bool,
) -> Vec<ChartPoint> {
    let plotted = starred(offers, show_sold);
    enabled
        .enabled()
        .into_iter()
        .map(|param| ChartPoint {
            param,
            values: plotted
                .iter()
                .map(|o| (o.id.clone(), normalize(param, o, ranges)))
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldValue, SubjectiveParam, SubjectiveRatings};

    fn offer(id: &str, price: i64, size: i64) -> Offer {
        let mut data = crate::model::OfferData::new();
        data.insert(FieldKey::Price, FieldValue::Integer(price));
        data.insert(FieldKey::Size, FieldValue::Integer(size));
        Offer {
            id: id.into(),
            name: id.to_uppercase(),
            color: String::new(),
            data,
            subjective_ratings: SubjectiveRatings::default(),
            notes: String::new(),
            featured: true,
            sold: false,
            manual_order: 0,
            image: None,
        }
    }

    #[test]
    fn graph_score_sums_enabled_params() {
        let mut enabled = EnabledParams::default();
        for p in Parameter::all() {
            enabled.set(p, false);
        }
        enabled.set(Parameter::Subjective(SubjectiveParam::Vibe), true);
        enabled.set(Parameter::Subjective(SubjectiveParam::Noise), true);
        let mut o = offer("a", 8_000_000, 60);
        o.subjective_ratings.set(SubjectiveParam::Vibe, 9);
        assert_eq!(graph_score(&o, &enabled, &ParameterRanges::default()), 14.0);
    }

    #[test]
    fn cheaper_offer_ranks_first_by_score() {
        let offers = vec![offer("pricey", 15_000_000, 60), offer("cheap", 6_000_000, 60)];
        let groups = arrange(
            &offers,
            SortCriterion::GraphScore,
            GroupCriterion::None,
            &EnabledParams::default(),
            &ParameterRanges::default(),
        );
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].offers[0].id, "cheap");
    }

    #[test]
    fn sold_offers_form_trailing_group() {
        let mut offers = vec![offer("a", 8_000_000, 50), offer("b", 9_000_000, 70)];
        offers[0].sold = true;
        let groups = arrange(
            &offers,
            SortCriterion::Price,
            GroupCriterion::None,
            &EnabledParams::default(),
            &ParameterRanges::default(),
        );
        assert_eq!(groups.len(), 2);
        assert!(groups[1].is_sold);
        assert_eq!(groups[1].offers[0].id, "a");
    }

    #[test]
    fn grouping_by_location_uses_unknown_bucket() {
        let mut offers = vec![offer("a", 1, 1), offer("b", 2, 2), offer("c", 3, 3)];
        offers[0].data.insert(FieldKey::Location, FieldValue::text("Letná"));
        offers[2].data.insert(FieldKey::Location, FieldValue::text("Letná"));
        let groups = arrange(
            &offers,
            SortCriterion::Price,
            GroupCriterion::Location,
            &EnabledParams::default(),
            &ParameterRanges::default(),
        );
        let labels: Vec<_> = groups.iter().map(|g| g.label.clone().unwrap()).collect();
        assert_eq!(labels, vec!["Letná", "Unknown"]);
        assert_eq!(groups[0].offers.len(), 2);
    }

    #[test]
    fn price_per_sqm_puts_missing_last() {
        let mut missing = offer("missing", 5_000_000, 50);
        missing.data.remove(&FieldKey::Size);
        let offers = vec![missing, offer("b", 9_000_000, 60), offer("a", 6_000_000, 60)];
        let mut refs: Vec<&Offer> = offers.iter().collect();
        sort_offers(
            &mut refs,
            SortCriterion::PricePerSqm,
            &EnabledParams::default(),
            &ParameterRanges::default(),
        );
        let ids: Vec<_> = refs.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "missing"]);
    }

    #[test]
    fn chart_skips_unstarred_and_sold() {
        let mut offers = vec![offer("a", 1, 1), offer("b", 2, 2), offer("c", 3, 3)];
        offers[1].featured = false;
        offers[2].sold = true;
        let points = chart_points(&offers, &EnabledParams::default(), &ParameterRanges::default(), false);
        assert_eq!(points.len(), 7);
        assert!(points.iter().all(|p| p.values.len() == 1 && p.values[0].0 == "a"));
        let points = chart_points(&offers, &EnabledParams::default(), &ParameterRanges::default(), true);
        assert_eq!(points[0].values.len(), 2);
    }

    #[test]
    fn parses_criteria() {
        assert_eq!("graph-score".parse::<SortCriterion>(), Ok(SortCriterion::GraphScore));
        assert_eq!("pricePerSqm".parse::<SortCriterion>(), Ok(SortCriterion::PricePerSqm));
        assert_eq!("reno".parse::<GroupCriterion>(), Ok(GroupCriterion::Renovation));
        assert!("weird".parse::<SortCriterion>().is_err());
    }
}
