use flat_compare::analyzer::{auto_fit, graph_score};
use flat_compare::config::EnabledParams;
use flat_compare::model::{ObjectiveParam, SubjectiveParam};
use flat_compare::normalizer::{normalize, scale, ParameterRange, ParameterRanges};
use flat_compare::{Offer, Parameter};
use serde_json::{json, Value};

fn offer(id: &str, data: Value) -> Offer {
    serde_json::from_value(json!({"id": id, "name": id, "data": data, "featured": true})).unwrap()
}

fn price() -> Parameter {
    Parameter::Objective(ObjectiveParam::LowPrice)
}

#[test]
fn every_score_stays_within_bounds() {
    let ranges = ParameterRanges::default();
    let offers = [
        offer("cheap", json!({"PRICE": 1_000_000, "SIZE": 400, "CELLAR": "99 m2"})),
        offer("pricey", json!({"PRICE": "99 000 000 Kč", "SIZE": "5 m²", "BALCONY": "no"})),
        offer("empty", json!({})),
        offer("garbage", json!({"PRICE": "dohodou", "ROOMS": "garsonka", "PARKING": "Street"})),
    ];
    for o in &offers {
        for param in Parameter::all() {
            let score = normalize(param, o, &ranges);
            assert!((0.0..=10.0).contains(&score), "{} of {} = {}", param, o.id, score);
        }
    }
}

#[test]
fn lower_price_scores_higher() {
    let ranges = ParameterRanges::default();
    let cheap = normalize(price(), &offer("a", json!({"PRICE": 6_000_000})), &ranges);
    let pricey = normalize(price(), &offer("b", json!({"PRICE": 15_000_000})), &ranges);
    assert!(cheap > pricey);
    assert_eq!(normalize(price(), &offer("c", json!({"PRICE": 20_000_000})), &ranges), 0.0);
}

#[test]
fn inverse_window_flips_the_scale() {
    assert_eq!(scale(0.0, 0.0, 10.0, true), 10.0);
    assert_eq!(scale(10.0, 0.0, 10.0, true), 0.0);
    assert_eq!(scale(2.5, 0.0, 10.0, false), 2.5);
}

#[test]
fn parking_tiers() {
    let ranges = ParameterRanges::default();
    let parking = Parameter::Objective(ObjectiveParam::Parking);
    let score = |value: Value| normalize(parking, &offer("p", json!({"PARKING": value})), &ranges);
    assert_eq!(score(json!("Garage")), 10.0);
    assert_eq!(score(json!("Dedicated")), 5.0);
    assert_eq!(score(json!("Street")), 0.0);
    assert_eq!(normalize(parking, &offer("none", json!({})), &ranges), 0.0);
}

#[test]
fn subjective_scores_are_ratings() {
    let mut o = offer("r", json!({}));
    o.subjective_ratings.set(SubjectiveParam::Vibe, 9);
    let ranges = ParameterRanges::default();
    assert_eq!(normalize(Parameter::Subjective(SubjectiveParam::Vibe), &o, &ranges), 9.0);
    assert_eq!(normalize(Parameter::Subjective(SubjectiveParam::Noise), &o, &ranges), 5.0);
}

#[test]
fn degenerate_window_scores_midpoint() {
    let mut ranges = ParameterRanges::default();
    ranges.set(ObjectiveParam::LowPrice, ParameterRange::continuous(8e6, 8e6, true));
    assert_eq!(normalize(price(), &offer("a", json!({"PRICE": 9_000_000})), &ranges), 5.0);
}

#[test]
fn auto_fit_pads_observed_prices() {
    let offers = vec![
        offer("a", json!({"PRICE": 8_000_000})),
        offer("b", json!({"PRICE": 12_000_000})),
    ];
    let outcome = auto_fit(&offers, &ParameterRanges::default());
    assert!(outcome.updated.contains(&ObjectiveParam::LowPrice));
    assert_eq!(
        outcome.ranges.get(ObjectiveParam::LowPrice),
        Some(&ParameterRange::continuous(7_600_000.0, 12_400_000.0, true))
    );
    // Parking is discrete and never refitted.
    assert!(!outcome.updated.contains(&ObjectiveParam::Parking));

    let cheaper = normalize(price(), &offers[0], &outcome.ranges);
    assert!((cheaper - 9.1667).abs() < 1e-3);
}

#[test]
fn graph_score_sums_enabled_parameters() {
    let enabled = EnabledParams::default();
    let ranges = ParameterRanges::default();
    let o = offer("a", json!({"PRICE": 8_000_000, "SIZE": 60}));
    let expected: f64 = enabled
        .enabled()
        .into_iter()
        .map(|p| normalize(p, &o, &ranges))
        .sum();
    assert!((graph_score(&o, &enabled, &ranges) - expected).abs() < 1e-9);
}
