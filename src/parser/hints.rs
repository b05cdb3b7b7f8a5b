// Subjective rating hints: keyword scan over lowercased listing text.
use crate::model::SubjectiveParam;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintEffect {
    /// Sets the rating unless an earlier hint already set it.
    SetIfUnset(u8),
    /// Sets the rating, overriding earlier hints.
    Set(u8),
    /// Adds to the current (or default) rating, capped at 10.
    Boost(u8),
}

#[derive(Debug, Clone, Copy)]
pub struct HintRule {
    pub param: SubjectiveParam,
    pub keywords: &'static [&'static str],
    pub effect: HintEffect,
}

impl HintRule {
    fn triggers(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|k| lowered.contains(k))
    }
}

/// Default hints for Czech listings, in application order.
pub const DEFAULT_HINTS: &[HintRule] = &[
    HintRule {
        param: SubjectiveParam::Renovation,
        keywords: &["po rekonstrukci", "zrekonstruovan", "novostavba"],
        effect: HintEffect::SetIfUnset(9),
    },
    HintRule {
        param: SubjectiveParam::Renovation,
        keywords: &["dobrém stavu", "udržovan"],
        effect: HintEffect::SetIfUnset(6),
    },
    HintRule {
        param: SubjectiveParam::Renovation,
        keywords: &["původní", "před rekonstrukc"],
        effect: HintEffect::SetIfUnset(3),
    },
    HintRule {
        param: SubjectiveParam::Location,
        keywords: &["centrum", "střed města"],
        effect: HintEffect::Set(8),
    },
    HintRule {
        param: SubjectiveParam::Location,
        keywords: &["metro", "tramvaj"],
        effect: HintEffect::Boost(1),
    },
    HintRule {
        param: SubjectiveParam::LightViews,
        keywords: &["světlý", "prosluněn", "slunný", "výhled"],
        effect: HintEffect::Set(8),
    },
    HintRule {
        param: SubjectiveParam::Noise,
        keywords: &["tichý", "klidný"],
        effect: HintEffect::Set(8),
    },
    HintRule {
        param: SubjectiveParam::Noise,
        keywords: &["rušn", "frekventovan"],
        effect: HintEffect::Set(3),
    },
    HintRule {
        param: SubjectiveParam::Layout,
        keywords: &["prostorný", "velkorys"],
        effect: HintEffect::Set(7),
    },
    HintRule {
        param: SubjectiveParam::Vibe,
        keywords: &["secesn", "histori", "charakter"],
        effect: HintEffect::Set(8),
    },
];

/// Ratings triggered by `hints`; parameters without a matching keyword are absent.
pub fn scan_hints(cleaned: &str, hints: &[HintRule]) -> BTreeMap<SubjectiveParam, u8> {
    let lowered = cleaned.to_lowercase();
    let mut ratings = BTreeMap::new();

    for hint in hints.iter().filter(|h| h.triggers(&lowered)) {
        match hint.effect {
            HintEffect::SetIfUnset(r) => {
                ratings.entry(hint.param).or_insert(r);
            }
            HintEffect::Set(r) => {
                ratings.insert(hint.param, r);
            }
            HintEffect::Boost(by) => {
                let base = ratings
                    .get(&hint.param)
                    .copied()
                    .unwrap_or(SubjectiveParam::DEFAULT_RATING);
                ratings.insert(hint.param, base.saturating_add(by).min(10));
            }
        }
    }
    ratings
}
