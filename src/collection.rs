// In-memory offer list and the edits the UI performs on it
use crate::model::{FieldKey, Offer, OfferData, SubjectiveParam, SubjectiveRatings};
use crate::palette::next_color;
use crate::utils::generate_id;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, info};

/// Everything needed to create an offer; the collection fills in the rest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewOffer {
    pub name: String,
    pub data: OfferData,
    pub color: Option<String>,
    pub subjective_ratings: Option<SubjectiveRatings>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportMode {
    /// Discard current offers.
    Replace,
    /// Append imported offers with fresh ids and colors.
    Extend,
}

impl FromStr for ImportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "replace" => Ok(ImportMode::Replace),
            "extend" | "add" => Ok(ImportMode::Extend),
            other => Err(format!("unknown import mode '{}'", other)),
        }
    }
}

/// Renovation rating guessed from the RENOVATION field when no ratings were given.
pub fn suggest_ratings(data: &OfferData) -> SubjectiveRatings {
    let mut ratings = SubjectiveRatings::default();
    if let Some(reno) = data.get(&FieldKey::Renovation) {
        let reno = reno.to_string().to_lowercase();
        if reno.contains("new") || reno.contains("po") {
            ratings.set(SubjectiveParam::Renovation, 9);
        } else if reno.contains("partial") || reno.contains("good") {
            ratings.set(SubjectiveParam::Renovation, 7);
        } else if reno.contains("original") || reno.contains("pred") {
            ratings.set(SubjectiveParam::Renovation, 3);
        }
    }
    ratings
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OfferCollection {
    offers: Vec<Offer>,
}

impl OfferCollection {
    pub fn new(offers: Vec<Offer>) -> Self {
        Self { offers }
    }

    pub fn offers(&self) -> &[Offer] {
        &self.offers
    }

    pub fn into_offers(self) -> Vec<Offer> {
        self.offers
    }

    pub fn len(&self) -> usize {
        self.offers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }

    pub fn find(&self, id: &str) -> Option<&Offer> {
        self.offers.iter().find(|o| o.id == id)
    }

    fn color_for(&self, palette: &[String]) -> String {
        next_color(
            self.offers.iter().map(|o| o.color.as_str()),
            self.offers.len(),
            palette,
        )
    }

    /// Appends a new starred, unsold offer at the end of the manual order.
    pub fn add(&mut self, new: NewOffer, palette: &[String]) -> &Offer {
        let color = new.color.unwrap_or_else(|| self.color_for(palette));
        let subjective_ratings = new
            .subjective_ratings
            .unwrap_or_else(|| suggest_ratings(&new.data));
        let name = if new.name.trim().is_empty() {
            format!("Offer {}", self.offers.len() + 1)
        } else {
            new.name
        };
        let offer = Offer {
            id: generate_id(),
            name,
            color,
            data: new.data,
            subjective_ratings,
            notes: String::new(),
            featured: true,
            sold: false,
            manual_order: self.offers.len() as i64,
            image: None,
        };
        info!("➕ Added offer {} ({})", offer.name, offer.id);
        self.offers.push(offer);
        &self.offers[self.offers.len() - 1]
    }

    /// Applies `edit` to the offer with `id`. Returns false if there is none.
    pub fn update(&mut self, id: &str, edit: impl FnOnce(&mut Offer)) -> bool {
        match self.offers.iter_mut().find(|o| o.id == id) {
            Some(offer) => {
                edit(offer);
                true
            }
            None => false,
        }
    }

    /// New `featured` state, or `None` for an unknown id.
    pub fn toggle_star(&mut self, id: &str) -> Option<bool> {
        let offer = self.offers.iter_mut().find(|o| o.id == id)?;
        offer.featured = !offer.featured;
        Some(offer.featured)
    }

    pub fn toggle_sold(&mut self, id: &str) -> Option<bool> {
        let offer = self.offers.iter_mut().find(|o| o.id == id)?;
        offer.sold = !offer.sold;
        Some(offer.sold)
    }

    pub fn remove(&mut self, id: &str) -> Option<Offer> {
        let index = self.offers.iter().position(|o| o.id == id)?;
        info!("🗑️ Removed offer {}", id);
        Some(self.offers.remove(index))
    }

    /// Moves `from_id` to the position of `to_id` and renumbers the manual order.
    pub fn move_offer(&mut self, from_id: &str, to_id: &str) -> bool {
        if from_id == to_id {
            return false;
        }
        let from = self.offers.iter().position(|o| o.id == from_id);
        let to = self.offers.iter().position(|o| o.id == to_id);
        let (Some(from), Some(to)) = (from, to) else {
            return false;
        };
        let moved = self.offers.remove(from);
        self.offers.insert(to, moved);
        for (i, offer) in self.offers.iter_mut().enumerate() {
            offer.manual_order = i as i64;
        }
        debug!("Moved offer {} from {} to {}", from_id, from, to);
        true
    }

    /// Merges imported offers. Extending re-issues ids and colors so the
    /// imported offers never collide with existing ones.
    pub fn import(&mut self, incoming: Vec<Offer>, mode: ImportMode, palette: &[String]) {
        match mode {
            ImportMode::Replace => {
                info!("📥 Replacing {} offers with {}", self.offers.len(), incoming.len());
                self.offers = incoming;
            }
            ImportMode::Extend => {
                info!("📥 Appending {} offers to {}", incoming.len(), self.offers.len());
                let base = self.offers.len();
                for (i, mut offer) in incoming.into_iter().enumerate() {
                    offer.id = generate_id();
                    offer.color = self.color_for(palette);
                    offer.manual_order = (base + i) as i64;
                    self.offers.push(offer);
                }
            }
        }
    }
}
