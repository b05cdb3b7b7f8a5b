// Listing text extraction: rules, hints, source spans.

pub mod hints;
pub mod listing_extractor;
pub mod locate;
pub mod rules;

use crate::model::ExtractionResult;

pub use listing_extractor::ListingExtractor;
pub use locate::locate_value;

/// Turns pasted listing text into field values plus their source spans.
///
/// Implementations must be pure: the same text always yields the same result.
pub trait Extractor {
    fn extract(&self, text: &str) -> ExtractionResult;
}
