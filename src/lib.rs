//! # flat-compare
//!
//! Side-by-side comparison of flat offers:
//! - rule-based extraction of listing fields from pasted ad text, with source spans
//! - normalization of every attribute onto a common 0–10 scale
//! - ranking, grouping and range fitting over the offer list
//! - SQLite persistence, JSON export/import and live room sharing
//!
//! ```rust,no_run
//! use flat_compare::parser::{Extractor, ListingExtractor};
//!
//! let extractor = ListingExtractor::new().unwrap();
//! let result = extractor.extract("Prodej bytu 2+kk 54 m², Cena 8 200 000 Kč");
//! println!("{:?}", result.values);
//! ```

pub mod analyzer;
pub mod collection;
pub mod config;
pub mod draft;
pub mod i18n;
pub mod model;
pub mod normalizer;
pub mod palette;
pub mod parser;
pub mod storage;
pub mod sync;
pub mod utils;

pub use collection::{ImportMode, NewOffer, OfferCollection};
pub use model::{ExtractionResult, FieldKey, FieldValue, Offer, Parameter, Span};
pub use normalizer::{normalize, ParameterRange, ParameterRanges};
pub use storage::Document;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
