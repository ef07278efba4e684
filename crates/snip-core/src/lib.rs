//! Core types and traits for the snip URL shortener.
//!
//! This crate provides the shared vocabulary used by the generator, storage,
//! shortener and gateway crates: the [`ShortCode`] key, the persisted
//! [`UrlMapping`] entity, the [`MappingStore`] and [`Counter`] contracts and
//! the error taxonomy.

pub mod clock;
pub mod counter;
pub mod error;
pub mod mapping;
pub mod shortcode;
pub mod shortener;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use counter::Counter;
pub use error::{CoreError, GeneratorError, ShortenerError, StorageError};
pub use mapping::{MappingState, NewUrlMapping, UrlMapping};
pub use shortcode::ShortCode;
pub use shortener::{ShortenParams, ShortenResult, Shortener};
pub use store::MappingStore;
