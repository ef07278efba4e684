//! URL shortener service implementation.
//!
//! This crate wires a [`Generator`](snip_generator::Generator) and a
//! [`MappingStore`](snip_core::MappingStore) together: the
//! [`UniquenessResolver`] turns candidate codes into persisted mappings and
//! the [`ShortenerService`] implements the [`Shortener`](snip_core::Shortener)
//! contract on top of it.

pub mod resolver;
pub mod service;

#[cfg(test)]
mod testing;

pub use resolver::{UniquenessResolver, DEFAULT_MAX_RETRIES};
pub use service::{ShortenerService, ShortenerSettings, DEFAULT_BASE_URL};
pub use snip_core::ShortenerError;
