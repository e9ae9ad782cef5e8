//! Catalog of bookable activities.
//!
//! The catalog is fetched fresh on every run; opening times are always taken
//! from the latest listing.

mod fetcher;
mod types;

pub use fetcher::CatalogFetcher;
pub use types::*;

use thiserror::Error;

use crate::portal::PortalError;
use crate::retry::Retryable;

/// Errors that can occur while fetching or reading the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog request failed: {0}")]
    Portal(#[from] PortalError),

    #[error("Activity {id} has an invalid opening time: {value:?}")]
    InvalidTimestamp { id: String, value: String },
}

impl Retryable for CatalogError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Portal(e) => e.is_retryable(),
            Self::InvalidTimestamp { .. } => false,
        }
    }
}
