//! Identity Provider seam.
//!
//! Handlers never inspect credentials themselves: the `Caller` extractor
//! hands the bearer token to an [`IdentityProvider`] and works with the
//! resulting [`Identity`]. Token issuance (login, registration) lives
//! outside this service; [`StaticTokenProvider`] verifies tokens against a
//! table supplied through configuration.

pub mod static_tokens;

use std::fmt::Debug;

use async_trait::async_trait;

use crate::domain::Identity;
use crate::error::BookingError;

pub use static_tokens::StaticTokenProvider;

/// Turns a bearer token into a verified [`Identity`].
#[async_trait]
pub trait IdentityProvider: Send + Sync + Debug {
    /// Verifies `token`.
    ///
    /// # Errors
    ///
    /// [`BookingError::Unauthorized`] if the token is unknown or expired,
    /// [`BookingError::StoreUnavailable`] if the provider cannot be reached.
    async fn authenticate(&self, token: &str) -> Result<Identity, BookingError>;
}
