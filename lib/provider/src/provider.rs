//! The seam between the login flow and a concrete identity provider.

use async_trait::async_trait;
use rootcause::prelude::Report;

use crate::error::ProviderError;
use crate::types::{AccessToken, TeamMembership, UserIdentity};

/// Operations the login flow needs from an OAuth identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Builds the URL that starts an authorization-code grant, carrying
    /// `state` as the CSRF correlation value.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Configuration`] if the URL cannot be built.
    fn authorization_url(&self, state: &str) -> Result<String, Report<ProviderError>>;

    /// Exchanges an authorization code for an access token.
    async fn exchange_code(&self, code: &str) -> Result<AccessToken, Report<ProviderError>>;

    /// Looks up the account the token belongs to.
    async fn current_user(&self, token: &AccessToken)
    -> Result<UserIdentity, Report<ProviderError>>;

    /// Lists every team the account belongs to, across all organizations.
    async fn user_teams(
        &self,
        token: &AccessToken,
    ) -> Result<Vec<TeamMembership>, Report<ProviderError>>;
}
