//! Ownership check against a character's Lodestone self introduction.

use tracing::{info, warn};

use super::parse::parse_self_introduction;
use super::Lodestone;
use crate::error::{ClearwayError, Result};
use crate::http_client::PoliteClient;
use crate::types::Identity;

impl Lodestone {
    /// Fetch the self introduction of a resolved character.
    ///
    /// A profile page without an introduction yields an empty string.
    pub async fn self_introduction(&self, identity: &Identity) -> Result<String> {
        let id = identity
            .lodestone_id
            .ok_or_else(|| ClearwayError::Unresolved(identity.to_string()))?;

        let throttle = self.new_throttle();
        let client = PoliteClient::new(&self.http, &throttle);
        let bio = match client.get(&self.character_url(id)).await {
            Ok(resp) => parse_self_introduction(&resp.body).unwrap_or_default(),
            Err(e) => {
                warn!("profile fetch failed for {identity}: {e:#}");
                return Err(ClearwayError::Crawl(vec![format!("{e:#}")]));
            }
        };
        Ok(bio)
    }

    /// Whether the character's self introduction contains `token`.
    ///
    /// A missing token is `Ok(false)`; only fetch failures are errors.
    pub async fn verify_ownership(&self, identity: &Identity, token: &str) -> Result<bool> {
        let bio = self.self_introduction(identity).await?;
        let owned = bio.contains(token);
        info!("ownership of {identity}: {owned}");
        Ok(owned)
    }
}
