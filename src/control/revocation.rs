use std::time::Duration;

use super::SessionControl;
use crate::error::{Error, Result};
use crate::keys;
use crate::model::{now_secs, TokenClaims};
use crate::store::KvStore;

impl<S: KvStore> SessionControl<S> {
    /// Marks `jti` as revoked for `ttl`. Once the marker expires the jti is
    /// no longer reported as revoked, so `ttl` must cover the token's
    /// remaining lifetime; prefer [`SessionControl::revoke_claims`] when the
    /// token is at hand.
    pub async fn revoke_token(&self, jti: &str, ttl: Duration) -> Result<()> {
        if ttl.is_zero() {
            return Err(Error::Config("revocation ttl must be positive".to_string()));
        }

        self.store.set(&keys::revoked(jti), "1", Some(ttl)).await?;

        tracing::info!(jti = %jti, ttl_secs = ttl.as_secs(), "token revoked");
        Ok(())
    }

    /// Revokes the token described by `claims` until it expires on its own
    /// (plus the configured leeway). Returns `false` without writing when the
    /// token has already expired.
    pub async fn revoke_claims(&self, claims: &TokenClaims) -> Result<bool> {
        let Some(remaining) = claims.remaining_secs(now_secs()) else {
            tracing::debug!(jti = %claims.jti, "token already expired, nothing to revoke");
            return Ok(false);
        };

        let ttl = Duration::from_secs(remaining).saturating_add(self.config.revocation_leeway());
        self.revoke_token(&claims.jti, ttl).await?;
        Ok(true)
    }

    pub async fn is_token_revoked(&self, jti: &str) -> Result<bool> {
        self.store.exists(&keys::revoked(jti)).await
    }
}
