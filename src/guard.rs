//! The flows the application's routes run through session control.
//!
//! Session-layer failures never block the primary action: verification
//! denies, and role changes or activity touches log and carry on.

use uuid::Uuid;

use crate::control::SessionControl;
use crate::error::Result;
use crate::model::{now_secs, SessionData, SignIn, TokenClaims};
use crate::store::KvStore;

/// Outcome of [`SessionControl::verify_token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenVerdict {
    Valid,
    /// A revocation marker exists for the token's jti.
    Revoked,
    /// The user's version moved on since the token was issued.
    StaleVersion { token: i64, current: i64 },
    /// The session record is gone (logout, eviction or expiry).
    SessionMissing,
    /// The store could not be consulted.
    Unavailable,
}

impl TokenVerdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, TokenVerdict::Valid)
    }
}

impl<S: KvStore> SessionControl<S> {
    /// Checks a presented token against revocation, the user's version and,
    /// if configured, the existence of its session record, in that order.
    ///
    /// Store errors are logged and reported as [`TokenVerdict::Unavailable`].
    pub async fn verify_token(&self, claims: &TokenClaims) -> TokenVerdict {
        match self.check_token(claims).await {
            Ok(verdict) => verdict,
            Err(e) => {
                tracing::warn!(jti = %claims.jti, user_id = %claims.sub, error = %e, "token check failed, denying");
                TokenVerdict::Unavailable
            }
        }
    }

    async fn check_token(&self, claims: &TokenClaims) -> Result<TokenVerdict> {
        if self.is_token_revoked(&claims.jti).await? {
            return Ok(TokenVerdict::Revoked);
        }

        let current = self.get_user_version(&claims.sub).await?;
        if claims.ver != current {
            return Ok(TokenVerdict::StaleVersion {
                token: claims.ver,
                current,
            });
        }

        if self.config().require_session_record() && self.get_session(&claims.jti).await?.is_none() {
            return Ok(TokenVerdict::SessionMissing);
        }

        Ok(TokenVerdict::Valid)
    }

    /// Opens a session for a user who just authenticated and returns the
    /// claims to embed in their token.
    ///
    /// Older sessions are evicted first so that, counting the new one, the
    /// user stays within the configured limit. A failure to evict is logged
    /// and does not prevent the sign-in.
    pub async fn sign_in(&self, sign_in: SignIn) -> Result<TokenClaims> {
        let jti = Uuid::new_v4().to_string();
        let room = self.config().max_sessions().saturating_sub(1);

        if let Err(e) = self.enforce_session_limit(&sign_in.user_id, room).await {
            tracing::warn!(user_id = %sign_in.user_id, error = %e, "could not enforce session limit");
        }

        let mut data = SessionData::new(
            sign_in.user_id,
            sign_in.email,
            sign_in.role,
            sign_in.provider,
        );
        data.ip = sign_in.ip;
        data.user_agent = sign_in.user_agent;
        self.save_session(&jti, &data).await?;

        let ver = self.get_user_version(&data.user_id).await?;
        let ttl_secs = i64::try_from(self.config().session_ttl().as_secs()).unwrap_or(i64::MAX);
        let claims = TokenClaims {
            sub: data.user_id,
            jti,
            ver,
            exp: now_secs().saturating_add(ttl_secs),
        };

        tracing::info!(user_id = %claims.sub, jti = %claims.jti, provider = %data.provider, "signed in");
        Ok(claims)
    }

    /// Ends the session the token belongs to.
    pub async fn sign_out(&self, claims: &TokenClaims) -> Result<()> {
        self.close_user_session(&claims.sub, &claims.jti).await
    }

    /// Invalidates every token of a user whose role just changed. Returns the
    /// new version, or `None` if the store failed (already logged).
    pub async fn role_changed(&self, user_id: &str) -> Option<i64> {
        match self.increment_user_version(user_id).await {
            Ok(version) => Some(version),
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "could not bump user version after role change");
                None
            }
        }
    }

    /// Records activity on a session; failures are logged and ignored.
    pub async fn touch(&self, jti: &str) -> bool {
        match self.update_session_activity(jti).await {
            Ok(touched) => touched,
            Err(e) => {
                tracing::warn!(jti = %jti, error = %e, "could not update session activity");
                false
            }
        }
    }
}
