use super::SessionControl;
use crate::error::Result;
use crate::keys;
use crate::model::{SessionStats, UserActivity, UserSessionInfo};
use crate::store::{KeyTtl, KvStore};

impl<S: KvStore> SessionControl<S> {
    /// Most recent activity of every user with at least one live session,
    /// newest first.
    ///
    /// This walks every session index and record in the store; it is meant
    /// for an admin dashboard over a modest number of users.
    pub async fn get_all_users_activity(&self) -> Result<Vec<UserActivity>> {
        let index_keys = self.store.keys(keys::USER_SESSIONS_PATTERN).await?;
        let mut activity = Vec::with_capacity(index_keys.len());

        for index_key in index_keys {
            let Some(user_id) = keys::user_id_from_sessions_key(&index_key) else {
                continue;
            };
            let jtis = self.store.smembers(&index_key).await?;

            let mut latest: Option<UserSessionInfo> = None;
            for jti in &jtis {
                let data = match self.get_session(jti).await {
                    Ok(Some(data)) => data,
                    Ok(None) => continue,
                    Err(e) if e.is_bad_value() => {
                        tracing::warn!(jti = %jti, error = %e, "skipping unreadable session");
                        continue;
                    }
                    Err(e) => return Err(e),
                };
                if latest.as_ref().map_or(true, |l| data.last_seen > l.last_seen) {
                    latest = Some(UserSessionInfo::from_session(jti.as_str(), data));
                }
            }

            if let Some(last) = latest.filter(|l| l.last_seen > 0) {
                activity.push(UserActivity {
                    user_id: user_id.to_string(),
                    last_seen: last.last_seen,
                    active_sessions: jtis.len(),
                    last_session: Some(last),
                });
            }
        }

        activity.sort_by(|a, b| {
            b.last_seen
                .cmp(&a.last_seen)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        Ok(activity)
    }

    /// Counts session records, user indexes and revocation markers.
    pub async fn get_session_stats(&self) -> Result<SessionStats> {
        let session_keys = self.store.keys(keys::SESSION_PATTERN).await?;
        let total_users = self.store.keys(keys::USER_SESSIONS_PATTERN).await?.len();
        let total_revoked = self.store.keys(keys::REVOKED_PATTERN).await?.len();

        let mut active_sessions = 0;
        for key in &session_keys {
            let Some(jti) = keys::jti_from_session_key(key) else {
                continue;
            };
            if !self.is_token_revoked(jti).await? {
                active_sessions += 1;
            }
        }

        let stats = SessionStats {
            total_sessions: session_keys.len(),
            total_users,
            total_revoked,
            active_sessions,
        };
        tracing::debug!(?stats, "session stats collected");
        Ok(stats)
    }

    /// Housekeeping pass over the whole store.
    ///
    /// Deletes session records that lost their TTL, removes index entries
    /// pointing at missing records and drops indexes left empty. Returns the
    /// number of session records deleted. A failure on one key is logged and
    /// the pass moves on.
    pub async fn cleanup_expired_sessions(&self) -> Result<usize> {
        let mut cleaned = 0;
        for key in self.store.keys(keys::SESSION_PATTERN).await? {
            match self.store.ttl(&key).await {
                Ok(KeyTtl::Persistent) => match self.store.del(&key).await {
                    Ok(_) => {
                        cleaned += 1;
                        tracing::debug!(key = %key, "deleted session without ttl");
                    }
                    Err(e) => tracing::warn!(key = %key, error = %e, "failed to delete session"),
                },
                Ok(KeyTtl::Missing | KeyTtl::Expires(_)) => {}
                Err(e) => tracing::warn!(key = %key, error = %e, "failed to read session ttl"),
            }
        }

        let mut pruned = 0;
        for index_key in self.store.keys(keys::USER_SESSIONS_PATTERN).await? {
            match self.prune_index(&index_key).await {
                Ok(n) => pruned += n,
                Err(e) => tracing::warn!(key = %index_key, error = %e, "failed to prune index"),
            }
        }

        tracing::info!(cleaned, pruned, "session cleanup finished");
        Ok(cleaned)
    }

    async fn prune_index(&self, index_key: &str) -> Result<usize> {
        let mut pruned = 0;
        for jti in self.store.smembers(index_key).await? {
            if !self.store.exists(&keys::session(&jti)).await? {
                self.store.srem(index_key, &jti).await?;
                pruned += 1;
            }
        }
        // removing the last member already drops the set; this covers
        // backends that left an empty one behind
        if self.store.scard(index_key).await? == 0 {
            self.store.del(index_key).await?;
        }
        Ok(pruned)
    }
}
