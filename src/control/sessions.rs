use super::SessionControl;
use crate::error::Result;
use crate::keys;
use crate::model::{now_millis, SessionData, UserSessionInfo, F_LAST_SEEN};
use crate::store::KvStore;

impl<S: KvStore> SessionControl<S> {
    /// Stores the record for `jti`, replacing any previous one, and registers
    /// `jti` in the owner's session index. Both keys get the session TTL.
    pub async fn save_session(&self, jti: &str, data: &SessionData) -> Result<()> {
        let session_key = keys::session(jti);
        let index_key = keys::user_sessions(&data.user_id);
        let ttl = self.config.session_ttl();

        self.store.del(&session_key).await?;
        self.store.hset(&session_key, &data.to_fields()).await?;
        self.store.sadd(&index_key, jti).await?;
        self.store.expire(&session_key, ttl).await?;
        self.store.expire(&index_key, ttl).await?;

        tracing::debug!(jti = %jti, user_id = %data.user_id, "session saved");
        Ok(())
    }

    pub async fn get_session(&self, jti: &str) -> Result<Option<SessionData>> {
        let key = keys::session(jti);
        let hash = self.store.hgetall(&key).await?;
        SessionData::from_fields(&key, hash)
    }

    /// Sets the session's `lastSeen` to now, leaving every other field alone.
    ///
    /// Returns `false` without writing anything when the session does not
    /// exist, including one that expires or is closed concurrently.
    /// Concurrent updates are last-write-wins.
    pub async fn update_session_activity(&self, jti: &str) -> Result<bool> {
        let key = keys::session(jti);
        let now = now_millis();
        let written = self
            .store
            .hset_if_exists(&key, &[(F_LAST_SEEN, now.to_string())])
            .await?;
        if !written {
            return Ok(false);
        }

        tracing::debug!(jti = %jti, last_seen = now, "session activity updated");
        Ok(true)
    }

    /// Ends one session: revokes its jti, drops it from the user's index and
    /// deletes its record. Closing an unknown session is not an error.
    pub async fn close_user_session(&self, user_id: &str, jti: &str) -> Result<()> {
        self.revoke_token(jti, self.config.revocation_ttl()).await?;
        self.store.srem(&keys::user_sessions(user_id), jti).await?;
        self.store.del(&keys::session(jti)).await?;

        tracing::info!(user_id = %user_id, jti = %jti, "session closed");
        Ok(())
    }

    /// Closes every session in the user's index (global logout) and returns
    /// how many were closed.
    pub async fn close_all_user_sessions(&self, user_id: &str) -> Result<usize> {
        let jtis = self.store.smembers(&keys::user_sessions(user_id)).await?;
        for jti in &jtis {
            self.close_user_session(user_id, jti).await?;
        }

        tracing::info!(user_id = %user_id, count = jtis.len(), "all sessions closed");
        Ok(jtis.len())
    }

    /// Lists the user's live sessions, most recently active first.
    ///
    /// Index entries whose record has disappeared (expired or deleted) are
    /// removed from the index on the way. Records that no longer decode are
    /// logged and left out.
    pub async fn get_user_sessions(&self, user_id: &str) -> Result<Vec<UserSessionInfo>> {
        let index_key = keys::user_sessions(user_id);
        let jtis = self.store.smembers(&index_key).await?;

        let mut sessions = Vec::with_capacity(jtis.len());
        for jti in jtis {
            match self.get_session(&jti).await {
                Ok(Some(data)) => sessions.push(UserSessionInfo::from_session(jti, data)),
                Ok(None) => {
                    self.store.srem(&index_key, &jti).await?;
                    tracing::debug!(user_id = %user_id, jti = %jti, "pruned dangling index entry");
                }
                Err(e) if e.is_bad_value() => {
                    tracing::warn!(user_id = %user_id, jti = %jti, error = %e, "skipping unreadable session");
                }
                Err(e) => return Err(e),
            }
        }

        sessions.sort_by(|a, b| {
            b.last_seen
                .cmp(&a.last_seen)
                .then_with(|| a.jti.cmp(&b.jti))
        });
        Ok(sessions)
    }
}
