use super::SessionControl;
use crate::error::Result;
use crate::model::{SessionLimit, UserSessionInfo};
use crate::store::KvStore;

impl<S: KvStore> SessionControl<S> {
    /// Reports whether the user may open another session under `max`, and
    /// which session would be evicted to make room if not.
    pub async fn check_session_limit(&self, user_id: &str, max: usize) -> Result<SessionLimit> {
        let sessions = self.get_user_sessions(user_id).await?;
        let current_sessions = sessions.len();

        if current_sessions < max {
            return Ok(SessionLimit {
                can_create: true,
                current_sessions,
                oldest_session: None,
            });
        }

        Ok(SessionLimit {
            can_create: false,
            current_sessions,
            oldest_session: in_eviction_order(sessions).into_iter().next().map(|s| s.jti),
        })
    }

    /// Closes the user's oldest sessions until at most `max` remain and
    /// returns the evicted jtis, in eviction order.
    ///
    /// Oldest means earliest `created_at`; ties go to the least recently
    /// active session, then to the smaller jti.
    pub async fn enforce_session_limit(&self, user_id: &str, max: usize) -> Result<Vec<String>> {
        let sessions = self.get_user_sessions(user_id).await?;
        if sessions.len() <= max {
            return Ok(Vec::new());
        }

        let excess = sessions.len() - max;
        let evicted: Vec<String> = in_eviction_order(sessions)
            .into_iter()
            .take(excess)
            .map(|s| s.jti)
            .collect();

        for jti in &evicted {
            self.close_user_session(user_id, jti).await?;
        }

        tracing::info!(
            user_id = %user_id,
            max,
            evicted = evicted.len(),
            "session limit enforced"
        );
        Ok(evicted)
    }
}

fn in_eviction_order(mut sessions: Vec<UserSessionInfo>) -> Vec<UserSessionInfo> {
    sessions.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then(a.last_seen.cmp(&b.last_seen))
            .then_with(|| a.jti.cmp(&b.jti))
    });
    sessions
}
