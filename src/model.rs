//! Records returned by and passed to [`SessionControl`](crate::SessionControl).
//!
//! Timestamps are milliseconds since the Unix epoch, the unit the session
//! hashes store them in.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::{Error, Result};

// Hash field names inside `sess:<jti>`.
pub(crate) const F_USER_ID: &str = "userId";
pub(crate) const F_EMAIL: &str = "email";
pub(crate) const F_ROLE: &str = "role";
pub(crate) const F_PROVIDER: &str = "provider";
pub(crate) const F_CREATED_AT: &str = "createdAt";
pub(crate) const F_LAST_SEEN: &str = "lastSeen";
pub(crate) const F_IP: &str = "ip";
pub(crate) const F_USER_AGENT: &str = "userAgent";

/// Current wall-clock time in Unix milliseconds.
pub fn now_millis() -> i64 {
    let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();
    i64::try_from(nanos / 1_000_000).unwrap_or(i64::MAX)
}

/// Current wall-clock time in Unix seconds.
pub fn now_secs() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

/// The attributes of one authenticated login, stored at `sess:<jti>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    pub user_id: String,
    pub email: String,
    pub role: String,
    /// How the user signed in, e.g. `credentials` or `google`.
    pub provider: String,
    pub created_at: i64,
    pub last_seen: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl SessionData {
    /// A fresh session for `user_id` created now.
    pub fn new(
        user_id: impl Into<String>,
        email: impl Into<String>,
        role: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        let now = now_millis();
        Self {
            user_id: user_id.into(),
            email: email.into(),
            role: role.into(),
            provider: provider.into(),
            created_at: now,
            last_seen: now,
            ip: None,
            user_agent: None,
        }
    }

    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub(crate) fn to_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            (F_USER_ID, self.user_id.clone()),
            (F_EMAIL, self.email.clone()),
            (F_ROLE, self.role.clone()),
            (F_PROVIDER, self.provider.clone()),
            (F_CREATED_AT, self.created_at.to_string()),
            (F_LAST_SEEN, self.last_seen.to_string()),
        ];
        if let Some(ip) = &self.ip {
            fields.push((F_IP, ip.clone()));
        }
        if let Some(ua) = &self.user_agent {
            fields.push((F_USER_AGENT, ua.clone()));
        }
        fields
    }

    /// Rebuilds a record from its hash. `None` if the hash is empty or has
    /// no user id, which is how a missing session looks.
    pub(crate) fn from_fields(key: &str, mut hash: HashMap<String, String>) -> Result<Option<Self>> {
        let Some(user_id) = hash.remove(F_USER_ID).filter(|id| !id.is_empty()) else {
            return Ok(None);
        };
        Ok(Some(Self {
            user_id,
            email: hash.remove(F_EMAIL).unwrap_or_default(),
            role: hash.remove(F_ROLE).unwrap_or_default(),
            provider: hash
                .remove(F_PROVIDER)
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| "unknown".to_string()),
            created_at: parse_millis(key, F_CREATED_AT, hash.remove(F_CREATED_AT))?,
            last_seen: parse_millis(key, F_LAST_SEEN, hash.remove(F_LAST_SEEN))?,
            ip: hash.remove(F_IP).filter(|s| !s.is_empty()),
            user_agent: hash.remove(F_USER_AGENT).filter(|s| !s.is_empty()),
        }))
    }
}

fn parse_millis(key: &str, field: &str, raw: Option<String>) -> Result<i64> {
    match raw {
        None => Ok(0),
        Some(raw) => raw
            .parse()
            .map_err(|_| Error::Decode(format!("{key}.{field} is not a timestamp: {raw:?}"))),
    }
}

/// One entry of a user's session list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSessionInfo {
    pub jti: String,
    pub user_id: String,
    pub provider: String,
    pub created_at: i64,
    pub last_seen: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl UserSessionInfo {
    pub(crate) fn from_session(jti: impl Into<String>, data: SessionData) -> Self {
        Self {
            jti: jti.into(),
            user_id: data.user_id,
            provider: data.provider,
            created_at: data.created_at,
            last_seen: data.last_seen,
            ip: data.ip,
            user_agent: data.user_agent,
        }
    }
}

/// Per-user row of the admin activity dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserActivity {
    pub user_id: String,
    /// Most recent `last_seen` across the user's sessions.
    pub last_seen: i64,
    /// Number of jtis in the user's session index.
    pub active_sessions: usize,
    /// The session `last_seen` was taken from.
    pub last_session: Option<UserSessionInfo>,
}

/// Store-wide counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub total_sessions: usize,
    pub total_users: usize,
    pub total_revoked: usize,
    /// Sessions with no revocation marker.
    pub active_sessions: usize,
}

/// Answer of [`SessionControl::check_session_limit`](crate::SessionControl::check_session_limit).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionLimit {
    /// Whether one more session fits under the limit.
    pub can_create: bool,
    pub current_sessions: usize,
    /// The session that would be evicted next, when the limit is reached.
    pub oldest_session: Option<String>,
}

/// The fields of a client-held token that session control depends on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// User id.
    pub sub: String,
    /// Session identifier.
    pub jti: String,
    /// User version the token was issued under.
    pub ver: i64,
    /// Expiry, Unix seconds.
    pub exp: i64,
}

impl TokenClaims {
    /// Seconds until the token expires, or `None` if it already has.
    pub fn remaining_secs(&self, now_secs: i64) -> Option<u64> {
        u64::try_from(self.exp.saturating_sub(now_secs))
            .ok()
            .filter(|secs| *secs > 0)
    }
}

/// Input to [`SessionControl::sign_in`](crate::SessionControl::sign_in).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignIn {
    pub user_id: String,
    pub email: String,
    pub role: String,
    pub provider: String,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
}
