use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Tunables for [`SessionControl`](crate::SessionControl).
///
/// | Setting                  | Default | Env var                          |
/// |--------------------------|---------|----------------------------------|
/// | session TTL              | 7 days  | `SESSION_TTL_SECS`               |
/// | sessions per user        | 5       | `SESSION_MAX_PER_USER`           |
/// | version baseline         | 1       | `SESSION_VERSION_BASELINE`       |
/// | revocation leeway        | 60 s    | `SESSION_REVOCATION_LEEWAY_SECS` |
/// | require session record   | true    | `SESSION_REQUIRE_RECORD`         |
///
/// ```
/// use std::time::Duration;
/// use seaorm_session_control::SessionConfig;
///
/// let config = SessionConfig::default()
///     .with_session_ttl(Duration::from_secs(24 * 60 * 60))
///     .with_max_sessions(3);
/// assert_eq!(config.max_sessions(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    session_ttl: Duration,
    max_sessions: usize,
    version_baseline: i64,
    revocation_leeway: Duration,
    require_session_record: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_ttl: 7 * DAY,
            max_sessions: 5,
            version_baseline: 1,
            revocation_leeway: Duration::from_secs(60),
            require_session_record: true,
        }
    }
}

impl SessionConfig {
    /// Lifetime of session records and of the tokens issued for them.
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Maximum number of concurrent sessions per user.
    pub fn with_max_sessions(mut self, max: usize) -> Self {
        self.max_sessions = max;
        self
    }

    /// Version reported for users whose counter was never written.
    pub fn with_version_baseline(mut self, baseline: i64) -> Self {
        self.version_baseline = baseline;
        self
    }

    /// Extra lifetime given to revocation markers past the token's own
    /// expiry, to absorb clock skew between issuer and verifiers.
    pub fn with_revocation_leeway(mut self, leeway: Duration) -> Self {
        self.revocation_leeway = leeway;
        self
    }

    /// Whether a token whose session record is gone fails verification.
    pub fn with_require_session_record(mut self, require: bool) -> Self {
        self.require_session_record = require;
        self
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    pub fn max_sessions(&self) -> usize {
        self.max_sessions
    }

    pub fn version_baseline(&self) -> i64 {
        self.version_baseline
    }

    pub fn revocation_leeway(&self) -> Duration {
        self.revocation_leeway
    }

    pub fn require_session_record(&self) -> bool {
        self.require_session_record
    }

    /// TTL for markers written when a session is closed: outlives any token
    /// issued for that session.
    pub fn revocation_ttl(&self) -> Duration {
        self.session_ttl.saturating_add(self.revocation_leeway)
    }

    /// Reads the settings from the environment, falling back to the default
    /// for every variable that is unset.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(secs) = read_env::<u64>("SESSION_TTL_SECS")? {
            config.session_ttl = Duration::from_secs(secs);
        }
        if let Some(max) = read_env("SESSION_MAX_PER_USER")? {
            config.max_sessions = max;
        }
        if let Some(baseline) = read_env("SESSION_VERSION_BASELINE")? {
            config.version_baseline = baseline;
        }
        if let Some(secs) = read_env::<u64>("SESSION_REVOCATION_LEEWAY_SECS")? {
            config.revocation_leeway = Duration::from_secs(secs);
        }
        if let Some(require) = read_env("SESSION_REQUIRE_RECORD")? {
            config.require_session_record = require;
        }

        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the session layer cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.session_ttl.is_zero() {
            return Err(Error::Config("session ttl must be positive".to_string()));
        }
        if self.max_sessions == 0 {
            return Err(Error::Config("max sessions must be at least 1".to_string()));
        }
        Ok(())
    }
}

fn read_env<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| Error::Config(format!("{name}={raw:?}: {e}"))),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(Error::Config(format!("{name}: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_table() {
        let config = SessionConfig::default();
        assert_eq!(config.session_ttl(), Duration::from_secs(604_800));
        assert_eq!(config.max_sessions(), 5);
        assert_eq!(config.version_baseline(), 1);
        assert_eq!(config.revocation_ttl(), Duration::from_secs(604_860));
        assert!(config.require_session_record());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_unusable_settings() {
        let err = SessionConfig::default().with_max_sessions(0).validate();
        assert!(matches!(err, Err(Error::Config(_))));
        let err = SessionConfig::default()
            .with_session_ttl(Duration::ZERO)
            .validate();
        assert!(matches!(err, Err(Error::Config(_))));
    }

    #[test]
    fn reports_the_bad_variable() {
        // only this test touches this variable
        env::set_var("SESSION_TEST_ONLY_BAD_NUMBER", "five");
        let err = read_env::<usize>("SESSION_TEST_ONLY_BAD_NUMBER").unwrap_err();
        assert!(err.to_string().contains("SESSION_TEST_ONLY_BAD_NUMBER"));
        assert_eq!(read_env::<usize>("SESSION_TEST_ONLY_UNSET").unwrap(), None);
    }
}
