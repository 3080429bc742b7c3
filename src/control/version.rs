use super::SessionControl;
use crate::error::{Error, Result};
use crate::keys;
use crate::store::KvStore;

impl<S: KvStore> SessionControl<S> {
    /// The user's current version, or the configured baseline if the counter
    /// was never written. Never writes.
    pub async fn get_user_version(&self, user_id: &str) -> Result<i64> {
        let key = keys::user_version(user_id);
        match self.store.get(&key).await? {
            Some(raw) => raw.trim().parse().map_err(|_| Error::NotAnInteger(key)),
            None => Ok(self.config.version_baseline()),
        }
    }

    /// Bumps the user's version, invalidating every token issued under the
    /// previous one, and returns the new value.
    ///
    /// The counter is seeded with the baseline first, so the first bump of a
    /// fresh user yields `baseline + 1`. It never expires.
    pub async fn increment_user_version(&self, user_id: &str) -> Result<i64> {
        let key = keys::user_version(user_id);
        let baseline = self.config.version_baseline();

        self.store.set_nx(&key, &baseline.to_string()).await?;
        let version = self.store.incr(&key).await?;

        tracing::info!(user_id = %user_id, version, "user version incremented");
        Ok(version)
    }

    /// A token is valid only when it carries exactly the current version.
    pub async fn is_token_version_valid(&self, user_id: &str, token_version: i64) -> Result<bool> {
        Ok(token_version == self.get_user_version(user_id).await?)
    }
}
