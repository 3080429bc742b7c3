//! The session layer: records, per-user indexes, revocation, version
//! counters and activity reporting, all expressed over an injected
//! [`KvStore`].

use std::sync::Arc;

use crate::config::SessionConfig;
use crate::error::Result;
use crate::store::KvStore;

mod activity;
mod limits;
mod revocation;
mod sessions;
mod version;

/// Entry point of the crate.
///
/// `SessionControl` owns no state of its own: every operation is a handful
/// of store commands, so any number of clones (or processes) can share one
/// backend. Operations are not atomic across keys; an index may briefly
/// name a session whose record is gone, and readers prune such entries.
///
/// ```
/// use seaorm_session_control::{MemoryStore, SessionConfig, SessionControl, SessionData};
///
/// # async fn example() -> seaorm_session_control::Result<()> {
/// let control = SessionControl::new(MemoryStore::new(), SessionConfig::default())?;
///
/// control
///     .save_session("jti-1", &SessionData::new("user-1", "a@example.com", "admin", "google"))
///     .await?;
/// assert_eq!(control.get_user_sessions("user-1").await?.len(), 1);
///
/// control.close_user_session("user-1", "jti-1").await?;
/// assert!(control.is_token_revoked("jti-1").await?);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SessionControl<S> {
    store: Arc<S>,
    config: SessionConfig,
}

impl<S> Clone for SessionControl<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
        }
    }
}

impl<S: KvStore> SessionControl<S> {
    /// Fails with [`Error::Config`](crate::Error::Config) if `config` does
    /// not pass [`SessionConfig::validate`].
    pub fn new(store: S, config: SessionConfig) -> Result<Self> {
        Self::from_shared(Arc::new(store), config)
    }

    /// Builds on a store that is already shared with other components.
    pub fn from_shared(store: Arc<S>, config: SessionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { store, config })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}
