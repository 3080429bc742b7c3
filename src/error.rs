//! Error type shared by every store backend and the session layer.

/// Errors produced by a [`KvStore`](crate::KvStore) backend or by the
/// session layer built on top of it.
///
/// The first three variants follow the storage error taxonomy used by
/// session stores: the backend failed, a value could not be encoded, or a
/// stored value could not be decoded.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The underlying database, Redis server or connection failed.
    #[error("backend error: {0}")]
    Backend(String),

    /// A value could not be serialized for storage.
    #[error("encode error: {0}")]
    Encode(String),

    /// A stored value could not be deserialized.
    #[error("decode error: {0}")]
    Decode(String),

    /// The key exists but holds a value of a different kind (for example a
    /// hash where a string was expected).
    #[error("key `{0}` holds a value of another type")]
    WrongType(String),

    /// The key holds a string that does not parse as a 64-bit integer.
    #[error("value at `{0}` is not an integer")]
    NotAnInteger(String),

    /// A write lost a race with another writer creating the same key and
    /// kept losing after being retried.
    #[error("write conflict: {0}")]
    Conflict(String),

    /// Invalid configuration or argument, such as a zero TTL.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Whether a stored value was unreadable, as opposed to the store itself
    /// failing.
    pub fn is_bad_value(&self) -> bool {
        matches!(
            self,
            Error::Decode(_) | Error::WrongType(_) | Error::NotAnInteger(_)
        )
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
