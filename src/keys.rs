//! Key layout shared by every backend.
//!
//! | Key                       | Kind   | Contents                          |
//! |---------------------------|--------|-----------------------------------|
//! | `sess:<jti>`              | hash   | session record fields             |
//! | `user:<userId>:sessions`  | set    | jtis of the user's sessions       |
//! | `revoked:<jti>`           | string | `"1"`, expires with the token     |
//! | `user:<userId>:ver`       | string | integer version counter           |

pub(crate) const SESSION_PREFIX: &str = "sess:";
pub(crate) const REVOKED_PREFIX: &str = "revoked:";
const USER_PREFIX: &str = "user:";
const SESSIONS_SUFFIX: &str = ":sessions";
const VERSION_SUFFIX: &str = ":ver";

/// Glob matching every session record.
pub const SESSION_PATTERN: &str = "sess:*";
/// Glob matching every per-user session index.
pub const USER_SESSIONS_PATTERN: &str = "user:*:sessions";
/// Glob matching every revocation marker.
pub const REVOKED_PATTERN: &str = "revoked:*";

pub fn session(jti: &str) -> String {
    format!("{SESSION_PREFIX}{jti}")
}

pub fn user_sessions(user_id: &str) -> String {
    format!("{USER_PREFIX}{user_id}{SESSIONS_SUFFIX}")
}

pub fn revoked(jti: &str) -> String {
    format!("{REVOKED_PREFIX}{jti}")
}

pub fn user_version(user_id: &str) -> String {
    format!("{USER_PREFIX}{user_id}{VERSION_SUFFIX}")
}

/// Extracts the jti from a `sess:<jti>` key.
pub fn jti_from_session_key(key: &str) -> Option<&str> {
    key.strip_prefix(SESSION_PREFIX).filter(|jti| !jti.is_empty())
}

/// Extracts the user id from a `user:<userId>:sessions` key.
pub fn user_id_from_sessions_key(key: &str) -> Option<&str> {
    key.strip_prefix(USER_PREFIX)?
        .strip_suffix(SESSIONS_SUFFIX)
        .filter(|id| !id.is_empty())
}

/// Matches `key` against a glob where `*` stands for any run of characters
/// (including none). No other metacharacters are recognised.
pub fn glob_match(pattern: &str, key: &str) -> bool {
    let mut parts = pattern.split('*');
    // split always yields at least one item
    let first = parts.next().unwrap_or_default();
    let Some(mut rest) = key.strip_prefix(first) else {
        return false;
    };

    let mut parts: Vec<&str> = parts.collect();
    let Some(last) = parts.pop() else {
        // no `*` at all
        return rest.is_empty();
    };

    for part in parts {
        match rest.find(part) {
            Some(idx) => rest = &rest[idx + part.len()..],
            None => return false,
        }
    }
    rest.len() >= last.len() && rest.ends_with(last)
}
