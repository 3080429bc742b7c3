use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A stored value, as kept by the backends that emulate Redis types.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) enum Value {
    Str(String),
    Hash(BTreeMap<String, String>),
    Set(BTreeSet<String>),
}

impl Value {
    /// MessagePack encoding used for persisted rows.
    pub(crate) fn encode(&self) -> Result<Vec<u8>> {
        rmp_serde::to_vec(self).map_err(|e| Error::Encode(e.to_string()))
    }

    pub(crate) fn decode(bytes: &[u8]) -> Result<Self> {
        rmp_serde::from_slice(bytes).map_err(|e| Error::Decode(e.to_string()))
    }

    pub(crate) fn as_str(&self, key: &str) -> Result<&str> {
        match self {
            Value::Str(s) => Ok(s),
            _ => Err(Error::WrongType(key.to_string())),
        }
    }

    pub(crate) fn as_hash(&self, key: &str) -> Result<&BTreeMap<String, String>> {
        match self {
            Value::Hash(h) => Ok(h),
            _ => Err(Error::WrongType(key.to_string())),
        }
    }

    pub(crate) fn as_set(&self, key: &str) -> Result<&BTreeSet<String>> {
        match self {
            Value::Set(s) => Ok(s),
            _ => Err(Error::WrongType(key.to_string())),
        }
    }
}

// The functions below take the current value of a key (None if absent) and
// return its replacement (None deletes the key) plus the command's reply.

pub(crate) fn incr(key: &str, current: Option<Value>) -> Result<(Option<Value>, i64)> {
    let now = match &current {
        None => 0,
        Some(v) => v
            .as_str(key)?
            .parse::<i64>()
            .map_err(|_| Error::NotAnInteger(key.to_string()))?,
    };
    let next = now
        .checked_add(1)
        .ok_or_else(|| Error::NotAnInteger(key.to_string()))?;
    Ok((Some(Value::Str(next.to_string())), next))
}

pub(crate) fn hset(
    key: &str,
    current: Option<Value>,
    fields: &[(&str, String)],
) -> Result<(Option<Value>, ())> {
    let mut hash = match current {
        None => BTreeMap::new(),
        Some(Value::Hash(h)) => h,
        Some(_) => return Err(Error::WrongType(key.to_string())),
    };
    for (field, value) in fields {
        hash.insert((*field).to_string(), value.clone());
    }
    Ok((Some(Value::Hash(hash)), ()))
}

pub(crate) fn hset_existing(
    key: &str,
    current: Option<Value>,
    fields: &[(&str, String)],
) -> Result<(Option<Value>, bool)> {
    match current {
        None => Ok((None, false)),
        Some(v) => hset(key, Some(v), fields).map(|(v, ())| (v, true)),
    }
}

pub(crate) fn sadd(key: &str, current: Option<Value>, member: &str) -> Result<(Option<Value>, bool)> {
    let mut set = match current {
        None => BTreeSet::new(),
        Some(Value::Set(s)) => s,
        Some(_) => return Err(Error::WrongType(key.to_string())),
    };
    let added = set.insert(member.to_string());
    Ok((Some(Value::Set(set)), added))
}

pub(crate) fn srem(key: &str, current: Option<Value>, member: &str) -> Result<(Option<Value>, bool)> {
    let mut set = match current {
        None => return Ok((None, false)),
        Some(Value::Set(s)) => s,
        Some(_) => return Err(Error::WrongType(key.to_string())),
    };
    let removed = set.remove(member);
    if set.is_empty() {
        Ok((None, removed))
    } else {
        Ok((Some(Value::Set(set)), removed))
    }
}

pub(crate) fn hash_to_map(key: &str, value: Option<&Value>) -> Result<HashMap<String, String>> {
    match value {
        None => Ok(HashMap::new()),
        Some(v) => Ok(v
            .as_hash(key)?
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()),
    }
}

pub(crate) fn set_to_vec(key: &str, value: Option<&Value>) -> Result<Vec<String>> {
    match value {
        None => Ok(Vec::new()),
        Some(v) => Ok(v.as_set(key)?.iter().cloned().collect()),
    }
}
