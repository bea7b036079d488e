// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Persisted settings: a byte-level storage port and a JSON service over it.
//!
//! Keys are bare names such as `viewer`; adapters decide where the bytes
//! live. The service treats a missing or blank blob as "nothing stored".

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Where settings blobs are kept.
pub trait ConfigStore {
    /// Bytes stored under `key`, or [`ConfigError::NotFound`].
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError>;
    /// Replaces whatever is stored under `key`.
    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError>;
    /// Forgets `key`. Forgetting an absent key succeeds.
    fn remove_raw(&self, key: &str) -> Result<(), ConfigError>;
}

/// Failure reading or writing settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Nothing stored under the key.
    #[error("no stored settings for this key")]
    NotFound,
    /// Key is empty, hidden or contains path components.
    #[error("settings key {0:?} is not a plain name")]
    InvalidKey(String),
    /// Storage backend I/O failed.
    #[error("settings storage: {0}")]
    Io(#[from] std::io::Error),
    /// Stored bytes are not valid JSON for the requested type.
    #[error("settings format: {0}")]
    Serde(#[from] serde_json::Error),
    /// Backend-specific failure, e.g. no home directory to derive a path from.
    #[error("settings backend: {0}")]
    Other(String),
}

/// Accepts plain names only: non-empty, not dot-prefixed, no separators.
pub fn check_key(key: &str) -> Result<(), ConfigError> {
    let plain = !key.is_empty()
        && !key.starts_with('.')
        && !key.contains(['/', '\\'])
        && !key.contains("..");
    plain.then_some(()).ok_or_else(|| ConfigError::InvalidKey(key.to_owned()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<Option<T>, ConfigError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    Ok(Some(serde_json::from_slice(bytes)?))
}

/// Typed settings access on top of a [`ConfigStore`].
#[derive(Debug)]
pub struct ConfigService<S> {
    backend: S,
}

impl<S> ConfigService<S> {
    /// Wraps `backend`.
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    /// The wrapped backend.
    pub fn store(&self) -> &S {
        &self.backend
    }

    /// Unwraps the backend.
    pub fn into_inner(self) -> S {
        self.backend
    }
}

impl<S: ConfigStore> ConfigService<S> {
    /// Value stored under `key`; `Ok(None)` when absent or blank.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        match self.backend.load_raw(key) {
            Ok(bytes) => decode(&bytes),
            Err(ConfigError::NotFound) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Like [`Self::load`] with `T::default()` standing in for absence.
    pub fn load_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T, ConfigError> {
        self.load(key).map(Option::unwrap_or_default)
    }

    /// Stores `value` under `key` as pretty-printed JSON.
    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), ConfigError> {
        let json = serde_json::to_vec_pretty(value)?;
        self.backend.save_raw(key, &json)
    }

    /// Drops the value under `key`.
    pub fn remove(&self, key: &str) -> Result<(), ConfigError> {
        self.backend.remove_raw(key)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MemStore(RefCell<HashMap<String, Vec<u8>>>);

    impl ConfigStore for MemStore {
        fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
            self.0.borrow().get(key).cloned().ok_or(ConfigError::NotFound)
        }
        fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
            self.0.borrow_mut().insert(key.to_owned(), data.to_vec());
            Ok(())
        }
        fn remove_raw(&self, key: &str) -> Result<(), ConfigError> {
            self.0.borrow_mut().remove(key);
            Ok(())
        }
    }

    #[test]
    fn missing_and_blank_values_load_as_none() {
        let svc = ConfigService::new(MemStore::default());
        assert_eq!(svc.load::<u32>("k").unwrap(), None);
        svc.store().save_raw("k", b"  \n").unwrap();
        assert_eq!(svc.load::<u32>("k").unwrap(), None);
        assert_eq!(svc.load_or_default::<u32>("k").unwrap(), 0);
    }

    #[test]
    fn save_load_remove() {
        let svc = ConfigService::new(MemStore::default());
        svc.save("k", &vec![1, 2]).unwrap();
        assert_eq!(svc.load::<Vec<i32>>("k").unwrap(), Some(vec![1, 2]));
        svc.remove("k").unwrap();
        assert_eq!(svc.load::<Vec<i32>>("k").unwrap(), None);
    }

    #[test]
    fn corrupt_blob_is_a_serde_error() {
        let svc = ConfigService::new(MemStore::default());
        svc.store().save_raw("k", b"{nope").unwrap();
        assert!(matches!(svc.load::<u32>("k"), Err(ConfigError::Serde(_))));
    }

    #[test]
    fn keys_cannot_escape() {
        assert!(check_key("viewer").is_ok());
        for bad in ["", "../x", "a/b", ".hidden", "a\\b"] {
            assert!(matches!(check_key(bad), Err(ConfigError::InvalidKey(_))), "{bad}");
        }
    }
}
