use std::collections::HashMap;

use parking_lot::RwLock;

use crate::request::error::RequestError;

/// Default headers merged into every request built after they are set.
///
/// Handles copy the map at construction; later changes never reach handles
/// that already exist.
#[derive(Debug, Default)]
pub struct SuperHeaders {
    headers: RwLock<HashMap<String, String>>,
}

impl SuperHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(headers: HashMap<String, String>) -> Result<Self, RequestError> {
        let super_headers = Self::new();
        for (key, value) in headers {
            super_headers.set(key, value)?;
        }
        Ok(super_headers)
    }

    /// Insert or replace a default header. Empty keys and values are rejected;
    /// use [`SuperHeaders::remove`] to drop a header.
    pub fn set(
        &self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), RequestError> {
        let key = key.into();
        let value = value.into();

        if key.is_empty() {
            return Err(RequestError::InvalidHeader("key cannot be empty".to_string()));
        }
        if value.is_empty() {
            return Err(RequestError::InvalidHeader(format!(
                "value for '{key}' cannot be empty, remove the header instead"
            )));
        }

        tracing::debug!(header = %key, "Super header set");
        self.headers.write().insert(key, value);
        Ok(())
    }

    /// Returns whether the key was present.
    pub fn remove(&self, key: &str) -> bool {
        if key.is_empty() {
            tracing::warn!("Attempted to remove a super header with an empty key");
            return false;
        }
        self.headers.write().remove(key).is_some()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.headers.read().get(key).cloned()
    }

    /// Consistent copy of the current defaults
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.headers.read().clone()
    }

    pub fn len(&self) -> usize {
        self.headers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.read().is_empty()
    }
}
