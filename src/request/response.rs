use std::collections::HashMap;

use serde::de::DeserializeOwned;

use crate::request::transport::{Completion, TransportError};
use crate::request::types::Outcome;

/// Response delivered to terminal callbacks
#[derive(Debug, Clone, PartialEq)]
pub struct WebResponse {
    pub url: String,
    pub status_code: Option<u16>,
    pub headers: HashMap<String, String>,
    pub bytes: Vec<u8>,
    pub error: Option<String>,
    pub outcome: Outcome,
}

impl WebResponse {
    /// Build the response and classify it. A network failure wins over a
    /// protocol failure, and anything without a failure is a success.
    pub fn from_completion(completion: Completion) -> Self {
        let outcome = classify(completion.failure.as_ref());
        Self {
            url: completion.url,
            status_code: completion.status_code,
            headers: completion.headers,
            bytes: completion.body,
            error: completion.failure.map(|failure| match failure {
                TransportError::Network(message) | TransportError::Protocol(message) => message,
            }),
            outcome,
        }
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.bytes)
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, value)| value.as_str())
    }

    pub fn is_successful(&self) -> bool {
        self.outcome == Outcome::Succeeded
    }

    pub fn is_http_error(&self) -> bool {
        self.outcome == Outcome::HttpError
    }

    pub fn is_network_error(&self) -> bool {
        self.outcome == Outcome::NetworkError
    }
}

pub fn classify(failure: Option<&TransportError>) -> Outcome {
    match failure {
        Some(TransportError::Network(_)) => Outcome::NetworkError,
        Some(TransportError::Protocol(_)) => Outcome::HttpError,
        None => Outcome::Succeeded,
    }
}
