//! Blocking HTTP client for the Ecomail API.

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::debug;

use super::{EcomailError, SubscriberDirectory};
use crate::config::EcomailConfig;

pub struct EcomailClient {
    http: Client,
    api_key: String,
    base_url: String,
}

impl EcomailClient {
    pub fn new(config: &EcomailConfig) -> Result<Self, EcomailError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(EcomailError::Http)?;
        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

/// The subscriber object arrives wrapped in one of several envelopes;
/// unwrap until we hold the object itself.
fn unwrap_subscriber(mut value: Value) -> Value {
    for key in ["data", "subscriber"] {
        if let Some(inner) = value.get_mut(key) {
            value = inner.take();
        }
    }
    value
}

impl SubscriberDirectory for EcomailClient {
    fn lookup(&self, email: &str) -> Result<Option<Value>, EcomailError> {
        let url = format!("{}/subscribers/{}", self.base_url, email);
        let response = self
            .http
            .get(&url)
            .header("key", &self.api_key)
            .send()
            .map_err(EcomailError::Http)?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(email, "subscriber not on the list");
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(EcomailError::Api {
                status: response.status().as_u16(),
                body: response.text().unwrap_or_default(),
            });
        }

        let value: Value = response.json().map_err(EcomailError::Http)?;
        Ok(Some(unwrap_subscriber(value)))
    }

    fn upsert(&self, list_id: &str, payload: &Value) -> Result<Value, EcomailError> {
        let url = format!("{}/lists/{}/subscribe", self.base_url, list_id);
        let response = self
            .http
            .post(&url)
            .header("key", &self.api_key)
            .json(payload)
            .send()
            .map_err(EcomailError::Http)?;

        if !response.status().is_success() {
            return Err(EcomailError::Api {
                status: response.status().as_u16(),
                body: response.text().unwrap_or_default(),
            });
        }
        response.json().map_err(EcomailError::Http)
    }
}
