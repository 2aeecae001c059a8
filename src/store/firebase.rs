//! Firebase Realtime Database client.
//!
//! Talks to the RTDB REST API: `GET {url}/{path}.json` returns the node
//! (JSON `null` if absent) and `PATCH {url}/{path}.json` merges fields
//! into it. An optional auth token (database secret or ID token) is
//! appended as the `auth` query parameter.
//!
//! There are deliberately no request timeouts or retries here: a stalled
//! database call stalls the sweep, and a failed one ends the process.

use super::{SpaceRecord, SpaceStore};
use crate::config::FirebaseConfig;
use crate::error::{BridgeError, Result};
use async_trait::async_trait;
use log::debug;
use serde_json::Value;
use std::fs;

pub struct FirebaseStore {
    client: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
}

impl FirebaseStore {
    /// Build a client from configuration, loading the service credential
    /// file if one is configured and no token was given directly.
    pub fn new(config: &FirebaseConfig) -> Result<Self> {
        let auth_token = match (&config.auth_token, &config.credential_file) {
            (Some(token), _) => Some(token.clone()),
            (None, Some(path)) => {
                let token = fs::read_to_string(path).map_err(|e| {
                    BridgeError::Config(format!("cannot read credential file {}: {}", path, e))
                })?;
                Some(token.trim().to_string())
            }
            (None, None) => None,
        };

        Ok(Self {
            client: reqwest::Client::new(),
            base_url: config.database_url.trim_end_matches('/').to_string(),
            auth_token,
        })
    }

    fn node_url(&self, path: &str) -> String {
        let mut url = format!("{}/{}.json", self.base_url, path);
        if let Some(token) = &self.auth_token {
            url.push_str("?auth=");
            url.push_str(token);
        }
        url
    }

    fn space_path(space_id: &str) -> String {
        format!("parking_spaces/{}", space_id)
    }
}

#[async_trait]
impl SpaceStore for FirebaseStore {
    async fn get(&self, space_id: &str) -> Result<Option<SpaceRecord>> {
        let path = Self::space_path(space_id);
        debug!("GET {}", path);

        let value: Value = self
            .client
            .get(self.node_url(&path))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if value.is_null() {
            return Ok(None);
        }
        let record = serde_json::from_value(value).map_err(|e| BridgeError::StorePayload {
            path,
            reason: e.to_string(),
        })?;
        Ok(Some(record))
    }

    async fn update(&self, space_id: &str, patch: Value) -> Result<()> {
        let path = Self::space_path(space_id);
        debug!("PATCH {}: {}", path, patch);

        self.client
            .patch(self.node_url(&path))
            .json(&patch)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
