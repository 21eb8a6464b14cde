//! IdentityClient - Face-Identification Service Adapter
//!
//! Submits a snapshot URL to the identification service and returns the
//! matched person, if any. The service itself is a black box.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::entry_workflow::capabilities::PersonIdentifier;
use crate::error::{Error, Result};

/// Person identity returned by the identification service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Identification request body
#[derive(Debug, Serialize)]
struct IdentifyRequest<'a> {
    capture_url: &'a str,
}

/// Face-identification service client
pub struct IdentityClient {
    client: reqwest::Client,
    base_url: String,
}

impl IdentityClient {
    /// Create a new identity client
    pub fn new(base_url: String) -> Self {
        Self::with_timeout(base_url, Duration::from_secs(30))
    }

    /// Create a new identity client with a custom request timeout
    pub fn with_timeout(base_url: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { client, base_url }
    }

    /// Identify the person in a capture; `None` when nobody matched
    pub async fn identify(&self, capture_url: &str) -> Result<Option<Person>> {
        let url = format!("{}/person/identify", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(&IdentifyRequest { capture_url })
            .send()
            .await?;

        match resp.status() {
            status if status.is_success() => {
                let person: Person = resp.json().await?;
                tracing::debug!(username = %person.username, "Person identified");
                Ok(Some(person))
            }
            reqwest::StatusCode::NOT_FOUND => Ok(None),
            status => Err(Error::ExternalService {
                service: "identity",
                detail: format!("identification failed: {}", status),
            }),
        }
    }
}

#[async_trait::async_trait]
impl PersonIdentifier for IdentityClient {
    async fn identify(&self, capture_url: &str) -> Result<Option<Person>> {
        IdentityClient::identify(self, capture_url).await
    }
}
