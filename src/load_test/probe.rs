// HTTP probe: one GET against the target, reporting only the status code.

use async_trait::async_trait;
use thiserror::Error;

use crate::version;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// Issues a GET for a path relative to the target and returns the status.
#[async_trait]
pub trait Probe: Send + Sync {
    async fn get(&self, path: &str) -> Result<u16, ProbeError>;
}

/// reqwest-backed probe. Redirects are returned, not followed.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
    base_url: String,
}

impl HttpProbe {
    pub fn new(base_url: &str) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(version::user_agent())
            .build()
            .map_err(|e| ProbeError::Client(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn get(&self, path: &str) -> Result<u16, ProbeError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProbeError::Transport(e.to_string()))?;
        Ok(response.status().as_u16())
    }
}
