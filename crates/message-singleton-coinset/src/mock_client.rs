use std::collections::HashMap;

use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::ChiaRpcClient;

#[derive(Debug, Error)]
pub enum MockRpcError {
    #[error("no mock response configured for {0}")]
    MissingResponse(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Answers requests with canned JSON keyed by URL, and records every request it receives.
#[derive(Debug, Default)]
pub struct MockRpcClient {
    requests: Mutex<Vec<(String, Value)>>,
    responses: HashMap<String, String>,
}

impl MockRpcClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mock_response(&mut self, url: &str, response: &str) {
        self.responses.insert(url.to_string(), response.to_string());
    }

    pub fn requests(&self) -> Vec<(String, Value)> {
        self.requests.lock().clone()
    }
}

impl ChiaRpcClient for MockRpcClient {
    type Error = MockRpcError;

    fn base_url(&self) -> &str {
        "http://api.example.com"
    }

    async fn make_post_request<R, B>(&self, endpoint: &str, body: B) -> Result<R, Self::Error>
    where
        B: Serialize + Send,
        R: DeserializeOwned + Send,
    {
        let url = format!("{}/{}", self.base_url(), endpoint);
        self.requests
            .lock()
            .push((url.clone(), serde_json::to_value(body)?));

        let response = self
            .responses
            .get(&url)
            .ok_or(MockRpcError::MissingResponse(url))?;

        Ok(serde_json::from_str(response)?)
    }
}
