use std::{fs, io, path::Path};

use reqwest::{Client, Identity};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use crate::ChiaRpcClient;

#[derive(Debug, Error)]
pub enum FullNodeClientError {
    #[error("failed to read ssl credentials: {0}")]
    Io(#[from] io::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Connects to the RPC port of a locally running full node using its private SSL certificate.
#[derive(Debug, Clone)]
pub struct FullNodeClient {
    base_url: String,
    client: Client,
}

impl FullNodeClient {
    pub fn new(cert_bytes: &[u8], key_bytes: &[u8]) -> reqwest::Result<Self> {
        #[cfg(feature = "native-tls")]
        let identity = Identity::from_pkcs8_pem(cert_bytes, key_bytes)?;

        #[cfg(not(feature = "native-tls"))] // rustls
        let identity = Identity::from_pem(&[key_bytes, cert_bytes].concat())?;

        Ok(Self {
            base_url: "https://localhost:8555".to_string(),
            client: Client::builder()
                .danger_accept_invalid_certs(true)
                .identity(identity)
                .build()?,
        })
    }

    /// Reads the full node's private certificate from a chia root such as `~/.chia/mainnet`.
    pub fn from_chia_root(chia_root: &Path) -> Result<Self, FullNodeClientError> {
        let ssl_dir = chia_root.join("config/ssl/full_node");
        let cert_bytes = fs::read(ssl_dir.join("private_full_node.crt"))?;
        let key_bytes = fs::read(ssl_dir.join("private_full_node.key"))?;
        Ok(Self::new(&cert_bytes, &key_bytes)?)
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }
}

impl ChiaRpcClient for FullNodeClient {
    type Error = reqwest::Error;

    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn make_post_request<R, B>(&self, endpoint: &str, body: B) -> Result<R, Self::Error>
    where
        B: Serialize + Send,
        R: DeserializeOwned + Send,
    {
        let url = format!("{}/{}", self.base_url(), endpoint);
        let res = self.client.post(&url).json(&body).send().await?;
        res.json::<R>().await
    }
}
