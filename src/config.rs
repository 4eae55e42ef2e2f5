// Credentials file handling. The config is read once at startup into an
// immutable value and passed by parameter to every stage; nothing in the
// crate reads it ambiently.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// API access credentials, loaded from a YAML key-value file.
///
/// The refresh token comes from the platform's one-time interactive
/// consent flow, which is outside this tool; at runtime it is exchanged
/// for a short-lived access token with a single token-endpoint request.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub developer_token: String,
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    /// Manager account to authenticate under, when the target customer
    /// is accessed through one.
    #[serde(default)]
    pub login_customer_id: Option<String>,
}

impl ApiConfig {
    /// Read and parse the credentials file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::parse(&raw)
    }

    /// Parse credentials from a YAML document.
    pub fn parse(raw: &str) -> Result<Self> {
        serde_yaml::from_str(raw).map_err(|e| Error::Config(format!("invalid config file: {e}")))
    }
}
