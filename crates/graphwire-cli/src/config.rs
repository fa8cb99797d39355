//! graphwire.toml: connection defaults for `gw`.

use std::path::{Path, PathBuf};

use graphwire::{Credential, Options};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub addresses: Vec<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub tls: bool,
    pub tls_root_ca: Option<PathBuf>,
    /// Sent with every session and transaction `gw` opens.
    pub options: Options,
}

impl CliConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: CliConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Addresses to dial, defaulting to a local server.
    pub fn seeds(&self) -> Vec<String> {
        if self.addresses.is_empty() {
            vec!["localhost:1729".to_string()]
        } else {
            self.addresses.clone()
        }
    }

    pub fn credential(&self) -> anyhow::Result<Credential> {
        let username = self.username.clone().unwrap_or_else(|| "admin".to_string());
        let password = self
            .password
            .clone()
            .ok_or_else(|| anyhow::anyhow!("no password given (use --password or GRAPHWIRE_PASSWORD)"))?;
        Ok(if self.tls {
            Credential::with_tls(username, password, self.tls_root_ca.clone())
        } else {
            Credential::new(username, password)
        })
    }
}
