use random_winner_core::{Address, DappConfig, DappError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(flatten)]
    pub dapp: DappConfig,
    #[serde(default)]
    pub verbose: bool,
}

impl CliConfig {
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("random-winner")
            .join("config.json")
    }

    /// Load the config file. An explicit path must exist; the default path
    /// is optional.
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (Self::default_path(), false),
        };

        if !required && !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            DappError::config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: CliConfig = serde_json::from_str(&content)?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn apply_overrides(
        &mut self,
        rpc_url: Option<String>,
        subgraph_url: Option<String>,
        contract: Option<&str>,
    ) -> Result<()> {
        if let Some(url) = rpc_url {
            self.dapp.rpc_url = url;
        }
        if let Some(url) = subgraph_url {
            self.dapp.subgraph_url = url;
        }
        if let Some(contract) = contract {
            self.dapp.contract_address = Some(contract.parse::<Address>()?);
        }
        Ok(())
    }
}
