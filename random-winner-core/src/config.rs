use crate::error::{DappError, Result};
use crate::types::Address;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Polygon Mumbai testnet.
pub const MUMBAI_CHAIN_ID: u64 = 80001;

pub const DEFAULT_SUBGRAPH_URL: &str =
    "https://api.thegraph.com/subgraphs/name/maguroid/learnweb3";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DappConfig {
    /// JSON-RPC endpoint of the wallet provider.
    pub rpc_url: String,
    pub subgraph_url: String,
    pub contract_address: Option<Address>,
    pub required_chain_id: u64,
    pub poll_interval_ms: u64,
    pub confirmation_poll_interval_ms: u64,
    pub confirmation_timeout_secs: u64,
}

impl Default for DappConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:1248".to_string(),
            subgraph_url: DEFAULT_SUBGRAPH_URL.to_string(),
            contract_address: None,
            required_chain_id: MUMBAI_CHAIN_ID,
            poll_interval_ms: 2000,
            confirmation_poll_interval_ms: 1000,
            confirmation_timeout_secs: 300, // 5 minutes
        }
    }
}

impl DappConfig {
    pub fn new(contract_address: Address) -> Self {
        Self {
            contract_address: Some(contract_address),
            ..Self::default()
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn confirmation_poll_interval(&self) -> Duration {
        Duration::from_millis(self.confirmation_poll_interval_ms)
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }

    /// The configured game contract, or a config error if none was set.
    pub fn contract(&self) -> Result<Address> {
        self.contract_address.ok_or(DappError::MissingContract)
    }

    pub fn validate(&self) -> Result<()> {
        if self.rpc_url.is_empty() {
            return Err(DappError::config("Wallet RPC URL cannot be empty"));
        }

        if self.subgraph_url.is_empty() {
            return Err(DappError::config("Subgraph URL cannot be empty"));
        }

        if self.contract()? == Address::ZERO {
            return Err(DappError::config("Contract address cannot be zero"));
        }

        if self.poll_interval_ms == 0 {
            return Err(DappError::config("Poll interval must be greater than 0"));
        }

        if self.confirmation_poll_interval_ms == 0 {
            return Err(DappError::config(
                "Confirmation poll interval must be greater than 0",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contract() -> Address {
        "0x1111111111111111111111111111111111111111".parse().unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = DappConfig::new(contract());
        assert_eq!(config.required_chain_id, 80001);
        assert_eq!(config.poll_interval(), Duration::from_millis(2000));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_requires_contract() {
        let config = DappConfig::default();
        assert!(matches!(config.validate(), Err(DappError::MissingContract)));

        let mut config = DappConfig::new(contract());
        config.rpc_url.clear();
        assert!(matches!(config.validate(), Err(DappError::Config(_))));

        let mut config = DappConfig::new(Address::ZERO);
        assert!(config.validate().is_err());

        config.contract_address = Some(contract());
        config.poll_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: DappConfig = serde_json::from_str(
            r#"{"contract_address": "0x1111111111111111111111111111111111111111"}"#,
        )
        .unwrap();
        assert_eq!(config.contract_address, Some(contract()));
        assert_eq!(config.subgraph_url, DEFAULT_SUBGRAPH_URL);
    }
}
