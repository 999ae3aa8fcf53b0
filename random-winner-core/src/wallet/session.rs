use crate::config::DappConfig;
use crate::error::{DappError, Result};
use crate::types::{parse_quantity, Address};
use crate::wallet::{
    network_name, Alert, ConfirmationPolicy, Handle, HttpProvider, LogAlert, ProviderHandle,
    SignerHandle, WalletProvider,
};
use parking_lot::RwLock;
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connected { account: Address, chain_id: u64 },
}

/// What a session event did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionTransition {
    Unchanged,
    AccountChanged { previous: Address, current: Address },
    Disconnected,
}

/// Owns the single wallet provider of a session and gates every handle on
/// the required network.
pub struct SessionManager {
    provider: Arc<dyn WalletProvider>,
    required_chain_id: u64,
    confirmation: ConfirmationPolicy,
    state: RwLock<SessionState>,
    alert: Arc<dyn Alert>,
}

impl SessionManager {
    pub fn new(provider: Arc<dyn WalletProvider>, config: &DappConfig) -> Self {
        Self {
            provider,
            required_chain_id: config.required_chain_id,
            confirmation: ConfirmationPolicy {
                poll_interval: config.confirmation_poll_interval(),
                timeout: config.confirmation_timeout(),
            },
            state: RwLock::new(SessionState::Disconnected),
            alert: Arc::new(LogAlert),
        }
    }

    /// Session over the configured JSON-RPC wallet endpoint.
    pub fn from_config(config: &DappConfig) -> Result<Self> {
        let provider = HttpProvider::new(config.rpc_url.clone())?;
        Ok(Self::new(Arc::new(provider), config))
    }

    pub fn with_alert(mut self, alert: Arc<dyn Alert>) -> Self {
        self.alert = alert;
        self
    }

    pub fn required_chain_id(&self) -> u64 {
        self.required_chain_id
    }

    pub fn state(&self) -> SessionState {
        self.state.read().clone()
    }

    pub fn is_connected(&self) -> bool {
        matches!(*self.state.read(), SessionState::Connected { .. })
    }

    pub fn account(&self) -> Option<Address> {
        match *self.state.read() {
            SessionState::Connected { account, .. } => Some(account),
            SessionState::Disconnected => None,
        }
    }

    /// Run the wallet's account-request flow. On failure the session stays
    /// disconnected.
    pub async fn connect(&self) -> Result<Address> {
        match self.try_connect().await {
            Ok((account, chain_id)) => {
                *self.state.write() = SessionState::Connected { account, chain_id };
                tracing::info!(
                    "Connected wallet {} on {}",
                    account,
                    network_name(chain_id)
                );
                Ok(account)
            }
            Err(e) => {
                tracing::error!("Failed to connect wallet: {}", e);
                Err(e)
            }
        }
    }

    async fn try_connect(&self) -> Result<(Address, u64)> {
        let accounts = self
            .provider
            .request("eth_requestAccounts", json!([]))
            .await?;
        let account = parse_accounts(accounts)?
            .into_iter()
            .next()
            .ok_or_else(|| DappError::wallet("Wallet returned no accounts"))?;

        let chain_id = self.chain_id().await?;
        self.check_network(chain_id)?;
        Ok((account, chain_id))
    }

    /// A read-only handle, or a signing handle for the connected account when
    /// `needs_signer`. The network is checked on every call.
    pub async fn get_handle(&self, needs_signer: bool) -> Result<Handle> {
        let account = self.account().ok_or(DappError::NotConnected)?;

        let chain_id = self.chain_id().await?;
        self.check_network(chain_id)?;

        {
            let mut state = self.state.write();
            if let SessionState::Connected { chain_id: seen, .. } = &mut *state {
                *seen = chain_id;
            }
        }

        let provider = ProviderHandle::new(self.provider.clone(), chain_id, self.confirmation);
        if needs_signer {
            Ok(Handle::Signer(SignerHandle::new(provider, account)))
        } else {
            Ok(Handle::ReadOnly(provider))
        }
    }

    pub async fn provider(&self) -> Result<ProviderHandle> {
        match self.get_handle(false).await? {
            Handle::ReadOnly(provider) => Ok(provider),
            Handle::Signer(signer) => Ok(signer.provider().clone()),
        }
    }

    pub async fn signer(&self) -> Result<SignerHandle> {
        match self.get_handle(true).await? {
            Handle::Signer(signer) => Ok(signer),
            Handle::ReadOnly(_) => Err(DappError::wallet("Signer unavailable")),
        }
    }

    /// Poll the wallet's account list and apply any change.
    pub async fn refresh(&self) -> Result<SessionTransition> {
        if !self.is_connected() {
            return Ok(SessionTransition::Unchanged);
        }
        let accounts = self.provider.request("eth_accounts", json!([])).await?;
        let accounts = parse_accounts(accounts)?;
        Ok(self.accounts_changed(&accounts))
    }

    /// Apply an account list reported by the wallet. An empty list ends the
    /// session; a different first account switches it.
    pub fn accounts_changed(&self, accounts: &[Address]) -> SessionTransition {
        let mut state = self.state.write();
        let (previous, chain_id) = match *state {
            SessionState::Connected { account, chain_id } => (account, chain_id),
            SessionState::Disconnected => return SessionTransition::Unchanged,
        };

        match accounts.first() {
            None => {
                *state = SessionState::Disconnected;
                tracing::info!("Wallet {} disconnected", previous);
                SessionTransition::Disconnected
            }
            Some(current) if *current == previous => SessionTransition::Unchanged,
            Some(current) => {
                *state = SessionState::Connected {
                    account: *current,
                    chain_id,
                };
                tracing::info!("Wallet account changed from {} to {}", previous, current);
                SessionTransition::AccountChanged {
                    previous,
                    current: *current,
                }
            }
        }
    }

    pub fn disconnect(&self) -> SessionTransition {
        let mut state = self.state.write();
        match *state {
            SessionState::Connected { account, .. } => {
                *state = SessionState::Disconnected;
                tracing::info!("Disconnected wallet {}", account);
                SessionTransition::Disconnected
            }
            SessionState::Disconnected => SessionTransition::Unchanged,
        }
    }

    async fn chain_id(&self) -> Result<u64> {
        let value = self.provider.request("eth_chainId", json!([])).await?;
        let raw = value
            .as_str()
            .ok_or_else(|| DappError::wallet(format!("unexpected chain id: {}", value)))?;
        u64::try_from(parse_quantity(raw)?)
            .map_err(|_| DappError::wallet(format!("chain id out of range: {}", raw)))
    }

    fn check_network(&self, chain_id: u64) -> Result<()> {
        if chain_id != self.required_chain_id {
            self.alert.alert(&format!(
                "Change the network to {}",
                network_name(self.required_chain_id)
            ));
            return Err(DappError::WrongNetwork {
                expected: self.required_chain_id,
                actual: chain_id,
            });
        }
        Ok(())
    }
}

fn parse_accounts(value: Value) -> Result<Vec<Address>> {
    Ok(serde_json::from_value(value)?)
}
