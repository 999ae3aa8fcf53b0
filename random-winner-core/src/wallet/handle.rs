use crate::error::{DappError, Result};
use crate::types::{parse_quantity, to_quantity, Address, TxReceipt};
use crate::wallet::WalletProvider;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// How long and how often to poll for a transaction receipt.
#[derive(Debug, Clone, Copy)]
pub struct ConfirmationPolicy {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            timeout: Duration::from_secs(300),
        }
    }
}

/// Read-only access to the chain through the session's provider.
#[derive(Clone)]
pub struct ProviderHandle {
    provider: Arc<dyn WalletProvider>,
    chain_id: u64,
    confirmation: ConfirmationPolicy,
}

impl ProviderHandle {
    pub(crate) fn new(
        provider: Arc<dyn WalletProvider>,
        chain_id: u64,
        confirmation: ConfirmationPolicy,
    ) -> Self {
        Self {
            provider,
            chain_id,
            confirmation,
        }
    }

    /// Chain id observed when the handle was issued.
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// `eth_call` against the latest block.
    pub async fn call(&self, to: Address, data: &[u8]) -> Result<Vec<u8>> {
        let params = json!([
            { "to": to.to_string(), "data": format!("0x{}", hex::encode(data)) },
            "latest"
        ]);
        let result = self.provider.request("eth_call", params).await?;
        decode_hex_bytes(&result)
    }

    /// Receipt for `tx_hash`, or `None` while the transaction is pending.
    pub async fn transaction_receipt(&self, tx_hash: &str) -> Result<Option<TxReceipt>> {
        let result = self
            .provider
            .request("eth_getTransactionReceipt", json!([tx_hash]))
            .await?;
        if result.is_null() {
            return Ok(None);
        }
        decode_receipt(tx_hash, &result).map(Some)
    }
}

/// A provider handle bound to the connected account.
#[derive(Clone)]
pub struct SignerHandle {
    provider: ProviderHandle,
    account: Address,
}

impl SignerHandle {
    pub(crate) fn new(provider: ProviderHandle, account: Address) -> Self {
        Self { provider, account }
    }

    pub fn address(&self) -> Address {
        self.account
    }

    pub fn provider(&self) -> &ProviderHandle {
        &self.provider
    }

    /// Ask the wallet to sign and submit a transaction. Gas is left to the
    /// wallet.
    pub async fn send_transaction(
        &self,
        to: Address,
        data: &[u8],
        value: u128,
    ) -> Result<PendingTransaction> {
        let tx = json!({
            "from": self.account.to_string(),
            "to": to.to_string(),
            "data": format!("0x{}", hex::encode(data)),
            "value": to_quantity(value),
        });
        let result = self
            .provider
            .provider
            .request("eth_sendTransaction", json!([tx]))
            .await?;
        let tx_hash = result
            .as_str()
            .ok_or_else(|| DappError::transaction(format!("unexpected tx hash: {}", result)))?
            .to_string();

        tracing::info!("Submitted transaction {} from {}", tx_hash, self.account);
        Ok(PendingTransaction {
            tx_hash,
            provider: self.provider.clone(),
        })
    }
}

/// A submitted transaction that may not be mined yet.
pub struct PendingTransaction {
    tx_hash: String,
    provider: ProviderHandle,
}

impl PendingTransaction {
    pub fn tx_hash(&self) -> &str {
        &self.tx_hash
    }

    /// Block until the transaction is mined. A reverted transaction is an
    /// error.
    pub async fn wait(self) -> Result<TxReceipt> {
        let policy = self.provider.confirmation;
        let deadline = Instant::now() + policy.timeout;

        loop {
            if let Some(receipt) = self.provider.transaction_receipt(&self.tx_hash).await? {
                if !receipt.success {
                    return Err(DappError::Reverted {
                        tx_hash: self.tx_hash,
                    });
                }
                tracing::info!(
                    "Transaction {} mined in block {}",
                    receipt.tx_hash,
                    receipt.block_number
                );
                return Ok(receipt);
            }

            if Instant::now() >= deadline {
                return Err(DappError::Timeout(format!(
                    "transaction {} not mined after {:?}",
                    self.tx_hash, policy.timeout
                )));
            }
            tokio::time::sleep(policy.poll_interval).await;
        }
    }
}

/// Either kind of handle handed out by the session manager.
#[derive(Clone)]
pub enum Handle {
    ReadOnly(ProviderHandle),
    Signer(SignerHandle),
}

impl Handle {
    pub fn provider(&self) -> &ProviderHandle {
        match self {
            Handle::ReadOnly(provider) => provider,
            Handle::Signer(signer) => signer.provider(),
        }
    }

    pub fn signer(&self) -> Option<&SignerHandle> {
        match self {
            Handle::ReadOnly(_) => None,
            Handle::Signer(signer) => Some(signer),
        }
    }
}

fn decode_hex_bytes(value: &Value) -> Result<Vec<u8>> {
    let raw = value
        .as_str()
        .ok_or_else(|| DappError::abi(format!("expected hex string, got {}", value)))?;
    let digits = raw
        .strip_prefix("0x")
        .ok_or_else(|| DappError::abi(format!("hex data without 0x prefix: {}", raw)))?;
    hex::decode(digits).map_err(|e| DappError::abi(format!("invalid hex data: {}", e)))
}

fn decode_receipt(tx_hash: &str, value: &Value) -> Result<TxReceipt> {
    let block_number = match value.get("blockNumber").and_then(Value::as_str) {
        Some(raw) => u64::try_from(parse_quantity(raw)?)
            .map_err(|_| DappError::transaction(format!("block number out of range: {}", raw)))?,
        None => 0,
    };
    // Pre-Byzantium receipts carry no status; treat them as successful.
    let success = match value.get("status").and_then(Value::as_str) {
        Some(status) => parse_quantity(status)? == 1,
        None => true,
    };
    let tx_hash = value
        .get("transactionHash")
        .and_then(Value::as_str)
        .unwrap_or(tx_hash)
        .to_string();

    Ok(TxReceipt {
        tx_hash,
        block_number,
        success,
    })
}
