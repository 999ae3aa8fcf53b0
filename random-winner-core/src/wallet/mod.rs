pub mod handle;
pub mod rpc;
pub mod session;

pub use handle::{ConfirmationPolicy, Handle, PendingTransaction, ProviderHandle, SignerHandle};
pub use rpc::HttpProvider;
pub use session::{SessionManager, SessionState, SessionTransition};

use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// EIP-1193 style provider: a single `request` entry point taking a JSON-RPC
/// method name and its positional params.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    async fn request(&self, method: &str, params: Value) -> Result<Value>;
}

/// Sink for messages the user must see immediately (the wrong-network case).
pub trait Alert: Send + Sync {
    fn alert(&self, message: &str);
}

/// Default sink: the alert only reaches the log.
pub struct LogAlert;

impl Alert for LogAlert {
    fn alert(&self, message: &str) {
        tracing::warn!("{}", message);
    }
}

/// Human name for the chains this client knows about.
pub fn network_name(chain_id: u64) -> String {
    match chain_id {
        1 => "Ethereum".to_string(),
        137 => "Polygon".to_string(),
        80001 => "Mumbai".to_string(),
        other => format!("chain {}", other),
    }
}
