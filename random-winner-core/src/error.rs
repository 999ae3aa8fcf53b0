use thiserror::Error;

pub type Result<T> = std::result::Result<T, DappError>;

/// EIP-1193 code returned when the user declines a wallet prompt.
pub const USER_REJECTED_CODE: i64 = 4001;

#[derive(Error, Debug)]
pub enum DappError {
    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Wallet not connected")]
    NotConnected,

    #[error("Wrong network: expected chain id {expected}, wallet is on {actual}")]
    WrongNetwork { expected: u64, actual: u64 },

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Error making subgraph query: {0}")]
    Query(String),

    #[error("Could not query the subgraph: {0}")]
    SubgraphTransport(String),

    #[error("Subgraph returned no games")]
    NoGameRecord,

    #[error("ABI error: {0}")]
    Abi(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Transaction {tx_hash} reverted")]
    Reverted { tx_hash: String },

    #[error("Operation timeout: {0}")]
    Timeout(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Contract address is not set")]
    MissingContract,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Dialog error: {0}")]
    Dialog(String),
}

impl DappError {
    pub fn wallet(msg: impl Into<String>) -> Self {
        Self::Wallet(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    pub fn subgraph_transport(msg: impl Into<String>) -> Self {
        Self::SubgraphTransport(msg.into())
    }

    pub fn abi(msg: impl Into<String>) -> Self {
        Self::Abi(msg.into())
    }

    pub fn transaction(msg: impl Into<String>) -> Self {
        Self::Transaction(msg.into())
    }

    pub fn dialog(msg: impl Into<String>) -> Self {
        Self::Dialog(msg.into())
    }

    /// True when the wallet reported that the user declined the request.
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, Self::Rpc { code, .. } if *code == USER_REJECTED_CODE)
    }

    /// Session errors invalidate the handle; callers should reconnect.
    pub fn is_session_error(&self) -> bool {
        matches!(
            self,
            Self::NotConnected | Self::WrongNetwork { .. } | Self::Wallet(_)
        )
    }
}
