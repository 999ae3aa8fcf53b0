//! In-process fakes for the wallet provider and the game index.

use crate::contract::{abi, GAME_STARTED, OWNER};
use crate::error::{DappError, Result, USER_REJECTED_CODE};
use crate::subgraph::{GameIndex, GameRecord};
use crate::types::{to_quantity, Address};
use crate::wallet::{Alert, WalletProvider};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::Notify;

pub struct FakeWalletState {
    pub chain_id: u128,
    pub accounts: Vec<String>,
    pub reject_connect: bool,
    pub reject_send: bool,
    pub game_started: bool,
    pub owner: Address,
    pub sent: Vec<Value>,
    pub pending_receipt_polls: u32,
    pub receipt_polls: u32,
    pub receipt_status: &'static str,
}

pub struct FakeWallet {
    pub state: Mutex<FakeWalletState>,
}

impl FakeWallet {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeWalletState {
                chain_id: 80001,
                accounts: vec![Self::player().to_string()],
                reject_connect: false,
                reject_send: false,
                game_started: false,
                owner: Self::owner(),
                sent: Vec::new(),
                pending_receipt_polls: 0,
                receipt_polls: 0,
                receipt_status: "0x1",
            }),
        }
    }

    pub fn player() -> Address {
        "0x00000000000000000000000000000000000000aa"
            .parse()
            .expect("valid address")
    }

    pub fn owner() -> Address {
        "0xabcdef0000000000000000000000000000000001"
            .parse()
            .expect("valid address")
    }

    pub fn contract() -> Address {
        "0x5555555555555555555555555555555555555555"
            .parse()
            .expect("valid address")
    }

    fn rejection() -> DappError {
        DappError::Rpc {
            code: USER_REJECTED_CODE,
            message: "User rejected the request.".to_string(),
        }
    }

    fn eth_call(state: &FakeWalletState, params: &Value) -> Result<Value> {
        let data = params[0]["data"].as_str().unwrap_or_default();
        let selector = format!("0x{}", hex::encode(abi::selector(GAME_STARTED)));
        let word = if data == selector {
            abi::encode_word(&abi::Token::Bool(state.game_started))
        } else if data == format!("0x{}", hex::encode(abi::selector(OWNER))) {
            abi::encode_word(&abi::Token::Address(state.owner))
        } else {
            return Err(DappError::Rpc {
                code: -32000,
                message: "execution reverted".to_string(),
            });
        };
        Ok(json!(format!("0x{}", hex::encode(word))))
    }
}

#[async_trait]
impl WalletProvider for FakeWallet {
    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let mut state = self.state.lock();
        match method {
            "eth_requestAccounts" if state.reject_connect => Err(Self::rejection()),
            "eth_requestAccounts" | "eth_accounts" => Ok(json!(state.accounts)),
            "eth_chainId" => Ok(json!(to_quantity(state.chain_id))),
            "eth_call" => Self::eth_call(&state, &params),
            "eth_sendTransaction" if state.reject_send => Err(Self::rejection()),
            "eth_sendTransaction" => {
                state.sent.push(params[0].clone());
                Ok(json!(format!("0x{:064x}", state.sent.len())))
            }
            "eth_getTransactionReceipt" => {
                state.receipt_polls += 1;
                if state.pending_receipt_polls > 0 {
                    state.pending_receipt_polls -= 1;
                    return Ok(Value::Null);
                }
                Ok(json!({
                    "transactionHash": params[0],
                    "blockNumber": "0x10",
                    "status": state.receipt_status,
                }))
            }
            other => Err(DappError::Rpc {
                code: -32601,
                message: format!("method {} not supported", other),
            }),
        }
    }
}

#[derive(Default)]
pub struct FakeIndex {
    record: Mutex<Option<GameRecord>>,
    failure: Mutex<Option<String>>,
}

impl FakeIndex {
    pub fn with(record: GameRecord) -> Self {
        Self {
            record: Mutex::new(Some(record)),
            failure: Mutex::new(None),
        }
    }

    pub fn fail_with(&self, message: &str) {
        *self.failure.lock() = Some(message.to_string());
    }
}

#[async_trait]
impl GameIndex for FakeIndex {
    async fn latest_game(&self) -> Result<Option<GameRecord>> {
        if let Some(message) = self.failure.lock().clone() {
            return Err(DappError::subgraph_transport(message));
        }
        Ok(self.record.lock().clone())
    }
}

/// Holds every `latest_game` call until [`GatedIndex::release`].
pub struct GatedIndex {
    record: GameRecord,
    entered: Notify,
    released: Notify,
}

impl GatedIndex {
    pub fn new(record: GameRecord) -> Self {
        Self {
            record,
            entered: Notify::new(),
            released: Notify::new(),
        }
    }

    /// Resolves once a query is waiting at the gate.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self) {
        self.released.notify_one();
    }
}

#[async_trait]
impl GameIndex for GatedIndex {
    async fn latest_game(&self) -> Result<Option<GameRecord>> {
        self.entered.notify_one();
        self.released.notified().await;
        Ok(Some(self.record.clone()))
    }
}

#[derive(Default)]
pub struct RecordingAlert {
    messages: Mutex<Vec<String>>,
}

impl RecordingAlert {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }
}

impl Alert for RecordingAlert {
    fn alert(&self, message: &str) {
        self.messages.lock().push(message.to_string());
    }
}
