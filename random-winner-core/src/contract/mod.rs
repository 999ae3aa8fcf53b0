pub mod abi;

use crate::error::{DappError, Result};
use crate::types::Address;
use crate::wallet::{Handle, PendingTransaction, SignerHandle};
use abi::Token;

pub const START_GAME: &str = "startGame(uint8,uint256)";
pub const JOIN_GAME: &str = "joinGame()";
pub const GAME_STARTED: &str = "gameStarted()";
pub const OWNER: &str = "owner()";

/// Typed calls against a deployed Random Winner Game contract.
pub struct RandomGameContract {
    address: Address,
    handle: Handle,
}

impl RandomGameContract {
    pub fn new(address: Address, handle: Handle) -> Self {
        Self { address, handle }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub async fn game_started(&self) -> Result<bool> {
        let data = abi::encode_call(GAME_STARTED, &[]);
        let output = self.handle.provider().call(self.address, &data).await?;
        abi::decode_bool(&output)
    }

    pub async fn owner(&self) -> Result<Address> {
        let data = abi::encode_call(OWNER, &[]);
        let output = self.handle.provider().call(self.address, &data).await?;
        abi::decode_address(&output)
    }

    /// Owner only; the contract rejects anyone else.
    pub async fn start_game(&self, max_players: u8, entry_fee: u128) -> Result<PendingTransaction> {
        let data = abi::encode_call(
            START_GAME,
            &[Token::Uint(max_players.into()), Token::Uint(entry_fee)],
        );
        self.signer()?
            .send_transaction(self.address, &data, 0)
            .await
    }

    /// `value` must equal the current entry fee.
    pub async fn join_game(&self, value: u128) -> Result<PendingTransaction> {
        let data = abi::encode_call(JOIN_GAME, &[]);
        self.signer()?
            .send_transaction(self.address, &data, value)
            .await
    }

    fn signer(&self) -> Result<&SignerHandle> {
        self.handle
            .signer()
            .ok_or_else(|| DappError::wallet("a signing handle is required to send transactions"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeWallet;
    use crate::wallet::{ConfirmationPolicy, ProviderHandle};
    use std::sync::Arc;

    fn read_only(wallet: Arc<FakeWallet>) -> Handle {
        Handle::ReadOnly(ProviderHandle::new(
            wallet,
            80001,
            ConfirmationPolicy::default(),
        ))
    }

    #[tokio::test]
    async fn test_reads() {
        let wallet = Arc::new(FakeWallet::new());
        wallet.state.lock().game_started = true;
        let contract = RandomGameContract::new(FakeWallet::contract(), read_only(wallet));

        assert!(contract.game_started().await.unwrap());
        assert_eq!(contract.owner().await.unwrap(), FakeWallet::owner());
    }

    #[tokio::test]
    async fn test_writes_need_signer() {
        let wallet = Arc::new(FakeWallet::new());
        let contract = RandomGameContract::new(FakeWallet::contract(), read_only(wallet.clone()));

        assert!(matches!(
            contract.join_game(1).await,
            Err(DappError::Wallet(_))
        ));
        assert!(wallet.state.lock().sent.is_empty());
    }

    #[tokio::test]
    async fn test_join_carries_entry_fee() {
        let wallet = Arc::new(FakeWallet::new());
        let provider = ProviderHandle::new(wallet.clone(), 80001, ConfirmationPolicy::default());
        let handle = Handle::Signer(SignerHandle::new(provider, FakeWallet::player()));
        let contract = RandomGameContract::new(FakeWallet::contract(), handle);

        contract.join_game(10_000_000_000_000_000).await.unwrap();

        let state = wallet.state.lock();
        let tx = &state.sent[0];
        assert_eq!(tx["value"], "0x2386f26fc10000");
        assert_eq!(
            tx["data"],
            format!("0x{}", hex::encode(abi::selector(JOIN_GAME)))
        );
        assert_eq!(tx["to"], FakeWallet::contract().to_string());
    }
}
