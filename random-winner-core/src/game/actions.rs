use crate::contract::RandomGameContract;
use crate::error::{DappError, Result};
use crate::game::{ViewEvent, ViewStore};
use crate::types::{format_ether, Address, TxReceipt};
use crate::wallet::{Handle, PendingTransaction, SessionManager};
use std::future::Future;
use std::sync::Arc;

/// State-changing calls and the owner check, each reported to the view.
pub struct GameActions {
    session: Arc<SessionManager>,
    contract: Address,
    store: ViewStore,
}

impl GameActions {
    pub fn new(session: Arc<SessionManager>, contract: Address, store: ViewStore) -> Self {
        Self {
            session,
            contract,
            store,
        }
    }

    /// Start a new game. Only the contract owner can; the `is_owner` flag in
    /// the view is advisory.
    pub async fn start_game(&self, max_players: u8, entry_fee: u128) -> Result<TxReceipt> {
        if max_players == 0 {
            return Err(DappError::transaction("max players must be greater than zero"));
        }
        tracing::info!(
            "Starting game for {} players at {} ETH",
            max_players,
            format_ether(entry_fee)
        );
        self.dispatch_tx("startGame", move |contract| async move {
            contract.start_game(max_players, entry_fee).await
        })
        .await
    }

    /// Join the running game paying `entry_fee` wei.
    pub async fn join_game(&self, entry_fee: u128) -> Result<TxReceipt> {
        tracing::info!("Joining game with {} ETH", format_ether(entry_fee));
        self.dispatch_tx("joinGame", move |contract| async move {
            contract.join_game(entry_fee).await
        })
        .await
    }

    /// Compare the contract owner with the connected account and record the
    /// result in the view.
    pub async fn check_owner(&self) -> Result<bool> {
        let result = async {
            let account = self.session.account().ok_or(DappError::NotConnected)?;
            let provider = self.session.provider().await?;
            let owner = RandomGameContract::new(self.contract, Handle::ReadOnly(provider))
                .owner()
                .await?;
            Ok::<_, DappError>(account.matches(&owner.to_string()))
        }
        .await;

        match result {
            Ok(is_owner) => {
                self.store.dispatch(ViewEvent::OwnerResolved { is_owner });
                Ok(is_owner)
            }
            Err(e) => {
                tracing::error!("Failed to read contract owner: {}", e);
                Err(e)
            }
        }
    }

    /// loading → signer → contract → submit → wait for mining → done.
    async fn dispatch_tx<F, Fut>(&self, label: &str, submit: F) -> Result<TxReceipt>
    where
        F: FnOnce(RandomGameContract) -> Fut,
        Fut: Future<Output = Result<PendingTransaction>>,
    {
        self.store.dispatch(ViewEvent::ActionStarted);

        let result = async {
            let signer = self.session.signer().await?;
            let contract = RandomGameContract::new(self.contract, Handle::Signer(signer));
            let pending = submit(contract).await?;
            tracing::info!("{} submitted as {}", label, pending.tx_hash());
            pending.wait().await
        }
        .await;

        match &result {
            Ok(receipt) => tracing::info!("{} confirmed: {}", label, receipt.tx_hash),
            Err(e) if e.is_user_rejection() => tracing::warn!("{} rejected in wallet", label),
            Err(e) => tracing::error!("{} failed: {}", label, e),
        }

        self.store.dispatch(ViewEvent::ActionFinished {
            error: result.as_ref().err().map(|e| e.to_string()),
        });
        result
    }
}
