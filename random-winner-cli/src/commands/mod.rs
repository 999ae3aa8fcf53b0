pub mod game;
pub mod wallet;

pub use game::{handle_game_command, GameCommands};
pub use wallet::{handle_wallet_command, WalletCommands};

use dialoguer::Confirm;
use random_winner_core::wallet::{network_name, Alert};
use random_winner_core::{
    Address, DappConfig, DappError, GameActions, Result, SessionManager, SubgraphClient,
    ViewEvent, ViewStore, ViewSync,
};
use std::sync::Arc;

/// Alerts interrupt the terminal rather than only reaching the log.
pub struct TerminalAlert;

impl Alert for TerminalAlert {
    fn alert(&self, message: &str) {
        eprintln!("⚠️  {}", message);
    }
}

/// Everything a command needs: the session, the view and the config.
pub struct App {
    pub config: DappConfig,
    pub contract: Address,
    pub session: Arc<SessionManager>,
    pub store: ViewStore,
    assume_yes: bool,
}

impl App {
    pub fn new(config: DappConfig, assume_yes: bool) -> Result<Self> {
        config.validate()?;
        let contract = config.contract()?;
        let session = SessionManager::from_config(&config)?.with_alert(Arc::new(TerminalAlert));

        Ok(Self {
            config,
            contract,
            session: Arc::new(session),
            store: ViewStore::new(),
            assume_yes,
        })
    }

    pub async fn connect(&self) -> Result<Address> {
        let account = self.session.connect().await?;
        self.store.dispatch(ViewEvent::Connected { account });
        println!(
            "Connected {} on {}",
            account,
            network_name(self.session.required_chain_id())
        );
        Ok(account)
    }

    pub fn actions(&self) -> GameActions {
        GameActions::new(self.session.clone(), self.contract, self.store.clone())
    }

    pub fn view_sync(&self) -> Result<Arc<ViewSync>> {
        let index = SubgraphClient::new(self.config.subgraph_url.clone())?;
        Ok(Arc::new(ViewSync::new(
            self.session.clone(),
            Arc::new(index),
            self.contract,
            self.store.clone(),
            self.config.poll_interval(),
        )))
    }

    pub fn confirm(&self, prompt: &str) -> Result<bool> {
        if self.assume_yes {
            return Ok(true);
        }
        Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .map_err(|e| DappError::dialog(e.to_string()))
    }
}
