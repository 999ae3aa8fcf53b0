use crate::commands::App;
use clap::Subcommand;
use random_winner_core::wallet::{network_name, Handle};
use random_winner_core::{RandomGameContract, Result};

#[derive(Subcommand)]
pub enum WalletCommands {
    /// Connect the wallet and show the active account
    Connect,
    /// Show the game contract owner and whether it is the connected account
    Owner,
}

pub async fn handle_wallet_command(cmd: WalletCommands, app: &App) -> Result<()> {
    match cmd {
        WalletCommands::Connect => {
            let account = app.connect().await?;
            let provider = app.session.provider().await?;

            println!("Wallet:");
            println!("  Account: {}", account);
            println!(
                "  Network: {} (chain id {})",
                network_name(provider.chain_id()),
                provider.chain_id()
            );
            println!("  Wallet RPC: {}", app.config.rpc_url);
        }

        WalletCommands::Owner => {
            let account = app.connect().await?;
            let provider = app.session.provider().await?;
            let owner = RandomGameContract::new(app.contract, Handle::ReadOnly(provider))
                .owner()
                .await?;
            let is_owner = app.actions().check_owner().await?;

            println!("Contract: {}", app.contract);
            println!("  Owner: {}", owner);
            println!("  You:   {}", account);
            if is_owner {
                println!("  Status: ✅ You can start games");
            } else {
                println!("  Status: Only the owner can start games");
            }
        }
    }

    Ok(())
}
