mod commands;
mod config;

use clap::{Parser, Subcommand};
use commands::App;
use config::CliConfig;
use random_winner_core::DappError;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "random-winner")]
#[command(about = "Random Winner Game - a lottery where a random player wins the whole pool")]
#[command(version)]
struct Cli {
    /// Config file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Wallet JSON-RPC endpoint
    #[arg(long, global = true)]
    rpc_url: Option<String>,

    /// Subgraph endpoint
    #[arg(long, global = true)]
    subgraph_url: Option<String>,

    /// Game contract address
    #[arg(long, global = true)]
    contract: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Answer yes to confirmation prompts
    #[arg(short, long, global = true)]
    yes: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Wallet connection commands
    #[command(subcommand)]
    Wallet(commands::WalletCommands),

    /// Game commands
    #[command(subcommand)]
    Game(commands::GameCommands),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = CliConfig::load(cli.config.as_deref()).await?;
    config.apply_overrides(cli.rpc_url, cli.subgraph_url, cli.contract.as_deref())?;

    // Initialize logging
    let log_level = if cli.verbose || config.verbose {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "random_winner={},random_winner_core={}",
            log_level, log_level
        )))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let result = match App::new(config.dapp, cli.yes) {
        Ok(app) => match cli.command {
            Commands::Wallet(cmd) => commands::handle_wallet_command(cmd, &app).await,
            Commands::Game(cmd) => commands::handle_game_command(cmd, &app).await,
        },
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        for line in error_report(&e) {
            eprintln!("{}", line);
        }
        std::process::exit(1);
    }

    Ok(())
}

/// The error line plus a hint for the failures a user can fix.
fn error_report(e: &DappError) -> Vec<String> {
    match e {
        DappError::WrongNetwork { expected, actual } => vec![
            format!("Error: wallet is on chain {}", actual),
            format!("Switch your wallet to chain {} and try again", expected),
        ],
        e if e.is_user_rejection() => vec!["Error: request rejected in wallet".to_string()],
        e if e.is_session_error() => vec![
            format!("Error: {}", e),
            "Unlock your wallet, approve the connection and try again".to_string(),
        ],
        DappError::MissingContract => vec![
            format!("Error: {}", e),
            format!(
                "Pass --contract or set contract_address in {}",
                CliConfig::default_path().display()
            ),
        ],
        DappError::Transport(e) => vec![format!(
            "Error: could not reach the wallet provider: {}",
            e
        )],
        _ => vec![format!("Error: {}", e)],
    }
}
