use crate::commands::App;
use clap::Subcommand;
use comfy_table::{presets::UTF8_FULL, Table};
use random_winner_core::{format_ether, parse_ether, Control, GameView, Result, ViewEvent};
use std::future::Future;
use tokio::sync::watch;

#[derive(Subcommand)]
pub enum GameCommands {
    /// Show the current game once
    Status,
    /// Follow the game, printing updates until Ctrl-C
    Watch,
    /// Start a new game (contract owner only)
    Start {
        /// Number of players needed before a winner is chosen
        #[arg(short, long)]
        max_players: u8,
        /// Entry fee in ETH
        #[arg(short, long)]
        entry_fee: String,
    },
    /// Join the running game, paying its entry fee
    Join,
}

pub async fn handle_game_command(cmd: GameCommands, app: &App) -> Result<()> {
    match cmd {
        GameCommands::Status => {
            app.connect().await?;
            resolve_owner(app).await;

            app.view_sync()?.tick().await?;
            print_view(&app.store.snapshot());
        }

        GameCommands::Watch => {
            app.connect().await?;
            resolve_owner(app).await;

            let handle = app.view_sync()?.spawn();
            let rx = app.store.subscribe();
            let interrupted = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::warn!("Could not listen for Ctrl-C: {}", e);
                }
            };

            println!("Watching game state (Ctrl-C to stop)...");
            if follow_view(rx, interrupted, render_update).await == WatchEnd::Disconnected {
                println!("Wallet disconnected.");
            }

            handle.stop().await;
            let transition = app.session.disconnect();
            app.store.dispatch(ViewEvent::Session(transition));
        }

        GameCommands::Start {
            max_players,
            entry_fee,
        } => {
            let entry_fee = parse_ether(&entry_fee)?;
            app.connect().await?;

            let actions = app.actions();
            let is_owner = actions.check_owner().await.unwrap_or(false);
            if !is_owner
                && !app.confirm("You are not the contract owner; the transaction will likely revert. Submit anyway?")?
            {
                println!("Start cancelled.");
                return Ok(());
            }

            println!(
                "Starting game for {} players at {} ETH...",
                max_players,
                format_ether(entry_fee)
            );
            let receipt = actions.start_game(max_players, entry_fee).await?;
            println!("Game started! 🚀");
            println!("  Transaction: {}", receipt.tx_hash);
            println!("  Block: {}", receipt.block_number);
        }

        GameCommands::Join => {
            app.connect().await?;
            app.view_sync()?.tick().await?;

            let view = app.store.snapshot();
            match view.control() {
                Control::Join { entry_fee } => {
                    let game_id = view.game_id.as_deref().unwrap_or("?");
                    let prompt = format!(
                        "Join game {} for {} ETH?",
                        game_id,
                        format_ether(entry_fee)
                    );
                    if !app.confirm(&prompt)? {
                        println!("Join cancelled.");
                        return Ok(());
                    }

                    let receipt = app.actions().join_game(entry_fee).await?;
                    println!("Joined game {}! 🏃‍♂️", game_id);
                    println!("  Transaction: {}", receipt.tx_hash);
                }
                Control::ChoosingWinner => {
                    println!("Game is full, a winner is being chosen.");
                }
                _ => {
                    println!("No game is running. Waiting for host to start a new game…");
                }
            }
        }
    }

    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum WatchEnd {
    Interrupted,
    Disconnected,
}

/// Render every view change until `stop` resolves or the session ends.
/// `stop` is created once, so a signal between two updates is not lost.
async fn follow_view<F>(
    mut rx: watch::Receiver<GameView>,
    stop: F,
    mut render: impl FnMut(&GameView, &GameView),
) -> WatchEnd
where
    F: Future<Output = ()>,
{
    tokio::pin!(stop);
    let mut shown = GameView::default();

    loop {
        tokio::select! {
            _ = &mut stop => return WatchEnd::Interrupted,
            changed = rx.changed() => {
                if changed.is_err() {
                    return WatchEnd::Disconnected;
                }
                let view = rx.borrow_and_update().clone();
                if !view.connected {
                    return WatchEnd::Disconnected;
                }
                render(&shown, &view);
                shown = view;
            }
        }
    }
}

fn render_update(shown: &GameView, view: &GameView) {
    if view.logs != shown.logs || view.game_started != shown.game_started {
        println!();
        print_view(view);
    } else if view.last_error != shown.last_error {
        if let Some(error) = &view.last_error {
            eprintln!("Update failed: {}", error);
        }
    }
}

/// Owner status only changes which actions are offered; failures are not
/// fatal.
async fn resolve_owner(app: &App) {
    if let Err(e) = app.actions().check_owner().await {
        tracing::warn!("Could not determine contract owner: {}", e);
    }
}

fn print_view(view: &GameView) {
    for line in &view.logs {
        println!("{}", line);
    }

    if view.game_started && !view.players.is_empty() {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec!["#", "Player"]);
        for (i, player) in view.players.iter().enumerate() {
            table.add_row(vec![(i + 1).to_string(), player.clone()]);
        }
        println!("{}", table);
    }

    if view.game_started {
        println!(
            "  Entry fee: {} ETH, players: {}/{}",
            format_ether(view.entry_fee),
            view.players.len(),
            view.max_players
        );
    }
    if let Some(updated_at) = view.updated_at {
        println!("  Updated: {}", updated_at.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    println!("  Next: {}", describe_control(view.control()));
}

fn describe_control(control: Control) -> String {
    match control {
        Control::Connect => "Connect your wallet".to_string(),
        Control::Loading => "Loading…".to_string(),
        Control::ChoosingWinner => "Choosing Winner...".to_string(),
        Control::Join { entry_fee } => format!(
            "Join Game 🚀 (random-winner game join, {} ETH)",
            format_ether(entry_fee)
        ),
        Control::StartGame => {
            "Start Game 🚀 (random-winner game start --max-players <N> --entry-fee <ETH>)"
                .to_string()
        }
        Control::Waiting => "Waiting for host to start new game…".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use random_winner_core::{Address, SessionTransition, ViewStore};
    use tokio::sync::oneshot;

    fn connected_store() -> ViewStore {
        let store = ViewStore::new();
        let account: Address = "0x00000000000000000000000000000000000000aa".parse().unwrap();
        store.dispatch(ViewEvent::Connected { account });
        store
    }

    #[tokio::test]
    async fn test_follow_stops_on_earlier_interrupt() {
        let store = connected_store();
        let (tx, rx_stop) = oneshot::channel::<()>();
        // Fired before the loop first waits.
        tx.send(()).unwrap();

        let mut renders = 0;
        let end = follow_view(
            store.subscribe(),
            async {
                let _ = rx_stop.await;
            },
            |_, _| renders += 1,
        )
        .await;

        assert_eq!(end, WatchEnd::Interrupted);
        assert_eq!(renders, 0);
    }

    #[tokio::test]
    async fn test_follow_renders_until_disconnect() {
        let store = connected_store();
        let rx = store.subscribe();
        store.dispatch(ViewEvent::ActionStarted);

        let feeder = store.clone();
        let disconnect = tokio::spawn(async move {
            tokio::task::yield_now().await;
            feeder.dispatch(ViewEvent::Session(SessionTransition::Disconnected));
        });

        let mut seen = Vec::new();
        let end = follow_view(rx, std::future::pending::<()>(), |_, view| {
            seen.push(view.loading)
        })
        .await;
        disconnect.await.unwrap();

        assert_eq!(end, WatchEnd::Disconnected);
        assert_eq!(seen, vec![true]);
    }

    #[test]
    fn test_describe_control() {
        assert_eq!(
            describe_control(Control::Join {
                entry_fee: 10_000_000_000_000_000
            }),
            "Join Game 🚀 (random-winner game join, 0.01 ETH)"
        );
        assert_eq!(describe_control(Control::ChoosingWinner), "Choosing Winner...");
    }
}
