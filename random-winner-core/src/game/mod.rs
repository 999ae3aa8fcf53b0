//! View state of the game page and the reducer every update goes through.

pub mod actions;
pub mod sync;

pub use actions::GameActions;
pub use sync::{SyncHandle, ViewSync};

use crate::subgraph::GameRecord;
use crate::types::Address;
use crate::wallet::SessionTransition;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;

/// One consistent read of both sources. The contract flag is authoritative
/// for `game_started`; the record only annotates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSnapshot {
    pub game_started: bool,
    pub record: GameRecord,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameView {
    pub connected: bool,
    pub account: Option<Address>,
    pub loading: bool,
    pub is_owner: bool,
    pub game_started: bool,
    pub game_id: Option<String>,
    /// Wei.
    pub entry_fee: u128,
    pub max_players: u64,
    pub players: Vec<String>,
    pub winner: Option<String>,
    pub logs: Vec<String>,
    /// Sequence number of the newest applied poll.
    pub last_tick: u64,
    pub last_error: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub enum ViewEvent {
    Connected { account: Address },
    Session(SessionTransition),
    OwnerResolved { is_owner: bool },
    TickCompleted { seq: u64, snapshot: GameSnapshot },
    TickFailed { seq: u64, reason: String },
    ActionStarted,
    ActionFinished { error: Option<String> },
}

/// What the page offers the user next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Connect,
    Loading,
    ChoosingWinner,
    Join { entry_fee: u128 },
    StartGame,
    Waiting,
}

impl GameView {
    /// Apply one transition. Returns whether the view changed.
    pub fn apply(&mut self, event: ViewEvent) -> bool {
        match event {
            ViewEvent::Connected { account } => {
                self.connected = true;
                self.account = Some(account);
                self.last_error = None;
                true
            }
            ViewEvent::Session(SessionTransition::Unchanged) => false,
            ViewEvent::Session(SessionTransition::AccountChanged { current, .. }) => {
                self.account = Some(current);
                self.is_owner = false;
                true
            }
            ViewEvent::Session(SessionTransition::Disconnected) => {
                // Sequence numbers keep counting across sessions so a poll
                // started before the reset can never land after it.
                *self = GameView {
                    last_tick: self.last_tick,
                    ..GameView::default()
                };
                true
            }
            ViewEvent::OwnerResolved { is_owner } => {
                let changed = self.is_owner != is_owner;
                self.is_owner = is_owner;
                changed
            }
            ViewEvent::TickCompleted { seq, snapshot } => {
                if !self.connected {
                    tracing::debug!("Ignoring poll {} for a disconnected session", seq);
                    return false;
                }
                if seq <= self.last_tick {
                    tracing::warn!(
                        "Discarding stale poll {} (newest applied is {})",
                        seq,
                        self.last_tick
                    );
                    return false;
                }
                self.apply_snapshot(snapshot);
                self.last_tick = seq;
                self.last_error = None;
                self.updated_at = Some(Utc::now());
                true
            }
            ViewEvent::TickFailed { seq, reason } => {
                // Prior state stays in place.
                if seq <= self.last_tick {
                    return false;
                }
                self.last_error = Some(reason);
                true
            }
            ViewEvent::ActionStarted => {
                self.loading = true;
                self.last_error = None;
                true
            }
            ViewEvent::ActionFinished { error } => {
                self.loading = false;
                self.last_error = error;
                true
            }
        }
    }

    fn apply_snapshot(&mut self, snapshot: GameSnapshot) {
        let GameSnapshot {
            game_started,
            record,
        } = snapshot;

        let mut logs = Vec::new();
        if game_started {
            logs = started_logs(&record);
            self.entry_fee = record.entry_fee;
            self.max_players = record.max_players;
        } else if let Some(winner) = record.winner() {
            logs = ended_logs(&record.id, winner);
            self.winner = Some(winner.to_string());
        }

        self.logs = logs;
        self.game_id = Some(record.id);
        self.players = record.players;
        self.game_started = game_started;
    }

    pub fn control(&self) -> Control {
        if !self.connected {
            return Control::Connect;
        }
        if self.loading {
            return Control::Loading;
        }
        if self.game_started {
            if self.players.len() as u64 == self.max_players {
                return Control::ChoosingWinner;
            }
            return Control::Join {
                entry_fee: self.entry_fee,
            };
        }
        if self.is_owner {
            return Control::StartGame;
        }
        Control::Waiting
    }
}

fn started_logs(record: &GameRecord) -> Vec<String> {
    let mut logs = vec![format!("Game has started with ID: {}", record.id)];
    if !record.players.is_empty() {
        logs.push(format!(
            "{}/{} already joined 👀",
            record.players.len(),
            record.max_players
        ));
        logs.extend(
            record
                .players
                .iter()
                .map(|player| format!("{} joined 🏃‍♂️", player)),
        );
    }
    logs
}

fn ended_logs(game_id: &str, winner: &str) -> Vec<String> {
    vec![
        format!("Last game has ended with ID: {}", game_id),
        format!("Winner is: {} 🎉", winner),
        "Waiting for host to start new game…".to_string(),
    ]
}

/// Shared view state. All writes go through [`ViewStore::dispatch`];
/// readers subscribe for changes.
#[derive(Clone)]
pub struct ViewStore {
    tx: Arc<watch::Sender<GameView>>,
}

impl Default for ViewStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(GameView::default());
        Self { tx: Arc::new(tx) }
    }

    pub fn dispatch(&self, event: ViewEvent) -> bool {
        self.tx.send_if_modified(|view| view.apply(event))
    }

    pub fn snapshot(&self) -> GameView {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<GameView> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, max_players: u64, players: &[&str], winner: Option<&str>) -> GameRecord {
        GameRecord {
            id: id.to_string(),
            entry_fee: 1_000_000_000_000_000_000,
            max_players,
            players: players.iter().map(|p| p.to_string()).collect(),
            winner: winner.map(str::to_string),
        }
    }

    fn connected_view() -> GameView {
        let mut view = GameView::default();
        view.apply(ViewEvent::Connected {
            account: "0x1111111111111111111111111111111111111111".parse().unwrap(),
        });
        view
    }

    fn tick(view: &mut GameView, seq: u64, game_started: bool, record: GameRecord) -> bool {
        view.apply(ViewEvent::TickCompleted {
            seq,
            snapshot: GameSnapshot {
                game_started,
                record,
            },
        })
    }

    #[test]
    fn test_started_game_logs() {
        let mut view = connected_view();
        tick(&mut view, 1, true, record("1", 4, &["0xAA", "0xBB"], None));

        assert_eq!(
            view.logs,
            vec![
                "Game has started with ID: 1",
                "2/4 already joined 👀",
                "0xAA joined 🏃‍♂️",
                "0xBB joined 🏃‍♂️",
            ]
        );
        assert_eq!(view.entry_fee, 1_000_000_000_000_000_000);
        assert_eq!(crate::types::format_ether(view.entry_fee), "1");
        assert_eq!(view.max_players, 4);
        assert!(view.game_started);
        assert_eq!(view.players, vec!["0xAA", "0xBB"]);
    }

    #[test]
    fn test_started_game_without_players() {
        let mut view = connected_view();
        tick(&mut view, 1, true, record("7", 3, &[], None));
        assert_eq!(view.logs, vec!["Game has started with ID: 7"]);
    }

    #[test]
    fn test_ended_game_logs() {
        let mut view = connected_view();
        tick(&mut view, 1, false, record("2", 2, &["0xCC", "0xDD"], Some("0xCC")));

        assert_eq!(view.logs.len(), 3);
        assert!(view.logs[0].contains('2'));
        assert!(view.logs[1].contains("0xCC"));
        assert_eq!(view.winner.as_deref(), Some("0xCC"));
        assert!(!view.game_started);
        assert_eq!(view.players, vec!["0xCC", "0xDD"]);
    }

    #[test]
    fn test_idle_tick_keeps_fields_and_clears_logs() {
        let mut view = connected_view();
        tick(&mut view, 1, true, record("1", 4, &["0xAA"], None));
        tick(&mut view, 2, false, record("1", 9, &[], None));

        assert!(view.logs.is_empty());
        assert_eq!(view.max_players, 4);
        assert_eq!(view.entry_fee, 1_000_000_000_000_000_000);
        assert!(view.players.is_empty());
        assert!(!view.game_started);
    }

    #[test]
    fn test_stale_tick_discarded() {
        let mut view = connected_view();
        assert!(tick(&mut view, 5, true, record("5", 4, &[], None)));
        assert!(!tick(&mut view, 4, false, record("4", 4, &[], Some("0xEE"))));

        assert_eq!(view.game_id.as_deref(), Some("5"));
        assert_eq!(view.last_tick, 5);
        assert!(view.winner.is_none());
    }

    #[test]
    fn test_failed_tick_keeps_state() {
        let mut view = connected_view();
        tick(&mut view, 1, true, record("1", 4, &["0xAA"], None));
        let before = view.logs.clone();

        assert!(view.apply(ViewEvent::TickFailed {
            seq: 2,
            reason: "subgraph down".to_string(),
        }));
        assert_eq!(view.logs, before);
        assert_eq!(view.last_error.as_deref(), Some("subgraph down"));
    }

    #[test]
    fn test_full_game_shows_choosing_winner() {
        let mut view = connected_view();
        tick(&mut view, 1, true, record("1", 2, &["0xAA", "0xBB"], None));
        view.is_owner = true;
        assert_eq!(view.control(), Control::ChoosingWinner);

        tick(&mut view, 2, true, record("1", 2, &["0xAA"], None));
        assert_eq!(
            view.control(),
            Control::Join {
                entry_fee: 1_000_000_000_000_000_000
            }
        );
    }

    #[test]
    fn test_control_precedence() {
        let mut view = GameView::default();
        assert_eq!(view.control(), Control::Connect);

        view = connected_view();
        assert_eq!(view.control(), Control::Waiting);

        view.apply(ViewEvent::OwnerResolved { is_owner: true });
        assert_eq!(view.control(), Control::StartGame);

        view.apply(ViewEvent::ActionStarted);
        assert_eq!(view.control(), Control::Loading);

        view.apply(ViewEvent::ActionFinished {
            error: Some("rejected".to_string()),
        });
        assert_eq!(view.control(), Control::StartGame);
        assert_eq!(view.last_error.as_deref(), Some("rejected"));
    }

    #[test]
    fn test_session_transitions() {
        let mut view = connected_view();
        view.apply(ViewEvent::OwnerResolved { is_owner: true });

        let current: Address = "0x2222222222222222222222222222222222222222".parse().unwrap();
        view.apply(ViewEvent::Session(SessionTransition::AccountChanged {
            previous: view.account.unwrap(),
            current,
        }));
        assert!(!view.is_owner);
        assert_eq!(view.account, Some(current));

        assert!(!view.apply(ViewEvent::Session(SessionTransition::Unchanged)));

        view.apply(ViewEvent::Session(SessionTransition::Disconnected));
        assert_eq!(view, GameView::default());
    }

    #[test]
    fn test_disconnect_keeps_tick_guard() {
        let mut view = connected_view();
        tick(&mut view, 3, true, record("3", 4, &["0xAA"], None));

        view.apply(ViewEvent::Session(SessionTransition::Disconnected));
        assert_eq!(view.last_tick, 3);
        assert!(view.logs.is_empty());

        // A poll that was still running when the session ended.
        assert!(!tick(&mut view, 4, true, record("3", 4, &["0xAA"], None)));
        assert!(!view.game_started);
        assert!(view.players.is_empty());

        // After reconnecting, older polls are still rejected.
        view.apply(ViewEvent::Connected {
            account: "0x1111111111111111111111111111111111111111".parse().unwrap(),
        });
        assert!(!tick(&mut view, 2, true, record("2", 4, &[], None)));
        assert!(tick(&mut view, 5, true, record("5", 4, &[], None)));
        assert_eq!(view.game_id.as_deref(), Some("5"));
    }

    #[tokio::test]
    async fn test_store_notifies_subscribers() {
        let store = ViewStore::new();
        let mut rx = store.subscribe();

        assert!(store.dispatch(ViewEvent::ActionStarted));
        rx.changed().await.unwrap();
        assert!(rx.borrow().loading);

        assert!(!store.dispatch(ViewEvent::Session(SessionTransition::Unchanged)));
        assert!(!rx.has_changed().unwrap());
    }
}
