//! Random Winner Game client - core library
//!
//! Wallet session handling, typed calls against the game contract, the
//! subgraph query helper, and the view state kept in sync with both sources.

pub mod config;
pub mod contract;
pub mod error;
pub mod game;
pub mod subgraph;
pub mod types;
pub mod wallet;

#[cfg(test)]
mod testing;

pub use config::DappConfig;
pub use contract::RandomGameContract;
pub use error::{DappError, Result};
pub use game::{Control, GameActions, GameSnapshot, GameView, ViewEvent, ViewStore, ViewSync};
pub use subgraph::{GameIndex, GameRecord, SubgraphClient};
pub use types::{format_ether, parse_ether, Address, TxReceipt};
pub use wallet::{SessionManager, SessionState, SessionTransition};
