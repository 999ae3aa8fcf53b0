use crate::contract::RandomGameContract;
use crate::error::{DappError, Result};
use crate::game::{GameSnapshot, ViewEvent, ViewStore};
use crate::subgraph::GameIndex;
use crate::types::Address;
use crate::wallet::{Handle, SessionManager, SessionTransition};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;

/// Keeps the view in step with the contract and the subgraph.
pub struct ViewSync {
    session: Arc<SessionManager>,
    index: Arc<dyn GameIndex>,
    contract: Address,
    store: ViewStore,
    interval: Duration,
    next_seq: AtomicU64,
}

impl ViewSync {
    pub fn new(
        session: Arc<SessionManager>,
        index: Arc<dyn GameIndex>,
        contract: Address,
        store: ViewStore,
        interval: Duration,
    ) -> Self {
        Self {
            session,
            index,
            contract,
            store,
            interval,
            next_seq: AtomicU64::new(0),
        }
    }

    pub fn store(&self) -> &ViewStore {
        &self.store
    }

    /// Read both sources once.
    pub async fn fetch_snapshot(&self) -> Result<GameSnapshot> {
        let transition = self.session.refresh().await?;
        if transition != SessionTransition::Unchanged {
            self.store.dispatch(ViewEvent::Session(transition.clone()));
        }

        let provider = self.session.provider().await?;
        let contract = RandomGameContract::new(self.contract, Handle::ReadOnly(provider));

        if let SessionTransition::AccountChanged { current, .. } = transition {
            match contract.owner().await {
                Ok(owner) => {
                    self.store.dispatch(ViewEvent::OwnerResolved {
                        is_owner: current == owner,
                    });
                }
                Err(e) => tracing::warn!("Could not re-check contract owner for {}: {}", current, e),
            }
        }

        let (game_started, record) =
            tokio::try_join!(contract.game_started(), self.index.latest_game())?;
        let record = record.ok_or(DappError::NoGameRecord)?;

        Ok(GameSnapshot {
            game_started,
            record,
        })
    }

    /// One poll. The result is applied only if no newer poll has landed.
    pub async fn tick(&self) -> Result<()> {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!("Polling game state (tick {})", seq);

        match self.fetch_snapshot().await {
            Ok(snapshot) => {
                self.store
                    .dispatch(ViewEvent::TickCompleted { seq, snapshot });
                Ok(())
            }
            Err(e) => {
                tracing::error!("Game state poll {} failed: {}", seq, e);
                self.store.dispatch(ViewEvent::TickFailed {
                    seq,
                    reason: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Poll on the configured interval, starting now, until stopped or until
    /// the session is no longer connected.
    pub fn spawn(self: Arc<Self>) -> SyncHandle {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(self.run(shutdown_rx));
        SyncHandle {
            shutdown: Some(shutdown_tx),
            task,
        }
    }

    async fn run(self: Arc<Self>, mut shutdown: oneshot::Receiver<()>) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut in_flight = JoinSet::new();

        tracing::info!("Starting game view sync every {:?}", self.interval);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Stopping game view sync");
                    break;
                }
                _ = interval.tick() => {
                    if !self.session.is_connected() {
                        tracing::info!("Session ended, stopping game view sync");
                        break;
                    }
                    let sync = self.clone();
                    in_flight.spawn(async move {
                        // Failures are already recorded in the view.
                        let _ = sync.tick().await;
                    });
                }
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    if let Err(e) = joined {
                        if e.is_panic() {
                            tracing::error!("Game state poll panicked: {}", e);
                        }
                    }
                }
            }
        }

        // Results from ticks still in flight must not land after teardown.
        in_flight.abort_all();
        while in_flight.join_next().await.is_some() {}
    }
}

pub struct SyncHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl SyncHandle {
    /// Stop polling and wait for in-flight ticks to be cancelled.
    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Err(e) = (&mut self.task).await {
            tracing::error!("Game view sync task failed: {}", e);
        }
    }

    /// Wait for the loop to end on its own (session ended).
    pub async fn finished(mut self) {
        if let Err(e) = (&mut self.task).await {
            tracing::error!("Game view sync task failed: {}", e);
        }
    }
}
