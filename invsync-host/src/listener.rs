//! Session listener — dispatches join/quit events to the sync layer.
//!
//! Store access blocks, so every event runs on tokio's blocking pool; the
//! game loop only awaits the result (or doesn't, when events are fed through
//! [`SessionListener::run`]).
//!
//! [`SessionListener::run`] gives each event its own task. Events for one
//! player are chained so they complete in arrival order; different players
//! never wait on each other.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use invsync_core::config::SyncConfig;
use invsync_core::sync::{JoinReport, SaveReport, SyncOrchestrator};
use invsync_core::types::PlayerIdentity;

use crate::error::HostError;
use crate::events::SessionEvent;
use crate::registry::{InventoryHandle, OnlinePlayers};

/// What handling one event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// A join was synced.
    Joined(JoinReport),
    /// A quit was saved.
    Saved(SaveReport),
    /// Sync is disabled; nothing happened.
    Skipped,
}

/// Routes session events to a [`SyncOrchestrator`].
#[derive(Debug, Clone)]
pub struct SessionListener {
    sync: Arc<SyncOrchestrator>,
    players: Arc<OnlinePlayers>,
    enabled: bool,
}

impl SessionListener {
    /// Create a listener. With `enabled` false every event is skipped.
    #[must_use]
    pub fn new(sync: Arc<SyncOrchestrator>, players: Arc<OnlinePlayers>, enabled: bool) -> Self {
        Self {
            sync,
            players,
            enabled,
        }
    }

    /// Create a listener that honours `general.enabled` from `config`.
    #[must_use]
    pub fn from_config(sync: Arc<SyncOrchestrator>, players: Arc<OnlinePlayers>, config: &SyncConfig) -> Self {
        Self::new(sync, players, config.general.enabled)
    }

    /// Whether events are synced at all.
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// The orchestrator events are routed to.
    #[must_use]
    pub fn sync(&self) -> &Arc<SyncOrchestrator> {
        &self.sync
    }

    /// The online-player registry.
    #[must_use]
    pub fn players(&self) -> &Arc<OnlinePlayers> {
        &self.players
    }

    /// Handle one event to completion.
    ///
    /// A join registers an empty inventory before loading. If the load
    /// fails that empty inventory stays registered, and the player's quit
    /// will save it over whatever snapshot the store still holds. Hosts
    /// that want to keep the stored snapshot should kick the player when a
    /// join returns an error.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::NotOnline`] for a quit with no registered
    /// inventory, or the sync/task error.
    pub async fn handle(&self, event: SessionEvent) -> Result<EventOutcome, HostError> {
        if !self.enabled {
            return Ok(EventOutcome::Skipped);
        }
        match event {
            SessionEvent::Joined { identity } => {
                let inventory = self.players.get_or_create(identity.id);
                self.join(identity, inventory).await.map(EventOutcome::Joined)
            }
            SessionEvent::Quit { identity } => {
                let inventory = self
                    .players
                    .get(identity.id)
                    .ok_or(HostError::NotOnline(identity.id))?;
                let id = identity.id;
                let result = self.quit(identity, inventory).await;
                // The player is gone whether or not the save landed.
                self.players.unregister(id);
                result.map(EventOutcome::Saved)
            }
        }
    }

    async fn join(&self, identity: PlayerIdentity, inventory: InventoryHandle) -> Result<JoinReport, HostError> {
        let sync = Arc::clone(&self.sync);
        let report = tokio::task::spawn_blocking(move || {
            let mut inv = inventory.lock();
            sync.on_session_start(&identity, &mut *inv)
        })
        .await??;
        Ok(report)
    }

    async fn quit(&self, identity: PlayerIdentity, inventory: InventoryHandle) -> Result<SaveReport, HostError> {
        let sync = Arc::clone(&self.sync);
        let report = tokio::task::spawn_blocking(move || {
            let inv = inventory.lock();
            sync.on_session_end(&identity, &*inv)
        })
        .await??;
        Ok(report)
    }

    /// Consume events until the channel closes, then wait for the events
    /// still in flight. Failures are logged, never propagated, so one bad
    /// player cannot stall the rest.
    pub async fn run(self, mut events: mpsc::Receiver<SessionEvent>) {
        info!("Session listener started");
        // Last task spawned per player; the next event for that player waits on it.
        let mut tails: HashMap<Uuid, JoinHandle<()>> = HashMap::new();
        while let Some(event) = events.recv().await {
            tails.retain(|_, task| !task.is_finished());
            let player = event.identity().id;
            let previous = tails.remove(&player);
            let listener = self.clone();
            let task = tokio::spawn(async move {
                if let Some(previous) = previous {
                    if let Err(e) = previous.await {
                        error!(%player, error = %e, "Earlier session task failed");
                    }
                }
                listener.dispatch(event).await;
            });
            tails.insert(player, task);
        }
        for (player, task) in tails {
            if let Err(e) = task.await {
                error!(%player, error = %e, "Session task failed");
            }
        }
        info!("Session listener stopped");
    }

    /// Handle one event and log the outcome.
    async fn dispatch(&self, event: SessionEvent) {
        let kind = event.kind();
        let player = event.identity().to_string();
        match self.handle(event).await {
            Ok(EventOutcome::Joined(report)) => {
                info!(%player, restored = report.load.restored, first_join = report.first_join_pass, "Inventory synced");
            }
            Ok(EventOutcome::Saved(report)) => {
                info!(%player, slots = report.slots, "Inventory saved");
            }
            Ok(EventOutcome::Skipped) => {}
            Err(HostError::NotOnline(id)) => {
                warn!(%player, %id, "Quit for unknown player ignored");
            }
            Err(e) => {
                error!(%player, event = kind, error = %e, "Inventory sync failed");
            }
        }
    }
}
