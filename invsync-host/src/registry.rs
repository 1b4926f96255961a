//! Live inventories of online players.
//!
//! The game server owns each inventory; the registry holds a shared handle
//! so sync tasks can lock it from a worker thread.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use uuid::Uuid;

use invsync_core::types::PlayerInventory;

/// Shared handle to one player's live inventory.
pub type InventoryHandle = Arc<Mutex<PlayerInventory>>;

/// Online players keyed by UUID.
#[derive(Debug, Default)]
pub struct OnlinePlayers {
    inventories: DashMap<Uuid, InventoryHandle>,
}

impl OnlinePlayers {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `player`'s inventory, replacing any earlier handle.
    pub fn register(&self, player: Uuid, inventory: InventoryHandle) {
        self.inventories.insert(player, inventory);
    }

    /// The handle for `player`, creating an empty inventory if none exists.
    pub fn get_or_create(&self, player: Uuid) -> InventoryHandle {
        Arc::clone(&self.inventories.entry(player).or_default())
    }

    /// The handle for `player`, if online.
    #[must_use]
    pub fn get(&self, player: Uuid) -> Option<InventoryHandle> {
        self.inventories.get(&player).map(|h| Arc::clone(&h))
    }

    /// Drop `player` from the registry.
    pub fn unregister(&self, player: Uuid) -> Option<InventoryHandle> {
        self.inventories.remove(&player).map(|(_, h)| h)
    }

    /// Number of online players.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inventories.len()
    }

    /// Whether nobody is online.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inventories.is_empty()
    }
}
