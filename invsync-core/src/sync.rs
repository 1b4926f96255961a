//! Session sync orchestrator — when to load, when to save, and how.
//!
//! Per player session the orchestrator walks
//! `Disconnected → Connecting → Synced → Disconnected`:
//!
//! - **join**: load the stored snapshot by UUID and write it into the live
//!   inventory. The first join handled by an orchestrator instance also
//!   stamps every item with a sentinel tag and saves immediately.
//! - **quit**: save unconditionally.
//!
//! Saves replace the identity's document through
//! [`DocumentStore::replace_one`]. All work for one UUID is serialised by a
//! per-identity lock; different players never wait on each other.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::codec::ItemCodec;
use crate::config::{SessionConfig, SyncConfig};
use crate::error::Result;
use crate::metrics::SyncCounters;
use crate::snapshot::SnapshotAssembler;
use crate::store::{self, DocumentStore, UpsertOutcome};
use crate::tag::TagValue;
use crate::types::{Inventory, ItemStack, PlayerIdentity};

/// Where a player's session is in the sync lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Not online, or the last join failed.
    #[default]
    Disconnected,
    /// Join received, snapshot being loaded.
    Connecting,
    /// Inventory restored and live.
    Synced,
}

/// Result of loading a stored snapshot into an inventory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Whether a stored document was found.
    pub found: bool,
    /// Slots written into the inventory.
    pub restored: usize,
    /// Slot fields rejected as malformed.
    pub rejected: usize,
    /// Records whose material was unknown (written as empty slots).
    pub unknown_materials: usize,
}

/// Result of a save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveReport {
    /// Whether an older document was replaced.
    pub outcome: UpsertOutcome,
    /// Occupied slots written.
    pub slots: usize,
}

/// Result of handling a join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinReport {
    /// What the load did.
    pub load: LoadReport,
    /// Whether this join ran the first-join stamp-and-save pass.
    pub first_join_pass: bool,
}

/// Drives loads and saves for player sessions.
pub struct SyncOrchestrator {
    store: Arc<dyn DocumentStore>,
    codec: ItemCodec,
    assembler: SnapshotAssembler,
    session: SessionConfig,
    /// Latched after the first-join pass succeeds. Scoped to this instance
    /// (one process lifetime), not to any player or session: only the first
    /// player to join after construction gets the pass.
    first_join_done: AtomicBool,
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
    sessions: DashMap<Uuid, SessionState>,
    counters: SyncCounters,
}

impl std::fmt::Debug for SyncOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncOrchestrator")
            .field("assembler", &self.assembler)
            .field("session", &self.session)
            .field("first_join_done", &self.first_join_done)
            .field("online", &self.sessions.len())
            .finish_non_exhaustive()
    }
}

impl SyncOrchestrator {
    /// Create an orchestrator over an open store.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, codec: ItemCodec, config: &SyncConfig) -> Self {
        Self {
            store,
            codec,
            assembler: SnapshotAssembler::new(&config.snapshot),
            session: config.session.clone(),
            first_join_done: AtomicBool::new(false),
            locks: DashMap::new(),
            sessions: DashMap::new(),
            counters: SyncCounters::new(),
        }
    }

    /// Open the configured store and build an orchestrator with the default codec.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError`](crate::SyncError) if the config is invalid or
    /// the store cannot be opened.
    pub fn from_config(config: &SyncConfig) -> Result<Self> {
        config.validate()?;
        let store = store::open_store(&config.store)?;
        Ok(Self::new(store, ItemCodec::default(), config))
    }

    /// The item codec.
    #[must_use]
    pub fn codec(&self) -> &ItemCodec {
        &self.codec
    }

    /// The snapshot assembler.
    #[must_use]
    pub fn assembler(&self) -> &SnapshotAssembler {
        &self.assembler
    }

    /// The backing store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Runtime counters.
    #[must_use]
    pub fn counters(&self) -> &SyncCounters {
        &self.counters
    }

    /// Whether this instance has already run its first-join pass.
    #[must_use]
    pub fn first_join_done(&self) -> bool {
        self.first_join_done.load(Ordering::Acquire)
    }

    /// Current lifecycle state of `player`.
    #[must_use]
    pub fn session_state(&self, player: Uuid) -> SessionState {
        self.sessions.get(&player).map(|s| *s).unwrap_or_default()
    }

    fn identity_lock(&self, player: Uuid) -> Arc<Mutex<()>> {
        Arc::clone(&self.locks.entry(player).or_default())
    }

    /// Drop the lock entry for `player` if nobody else holds it.
    fn release_lock(&self, player: Uuid) {
        self.locks.remove_if(&player, |_, lock| Arc::strong_count(lock) == 1);
    }

    // ------------------------------------------------------------------
    // Session events
    // ------------------------------------------------------------------

    /// Handle a player joining: restore their snapshot, then run the
    /// first-join pass if this instance has not run it yet.
    ///
    /// On error the inventory is untouched unless the failure happened in
    /// the first-join save, after the load was already applied.
    ///
    /// # Errors
    ///
    /// Returns the store error that aborted the load or save.
    pub fn on_session_start<I>(&self, identity: &PlayerIdentity, inventory: &mut I) -> Result<JoinReport>
    where
        I: Inventory + ?Sized,
    {
        self.sessions.insert(identity.id, SessionState::Connecting);
        let lock = self.identity_lock(identity.id);
        let _guard = lock.lock();

        let result = self.join_locked(identity, inventory);
        if result.is_ok() {
            self.sessions.insert(identity.id, SessionState::Synced);
        } else {
            self.sessions.remove(&identity.id);
        }
        result
    }

    /// Handle a player leaving: save unconditionally.
    ///
    /// # Errors
    ///
    /// Returns the store error if the save failed.
    pub fn on_session_end<I>(&self, identity: &PlayerIdentity, inventory: &I) -> Result<SaveReport>
    where
        I: Inventory + ?Sized,
    {
        let result = {
            let lock = self.identity_lock(identity.id);
            let _guard = lock.lock();
            self.save_locked(identity, inventory)
        };
        self.sessions.remove(&identity.id);
        self.release_lock(identity.id);
        result
    }

    /// Restore `identity`'s stored snapshot into `inventory`.
    ///
    /// # Errors
    ///
    /// Returns the store error; the inventory is not modified in that case.
    pub fn load<I>(&self, identity: &PlayerIdentity, inventory: &mut I) -> Result<LoadReport>
    where
        I: Inventory + ?Sized,
    {
        let lock = self.identity_lock(identity.id);
        let _guard = lock.lock();
        self.load_locked(identity, inventory)
    }

    /// Save `inventory` as `identity`'s snapshot, replacing any older one.
    ///
    /// # Errors
    ///
    /// Returns the store or serialization error.
    pub fn save<I>(&self, identity: &PlayerIdentity, inventory: &I) -> Result<SaveReport>
    where
        I: Inventory + ?Sized,
    {
        let lock = self.identity_lock(identity.id);
        let _guard = lock.lock();
        self.save_locked(identity, inventory)
    }

    // ------------------------------------------------------------------
    // Locked bodies
    // ------------------------------------------------------------------

    fn join_locked<I>(&self, identity: &PlayerIdentity, inventory: &mut I) -> Result<JoinReport>
    where
        I: Inventory + ?Sized,
    {
        let load = self.load_locked(identity, inventory)?;

        let claimed = self.session.first_join_save
            && self
                .first_join_done
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_ok();
        if !claimed {
            return Ok(JoinReport {
                load,
                first_join_pass: false,
            });
        }

        let stamped = self.stamp_sentinel(inventory);
        if let Err(e) = self.save_locked(identity, inventory) {
            // Let the next join retry the pass.
            self.first_join_done.store(false, Ordering::Release);
            return Err(e);
        }
        SyncCounters::incr(&self.counters.first_join_passes);
        info!(player = %identity, stamped, "First-join pass saved");

        Ok(JoinReport {
            load,
            first_join_pass: true,
        })
    }

    fn load_locked<I>(&self, identity: &PlayerIdentity, inventory: &mut I) -> Result<LoadReport>
    where
        I: Inventory + ?Sized,
    {
        let start = Instant::now();
        let found = self
            .store
            .find_one(&SnapshotAssembler::uuid_filter(identity))
            .inspect_err(|_| SyncCounters::incr(&self.counters.loads_failed))?;

        let Some(doc) = found else {
            SyncCounters::incr(&self.counters.loads_missing);
            debug!(player = %identity, "No stored inventory");
            return Ok(LoadReport::default());
        };

        // Decode everything before the inventory is touched.
        let decoded = self.assembler.decode(&doc);
        let empty = self.codec.catalog().empty_material();
        let mut unknown_materials = 0;
        let items: Vec<(usize, Option<ItemStack>)> = decoded
            .slots
            .iter()
            .map(|(&slot, record)| {
                let item = self.codec.decode(record);
                if item.is_none() && record.material != empty {
                    unknown_materials += 1;
                }
                (slot, item)
            })
            .collect();

        let mut restored = 0;
        for (slot, item) in items {
            if inventory.set_item(slot, item) {
                restored += 1;
            } else {
                warn!(player = %identity, slot, size = inventory.size(), "Stored slot outside inventory");
            }
        }

        let report = LoadReport {
            found: true,
            restored,
            rejected: decoded.rejected.len(),
            unknown_materials,
        };
        SyncCounters::incr(&self.counters.loads_completed);
        SyncCounters::add(&self.counters.slots_restored, restored as u64);
        SyncCounters::add(&self.counters.slots_rejected, report.rejected as u64);
        SyncCounters::add(&self.counters.unknown_materials, unknown_materials as u64);
        debug!(
            player = %identity,
            restored,
            rejected = report.rejected,
            elapsed_us = start.elapsed().as_micros(),
            "Loaded inventory"
        );
        Ok(report)
    }

    fn save_locked<I>(&self, identity: &PlayerIdentity, inventory: &I) -> Result<SaveReport>
    where
        I: Inventory + ?Sized,
    {
        let start = Instant::now();
        let doc = self.assembler.encode(&self.codec, identity, inventory)?;
        let outcome = self
            .store
            .replace_one(&SnapshotAssembler::identity_filter(identity), doc)
            .inspect_err(|_| SyncCounters::incr(&self.counters.saves_failed))?;

        let slots = inventory.occupied_slots().len();
        SyncCounters::incr(&self.counters.saves_completed);
        debug!(
            player = %identity,
            slots,
            ?outcome,
            elapsed_us = start.elapsed().as_micros(),
            "Saved inventory"
        );
        Ok(SaveReport { outcome, slots })
    }

    /// Set the sentinel tag on every occupied slot; returns how many were stamped.
    fn stamp_sentinel<I>(&self, inventory: &mut I) -> usize
    where
        I: Inventory + ?Sized,
    {
        let flag = TagValue::Bool(true);
        let mut stamped = 0;
        for slot in inventory.occupied_slots() {
            let Some(item) = inventory.item_mut(slot) else {
                continue;
            };
            match self.codec.tags().set_tag(item, &self.session.sentinel_tag, &flag) {
                Ok(()) => stamped += 1,
                Err(e) => warn!(slot, error = %e, "Could not stamp sentinel tag"),
            }
        }
        stamped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncError;
    use crate::store::{Document, Filter, MemoryStore};
    use crate::types::PlayerInventory;

    fn orchestrator(store: Arc<dyn DocumentStore>) -> SyncOrchestrator {
        SyncOrchestrator::new(store, ItemCodec::default(), &SyncConfig::default())
    }

    fn player(name: &str, n: u128) -> PlayerIdentity {
        PlayerIdentity::new(name, Uuid::from_u128(n))
    }

    /// A store whose reads and writes can be made to fail.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        fail_reads: AtomicBool,
        fail_writes: AtomicBool,
    }

    impl FlakyStore {
        fn check(flag: &AtomicBool) -> Result<()> {
            if flag.load(Ordering::SeqCst) {
                Err(SyncError::StoreUnavailable("injected".into()))
            } else {
                Ok(())
            }
        }
    }

    impl DocumentStore for FlakyStore {
        fn find_one(&self, filter: &Filter) -> Result<Option<Document>> {
            Self::check(&self.fail_reads)?;
            self.inner.find_one(filter)
        }
        fn insert(&self, doc: Document) -> Result<()> {
            Self::check(&self.fail_writes)?;
            self.inner.insert(doc)
        }
        fn delete_one(&self, filter: &Filter) -> Result<bool> {
            Self::check(&self.fail_writes)?;
            self.inner.delete_one(filter)
        }
        fn count(&self, filter: &Filter) -> Result<usize> {
            self.inner.count(filter)
        }
    }

    #[test]
    fn first_join_pass_runs_once_per_instance() {
        let store = Arc::new(MemoryStore::new());
        let sync = orchestrator(store.clone());

        let mut a = PlayerInventory::default().with_item(0, ItemStack::new("STONE"));
        let first = sync.on_session_start(&player("A", 1), &mut a).expect("join a");
        assert!(first.first_join_pass);
        assert!(sync.first_join_done());
        assert_eq!(
            a.item(0).and_then(|i| i.tags.get("inventory_synced")),
            Some(&TagValue::Bool(true))
        );
        assert_eq!(store.len(), 1);

        let mut b = PlayerInventory::default().with_item(0, ItemStack::new("DIRT"));
        let second = sync.on_session_start(&player("B", 2), &mut b).expect("join b");
        assert!(!second.first_join_pass);
        assert!(b.item(0).is_some_and(|i| i.tags.is_empty()));
        assert_eq!(store.len(), 1, "second join does not save");

        // A fresh instance (process restart) gets its own pass.
        let restarted = orchestrator(store);
        let again = restarted.on_session_start(&player("B", 2), &mut b).expect("join b");
        assert!(again.first_join_pass);
    }

    #[test]
    fn first_join_pass_can_be_disabled() {
        let store = Arc::new(MemoryStore::new());
        let mut config = SyncConfig::default();
        config.session.first_join_save = false;
        let sync = SyncOrchestrator::new(store.clone(), ItemCodec::default(), &config);

        let mut inv = PlayerInventory::default();
        let report = sync.on_session_start(&player("A", 1), &mut inv).expect("join");
        assert!(!report.first_join_pass);
        assert!(store.is_empty());
    }

    #[test]
    fn repeated_saves_keep_one_document() {
        let store = Arc::new(MemoryStore::new());
        let sync = orchestrator(store.clone());
        let alice = player("Alice", 1);

        let mut inv = PlayerInventory::default();
        for amount in 1..=5 {
            inv.set_item(0, Some(ItemStack::new("STONE").with_amount(amount)));
            sync.save(&alice, &inv).expect("save");
        }

        let key = SnapshotAssembler::identity_filter(&alice);
        assert_eq!(store.count(&key).expect("count"), 1);
        let doc = store.find_one(&key).expect("find").expect("Some");
        assert_eq!(doc["slot0"]["amount"], serde_json::json!(5));
    }

    #[test]
    fn load_leaves_unmentioned_slots_untouched() {
        let store = Arc::new(MemoryStore::new());
        let sync = orchestrator(store);
        let alice = player("Alice", 1);

        let saved = PlayerInventory::default().with_item(2, ItemStack::new("BREAD").with_amount(4));
        sync.save(&alice, &saved).expect("save");

        let mut live = PlayerInventory::default().with_item(7, ItemStack::new("TORCH"));
        let report = sync.load(&alice, &mut live).expect("load");
        assert!(report.found);
        assert_eq!(report.restored, 1);
        assert_eq!(live.item(2).map(|i| i.amount), Some(4));
        assert_eq!(live.item(7).map(|i| i.material.as_str()), Some("TORCH"));
    }

    #[test]
    fn load_by_uuid_survives_rename() {
        let store = Arc::new(MemoryStore::new());
        let sync = orchestrator(store);
        let id = Uuid::from_u128(9);

        let saved = PlayerInventory::default().with_item(0, ItemStack::new("DIAMOND"));
        sync.save(&PlayerIdentity::new("OldName", id), &saved).expect("save");

        let mut live = PlayerInventory::default();
        sync.load(&PlayerIdentity::new("NewName", id), &mut live).expect("load");
        assert_eq!(live.item(0).map(|i| i.material.as_str()), Some("DIAMOND"));
    }

    #[test]
    fn failed_load_does_not_touch_inventory() {
        let store = Arc::new(FlakyStore::default());
        let sync = orchestrator(store.clone());
        let alice = player("Alice", 1);

        let saved = PlayerInventory::default().with_item(0, ItemStack::new("DIAMOND"));
        sync.save(&alice, &saved).expect("save");

        store.fail_reads.store(true, Ordering::SeqCst);
        let mut live = PlayerInventory::default().with_item(0, ItemStack::new("DIRT"));
        let before = live.clone();
        let err = sync.on_session_start(&alice, &mut live);
        assert!(matches!(err, Err(SyncError::StoreUnavailable(_))));
        assert_eq!(live, before);
        assert_eq!(sync.session_state(alice.id), SessionState::Disconnected);
        assert!(!sync.first_join_done());
        assert_eq!(sync.counters().snapshot().loads_failed, 1);
    }

    #[test]
    fn failed_first_join_save_releases_latch() {
        let store = Arc::new(FlakyStore::default());
        let sync = orchestrator(store.clone());

        store.fail_writes.store(true, Ordering::SeqCst);
        let mut inv = PlayerInventory::default();
        assert!(sync.on_session_start(&player("A", 1), &mut inv).is_err());
        assert!(!sync.first_join_done());

        store.fail_writes.store(false, Ordering::SeqCst);
        let report = sync.on_session_start(&player("B", 2), &mut inv).expect("retry");
        assert!(report.first_join_pass);
    }

    #[test]
    fn session_states_follow_lifecycle() {
        let sync = orchestrator(Arc::new(MemoryStore::new()));
        let alice = player("Alice", 1);
        assert_eq!(sync.session_state(alice.id), SessionState::Disconnected);

        let mut inv = PlayerInventory::default();
        sync.on_session_start(&alice, &mut inv).expect("join");
        assert_eq!(sync.session_state(alice.id), SessionState::Synced);

        sync.on_session_end(&alice, &inv).expect("quit");
        assert_eq!(sync.session_state(alice.id), SessionState::Disconnected);
        assert!(sync.locks.is_empty());
    }

    #[test]
    fn unknown_materials_are_counted_and_emptied() {
        let store = Arc::new(MemoryStore::new());
        let sync = orchestrator(store.clone());
        let alice = player("Alice", 1);

        let mut doc = Document::new();
        doc.insert("player".into(), "Alice".into());
        doc.insert("uuid".into(), alice.uuid_text().into());
        doc.insert("slot0".into(), serde_json::json!({"material": "UNOBTAINIUM"}));
        doc.insert("slot1".into(), serde_json::json!({"material": "STONE", "amount": 2}));
        store.insert(doc).expect("insert");

        let mut live = PlayerInventory::default().with_item(0, ItemStack::new("DIRT"));
        let report = sync.load(&alice, &mut live).expect("load");
        assert_eq!(report.unknown_materials, 1);
        assert!(live.item(0).is_none());
        assert_eq!(live.item(1).map(|i| i.amount), Some(2));
    }

    #[test]
    fn concurrent_saves_for_one_identity_never_duplicate() {
        let store = Arc::new(MemoryStore::new());
        let sync = Arc::new(orchestrator(store.clone()));
        let alice = player("Alice", 1);

        let handles: Vec<_> = (0..8u32)
            .map(|n| {
                let sync = Arc::clone(&sync);
                let alice = alice.clone();
                std::thread::spawn(move || {
                    let inv = PlayerInventory::default()
                        .with_item(0, ItemStack::new("STONE").with_amount(n + 1));
                    for _ in 0..10 {
                        sync.save(&alice, &inv).expect("save");
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().expect("thread");
        }

        assert_eq!(store.count(&SnapshotAssembler::identity_filter(&alice)).expect("count"), 1);
    }
}
