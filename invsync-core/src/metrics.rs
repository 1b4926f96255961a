//! Runtime counters for inventory sync.
//!
//! Every load and save also emits `tracing` events; these counters add a
//! cheap aggregate view that can be exported for server dashboards.
//! All counters are lock-free `AtomicU64`s.

use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters for sync events.
#[derive(Debug)]
pub struct SyncCounters {
    /// Loads that found a stored document.
    pub loads_completed: AtomicU64,
    /// Loads that found nothing (new player).
    pub loads_missing: AtomicU64,
    /// Loads that failed at the store.
    pub loads_failed: AtomicU64,
    /// Slots written into live inventories by loads.
    pub slots_restored: AtomicU64,
    /// Slot fields rejected as malformed.
    pub slots_rejected: AtomicU64,
    /// Records whose material the catalog did not know.
    pub unknown_materials: AtomicU64,
    /// Saves completed.
    pub saves_completed: AtomicU64,
    /// Saves that failed at the store.
    pub saves_failed: AtomicU64,
    /// First-join stamp-and-save passes run.
    pub first_join_passes: AtomicU64,
}

impl SyncCounters {
    /// Create a new set of zeroed counters.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            loads_completed: AtomicU64::new(0),
            loads_missing: AtomicU64::new(0),
            loads_failed: AtomicU64::new(0),
            slots_restored: AtomicU64::new(0),
            slots_rejected: AtomicU64::new(0),
            unknown_materials: AtomicU64::new(0),
            saves_completed: AtomicU64::new(0),
            saves_failed: AtomicU64::new(0),
            first_join_passes: AtomicU64::new(0),
        }
    }

    /// Add `n` to `counter`.
    pub fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    /// Add one to `counter`.
    pub fn incr(counter: &AtomicU64) {
        Self::add(counter, 1);
    }

    /// Snapshot all counters for export.
    #[must_use]
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            loads_completed: self.loads_completed.load(Ordering::Relaxed),
            loads_missing: self.loads_missing.load(Ordering::Relaxed),
            loads_failed: self.loads_failed.load(Ordering::Relaxed),
            slots_restored: self.slots_restored.load(Ordering::Relaxed),
            slots_rejected: self.slots_rejected.load(Ordering::Relaxed),
            unknown_materials: self.unknown_materials.load(Ordering::Relaxed),
            saves_completed: self.saves_completed.load(Ordering::Relaxed),
            saves_failed: self.saves_failed.load(Ordering::Relaxed),
            first_join_passes: self.first_join_passes.load(Ordering::Relaxed),
        }
    }
}

impl Default for SyncCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// Counter values at a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    /// Loads that found a document.
    pub loads_completed: u64,
    /// Loads that found nothing.
    pub loads_missing: u64,
    /// Failed loads.
    pub loads_failed: u64,
    /// Slots restored.
    pub slots_restored: u64,
    /// Slot fields rejected.
    pub slots_rejected: u64,
    /// Unknown materials seen on decode.
    pub unknown_materials: u64,
    /// Completed saves.
    pub saves_completed: u64,
    /// Failed saves.
    pub saves_failed: u64,
    /// First-join passes.
    pub first_join_passes: u64,
}

impl CounterSnapshot {
    /// Format as Prometheus-compatible text.
    #[must_use]
    pub fn to_prometheus(&self) -> String {
        let rows: [(&str, &str, u64); 9] = [
            ("invsync_loads_completed_total", "Loads that restored a stored inventory", self.loads_completed),
            ("invsync_loads_missing_total", "Loads with no stored inventory", self.loads_missing),
            ("invsync_loads_failed_total", "Loads that failed at the store", self.loads_failed),
            ("invsync_slots_restored_total", "Slots written by loads", self.slots_restored),
            ("invsync_slots_rejected_total", "Malformed slot fields rejected", self.slots_rejected),
            ("invsync_unknown_materials_total", "Records with unknown materials", self.unknown_materials),
            ("invsync_saves_completed_total", "Saves completed", self.saves_completed),
            ("invsync_saves_failed_total", "Saves that failed at the store", self.saves_failed),
            ("invsync_first_join_passes_total", "First-join stamp-and-save passes", self.first_join_passes),
        ];
        let mut out = String::new();
        for (name, help, value) in rows {
            out.push_str(&format!("# HELP {name} {help}\n# TYPE {name} counter\n{name} {value}\n"));
        }
        out
    }
}
