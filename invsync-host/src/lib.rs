//! # invsync-host — Game Server Integration for invsync
//!
//! This crate connects a game server's connection lifecycle to the
//! server-agnostic `invsync-core` sync layer.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              Game server                 │
//! │   login / logout                         │
//! │        │                                 │
//! │        ▼                                 │
//! │  ┌───────────────────────────────────┐  │
//! │  │         invsync-host              │  │
//! │  │  hooks ──► SessionEvent ──► mpsc  │  │
//! │  │                              │    │  │
//! │  │          SessionListener ◄───┘    │  │
//! │  │     (spawn_blocking per event)    │  │
//! │  │                │                  │  │
//! │  │                ▼                  │  │
//! │  │    ┌─────────────────────────┐    │  │
//! │  │    │      invsync-core       │    │  │
//! │  │    │  SyncOrchestrator       │    │  │
//! │  │    └───────────┬─────────────┘    │  │
//! │  └────────────────┼──────────────────┘  │
//! └───────────────────┼─────────────────────┘
//!                     ▼
//!               document store
//! ```
//!
//! ## Modules
//!
//! - `events` — session events (join, quit)
//! - `hooks` — constructors called from the server's login/logout paths
//! - `registry` — live inventories of online players
//! - `listener` — async dispatch of events to the orchestrator
//! - `config` — tracing setup

#![deny(clippy::unwrap_used)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod events;
pub mod hooks;
pub mod listener;
pub mod registry;

pub use error::HostError;
pub use events::SessionEvent;
pub use listener::{EventOutcome, SessionListener};
pub use registry::{InventoryHandle, OnlinePlayers};
