//! Integration hooks for the game server's connection handling.
//!
//! The server calls these from its login and logout paths; each returns the
//! [`SessionEvent`] to hand to the [`SessionListener`](crate::SessionListener).

use invsync_core::types::PlayerIdentity;
use uuid::Uuid;

use crate::error::HostError;
use crate::events::SessionEvent;

/// Create a join event.
#[must_use]
pub fn on_join(name: impl Into<String>, id: Uuid) -> SessionEvent {
    SessionEvent::Joined {
        identity: PlayerIdentity::new(name, id),
    }
}

/// Create a quit event.
#[must_use]
pub fn on_quit(name: impl Into<String>, id: Uuid) -> SessionEvent {
    SessionEvent::Quit {
        identity: PlayerIdentity::new(name, id),
    }
}

/// Create a join event from the UUID text a login packet carries.
///
/// # Errors
///
/// Returns [`HostError::Sync`] if `id` is not a UUID.
pub fn on_join_raw(name: impl Into<String>, id: &str) -> Result<SessionEvent, HostError> {
    Ok(SessionEvent::Joined {
        identity: PlayerIdentity::parse(name, id)?,
    })
}

/// Create a quit event from UUID text.
///
/// # Errors
///
/// Returns [`HostError::Sync`] if `id` is not a UUID.
pub fn on_quit_raw(name: impl Into<String>, id: &str) -> Result<SessionEvent, HostError> {
    Ok(SessionEvent::Quit {
        identity: PlayerIdentity::parse(name, id)?,
    })
}
