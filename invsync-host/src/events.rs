//! Session events the game server reports to the sync layer.

use invsync_core::types::PlayerIdentity;

/// A player session event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A player finished connecting and their inventory is live.
    Joined {
        /// Who joined.
        identity: PlayerIdentity,
    },

    /// A player disconnected; their inventory is still readable.
    Quit {
        /// Who left.
        identity: PlayerIdentity,
    },
}

impl SessionEvent {
    /// The player this event concerns.
    #[must_use]
    pub fn identity(&self) -> &PlayerIdentity {
        match self {
            Self::Joined { identity } | Self::Quit { identity } => identity,
        }
    }

    /// Short label for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Joined { .. } => "join",
            Self::Quit { .. } => "quit",
        }
    }
}
