//! Domain events for the application.
//!
//! These events are sent via the event bus to notify subscribers of lending
//! activity.

use serde::Serialize;

use super::{AssetId, UserId};

/// Events sent to connected clients via SSE (Server-Sent Events).
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum NotificationEvent {
    UserRegistered {
        user_id: UserId,
        username: String,
    },

    AssetCreated {
        asset_id: AssetId,
        name: String,
    },

    AssetCheckedOut {
        asset_id: AssetId,
        asset_name: String,
        user_id: UserId,
        username: String,
    },
    AssetCheckedIn {
        asset_id: AssetId,
        asset_name: String,
        user_id: UserId,
        username: String,
    },
}

impl NotificationEvent {
    /// SSE `event:` name for this notification.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::UserRegistered { .. } => "user_registered",
            Self::AssetCreated { .. } => "asset_created",
            Self::AssetCheckedOut { .. } => "asset_checked_out",
            Self::AssetCheckedIn { .. } => "asset_checked_in",
        }
    }

    /// The account this event is about, if any.
    #[must_use]
    pub const fn subject(&self) -> Option<UserId> {
        match self {
            Self::UserRegistered { user_id, .. }
            | Self::AssetCheckedOut { user_id, .. }
            | Self::AssetCheckedIn { user_id, .. } => Some(*user_id),
            Self::AssetCreated { .. } => None,
        }
    }

    /// Admins see everything. Other users see catalog additions and their own activity.
    #[must_use]
    pub fn is_visible_to(&self, viewer: UserId, is_admin: bool) -> bool {
        is_admin || self.subject().is_none_or(|subject| subject == viewer)
    }
}
