//! Domain types for the lending ledger with strong typing.
//!
//! Newtype ids keep user and asset identifiers from being mixed up, and
//! [`AssetState`] models the check-out/check-in transitions independently of
//! the database so they can be reasoned about and tested on their own.

pub mod events;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Unique identifier for a User.
///
/// # Examples
///
/// ```rust
/// use lablend::domain::UserId;
///
/// let id = UserId::new(7);
/// assert_eq!(id.value(), 7);
/// assert_eq!(id.to_string(), "7");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct UserId(i32);

impl UserId {
    #[must_use]
    pub const fn new(id: i32) -> Self {
        debug_assert!(id >= 0, "UserId should be non-negative");
        Self(id)
    }

    #[must_use]
    pub const fn value(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<UserId> for i32 {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl From<i32> for UserId {
    fn from(id: i32) -> Self {
        Self::new(id)
    }
}

impl Serialize for UserId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_i32(self.0)
    }
}

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        i32::deserialize(deserializer).map(Self::new)
    }
}

/// Unique identifier for an Asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct AssetId(i32);

impl AssetId {
    #[must_use]
    pub const fn new(id: i32) -> Self {
        debug_assert!(id >= 0, "AssetId should be non-negative");
        Self(id)
    }

    #[must_use]
    pub const fn value(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<AssetId> for i32 {
    fn from(id: AssetId) -> Self {
        id.0
    }
}

impl From<i32> for AssetId {
    fn from(id: i32) -> Self {
        Self::new(id)
    }
}

impl Serialize for AssetId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_i32(self.0)
    }
}

impl<'de> Deserialize<'de> for AssetId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        i32::deserialize(deserializer).map(Self::new)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown {kind}: {value}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

/// Access level of a user. Gates the dashboard view and admin-only routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            other => Err(ParseEnumError {
                kind: "role",
                value: other.to_string(),
            }),
        }
    }
}

/// Kind of ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LedgerAction {
    #[serde(rename = "check-out")]
    CheckOut,
    #[serde(rename = "check-in")]
    CheckIn,
}

impl LedgerAction {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CheckOut => "check-out",
            Self::CheckIn => "check-in",
        }
    }
}

impl fmt::Display for LedgerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LedgerAction {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "check-out" => Ok(Self::CheckOut),
            "check-in" => Ok(Self::CheckIn),
            other => Err(ParseEnumError {
                kind: "ledger action",
                value: other.to_string(),
            }),
        }
    }
}

/// Rejected lending transition.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Asset not available")]
    Unavailable,

    #[error("Unauthorized return attempt")]
    NotAssignee,
}

/// Lending state of a single asset.
///
/// The persisted form is the `(is_available, assigned_to)` column pair; only
/// the two agreeing combinations map to a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssetState {
    #[default]
    Available,
    Borrowed { holder: UserId },
}

impl AssetState {
    /// Reads the state from its column pair. Returns `None` if the columns disagree.
    #[must_use]
    pub fn from_columns(is_available: bool, assigned_to: Option<i32>) -> Option<Self> {
        match (is_available, assigned_to) {
            (true, None) => Some(Self::Available),
            (false, Some(holder)) => Some(Self::Borrowed {
                holder: UserId::new(holder),
            }),
            _ => None,
        }
    }

    #[must_use]
    pub const fn into_columns(self) -> (bool, Option<i32>) {
        match self {
            Self::Available => (true, None),
            Self::Borrowed { holder } => (false, Some(holder.value())),
        }
    }

    #[must_use]
    pub const fn is_available(&self) -> bool {
        matches!(self, Self::Available)
    }

    #[must_use]
    pub const fn holder(&self) -> Option<UserId> {
        match self {
            Self::Available => None,
            Self::Borrowed { holder } => Some(*holder),
        }
    }

    /// Check-out by `user`.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::Unavailable`] if the asset is already borrowed.
    pub const fn borrow(self, user: UserId) -> Result<Self, TransitionError> {
        match self {
            Self::Available => Ok(Self::Borrowed { holder: user }),
            Self::Borrowed { .. } => Err(TransitionError::Unavailable),
        }
    }

    /// Check-in by `user`.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::NotAssignee`] unless `user` currently holds the asset.
    pub fn give_back(self, user: UserId) -> Result<Self, TransitionError> {
        match self {
            Self::Borrowed { holder } if holder == user => Ok(Self::Available),
            _ => Err(TransitionError::NotAssignee),
        }
    }

    /// Applies `action` on behalf of `user`.
    ///
    /// # Errors
    ///
    /// Same as [`AssetState::borrow`] and [`AssetState::give_back`].
    pub fn apply(self, action: LedgerAction, user: UserId) -> Result<Self, TransitionError> {
        match action {
            LedgerAction::CheckOut => self.borrow(user),
            LedgerAction::CheckIn => self.give_back(user),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_convert_and_display() {
        let id = AssetId::new(42);
        assert_eq!(id.value(), 42);
        assert_eq!(id.to_string(), "42");
        assert_eq!(i32::from(id), 42);
        assert_eq!(UserId::from(3), UserId::new(3));
    }

    #[test]
    fn ids_serialize_as_plain_integers() {
        let json = serde_json::to_string(&AssetId::new(5)).unwrap();
        assert_eq!(json, "5");
        let back: UserId = serde_json::from_str("9").unwrap();
        assert_eq!(back, UserId::new(9));
    }

    #[test]
    fn role_parses_and_serializes_lowercase() {
        assert_eq!("admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!("user".parse::<Role>(), Ok(Role::User));
        assert!("root".parse::<Role>().is_err());
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert!(Role::Admin.is_admin());
        assert!(!Role::User.is_admin());
    }

    #[test]
    fn ledger_action_wire_names() {
        assert_eq!(
            serde_json::to_string(&LedgerAction::CheckOut).unwrap(),
            "\"check-out\""
        );
        let parsed: LedgerAction = serde_json::from_str("\"check-in\"").unwrap();
        assert_eq!(parsed, LedgerAction::CheckIn);
        assert_eq!("check-out".parse::<LedgerAction>(), Ok(LedgerAction::CheckOut));
        assert!("checkout".parse::<LedgerAction>().is_err());
    }

    #[test]
    fn state_columns_must_agree() {
        assert_eq!(AssetState::from_columns(true, None), Some(AssetState::Available));
        assert_eq!(
            AssetState::from_columns(false, Some(4)),
            Some(AssetState::Borrowed {
                holder: UserId::new(4)
            })
        );
        assert_eq!(AssetState::from_columns(true, Some(4)), None);
        assert_eq!(AssetState::from_columns(false, None), None);
    }

    #[test]
    fn borrow_then_return_by_holder() {
        let alice = UserId::new(1);
        let borrowed = AssetState::Available.borrow(alice).unwrap();
        assert_eq!(borrowed.holder(), Some(alice));
        assert_eq!(borrowed.into_columns(), (false, Some(1)));

        let returned = borrowed.give_back(alice).unwrap();
        assert!(returned.is_available());
        assert_eq!(returned.into_columns(), (true, None));
    }

    #[test]
    fn borrowed_asset_rejects_second_borrow() {
        let state = AssetState::Borrowed {
            holder: UserId::new(1),
        };
        assert_eq!(
            state.borrow(UserId::new(2)),
            Err(TransitionError::Unavailable)
        );
        assert_eq!(state.borrow(UserId::new(1)), Err(TransitionError::Unavailable));
    }

    #[test]
    fn only_holder_can_return() {
        let state = AssetState::Borrowed {
            holder: UserId::new(1),
        };
        assert_eq!(
            state.give_back(UserId::new(2)),
            Err(TransitionError::NotAssignee)
        );
        assert_eq!(
            AssetState::Available.give_back(UserId::new(1)),
            Err(TransitionError::NotAssignee)
        );
    }

    #[test]
    fn apply_dispatches_on_action() {
        let user = UserId::new(8);
        let state = AssetState::Available
            .apply(LedgerAction::CheckOut, user)
            .unwrap();
        assert!(!state.is_available());
        let state = state.apply(LedgerAction::CheckIn, user).unwrap();
        assert!(state.is_available());
    }
}
