//! Trait interfaces to the collaborators Tally does not own:
//! - [`LedgerStore`] — durable user persistence (tally-node implements with RocksDB)
//! - [`MembershipOracle`] — channel membership check on the chat platform
//! - [`Transport`] — outbound messages and message edits

use async_trait::async_trait;

use crate::error::{OracleError, StoreError, TransportError};
use crate::screen::{MessageRef, Screen};
use crate::types::{StoredUser, UserId};

/// Durable key-value persistence for user records.
///
/// Calls are synchronous; implementations must make `upsert` and `delete`
/// visible to a later `load_all` once they return `Ok`.
pub trait LedgerStore: Send + Sync {
    /// Insert or replace the record keyed by `user.id`.
    fn upsert(&self, user: &StoredUser) -> Result<(), StoreError>;

    /// Remove a record. Deleting an absent id is not an error.
    fn delete(&self, id: UserId) -> Result<(), StoreError>;

    /// Every stored record, in no particular order.
    fn load_all(&self) -> Result<Vec<StoredUser>, StoreError>;
}

/// Tri-state outcome of a membership check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    Member,
    NotMember,
    /// The check itself failed (permissions, transport). Never coerced to
    /// `NotMember`.
    Unknown,
}

impl From<Result<bool, OracleError>> for Membership {
    fn from(result: Result<bool, OracleError>) -> Self {
        match result {
            Ok(true) => Self::Member,
            Ok(false) => Self::NotMember,
            Err(_) => Self::Unknown,
        }
    }
}

/// Membership check against the external messaging platform.
#[async_trait]
pub trait MembershipOracle: Send + Sync {
    /// Whether `user` is currently a member of `channel`.
    async fn check(&self, channel: &str, user: UserId) -> Result<bool, OracleError>;
}

/// Result of a message edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Edited,
    /// New text and controls equal the current ones; nothing was sent.
    Unchanged,
}

/// Outbound side of the chat platform.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a new message with optional controls.
    async fn send(&self, to: UserId, screen: &Screen) -> Result<(), TransportError>;

    /// Replace an existing message's text and controls.
    async fn edit(&self, message: &MessageRef, screen: &Screen) -> Result<(), TransportError>;
}

/// Edit `message` only when `next` differs from what it shows now.
///
/// Platforms reject redundant edits, so identical content short-circuits to
/// [`EditOutcome::Unchanged`] without touching the transport.
pub async fn edit_if_changed(
    transport: &dyn Transport,
    message: &MessageRef,
    current: &Screen,
    next: &Screen,
) -> Result<EditOutcome, TransportError> {
    if current == next {
        return Ok(EditOutcome::Unchanged);
    }
    transport.edit(message, next).await?;
    Ok(EditOutcome::Edited)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oracle_error_maps_to_unknown() {
        let failed: Result<bool, OracleError> = Err(OracleError::Timeout);
        assert_eq!(Membership::from(failed), Membership::Unknown);
        assert_eq!(Membership::from(Ok(false)), Membership::NotMember);
        assert_eq!(Membership::from(Ok(true)), Membership::Member);
    }
}
