//! Core data types: user identities, amounts, user records and their
//! persisted form.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::CENTS_PER_UNIT;

/// Monetary amount in cents.
pub type Amount = u64;

/// Stable numeric identity of an end user on the chat platform.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    bincode::Encode,
    bincode::Decode,
)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(UserId)
    }
}

/// Render cents as a decimal string with two fractional digits (`12.05`).
pub fn format_amount(cents: Amount) -> String {
    format!("{}.{:02}", cents / CENTS_PER_UNIT, cents % CENTS_PER_UNIT)
}

/// What caused a balance change.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
pub enum BalanceKind {
    /// Reward for bringing in a new member.
    ReferralInviter,
    /// Welcome reward for joining through an invite link.
    ReferralJoined,
    /// Manual credit by the administrator.
    AdminCredit,
    /// Manual deduction by the administrator.
    AdminDebit,
}

impl BalanceKind {
    /// Short human-readable label shown on the history screen.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ReferralInviter => "referral reward",
            Self::ReferralJoined => "joined via invite",
            Self::AdminCredit => "admin credit",
            Self::AdminDebit => "admin deduction",
        }
    }
}

/// One applied balance change, as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct BalanceEntry {
    pub kind: BalanceKind,
    /// Signed change actually applied, in cents (after clamping).
    pub delta: i64,
    /// Balance right after the change, in cents.
    pub balance_after: Amount,
    /// Unix timestamp (seconds) of the change.
    pub at: i64,
}

/// In-memory state of one end user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: UserId,
    pub display_name: String,
    pub balance: Amount,
    /// Users this user has successfully referred.
    pub invites: BTreeSet<UserId>,
    /// Outcome of the last membership check.
    pub subscribed: bool,
    /// Inviter captured from the first start command, until resolved.
    pub pending_inviter: Option<UserId>,
    /// Index into [`PAYMENT_METHODS`](crate::constants::PAYMENT_METHODS).
    pub pending_payment_method: Option<usize>,
    pub last_payment_submission: Option<String>,
    pub history: Vec<BalanceEntry>,
    /// Whether the ledger holds a copy of this record.
    pub stored: bool,
}

impl UserRecord {
    /// Fresh record for a first-contact user.
    pub fn new(id: UserId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            balance: 0,
            invites: BTreeSet::new(),
            subscribed: false,
            pending_inviter: None,
            pending_payment_method: None,
            last_payment_submission: None,
            history: Vec::new(),
            stored: false,
        }
    }

    /// Rebuild a record from its persisted form.
    ///
    /// Ephemeral fields are not stored; a reloaded user is assumed
    /// subscribed until the next membership check says otherwise.
    pub fn from_stored(stored: StoredUser) -> Self {
        Self {
            id: stored.id,
            display_name: stored.name,
            balance: stored.balance,
            invites: stored.invites.into_iter().collect(),
            subscribed: true,
            pending_inviter: None,
            pending_payment_method: None,
            last_payment_submission: None,
            history: stored.history,
            stored: true,
        }
    }

    /// Persisted form of this record.
    pub fn to_stored(&self) -> StoredUser {
        StoredUser {
            id: self.id,
            name: self.display_name.clone(),
            balance: self.balance,
            invites: self.invites.iter().copied().collect(),
            history: self.history.clone(),
        }
    }
}

/// What the ledger store keeps per user. Invite order carries no meaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct StoredUser {
    pub id: UserId,
    pub name: String,
    pub balance: Amount,
    pub invites: Vec<UserId>,
    pub history: Vec<BalanceEntry>,
}
