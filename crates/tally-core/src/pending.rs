//! Pending-operation slot for admin sessions.
//!
//! When the admin picks a menu action that needs free text, the action is
//! parked in the session slot. The next text message from that admin takes
//! the slot, whatever the message contains; a malformed reply means the
//! admin has to pick the action again.

use crate::constants::CENTS_PER_UNIT;
use crate::error::InputError;
use crate::settings::TemplateKey;
use crate::types::{Amount, UserId};

/// An admin action waiting for its free-text argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingOp {
    AddBalance { target: UserId },
    DeductBalance { target: UserId },
    SetWithdrawLimit,
    SetReferralReward,
    Broadcast,
    EditTemplate { key: TemplateKey },
}

/// Per-session slot: empty (idle) or holding exactly one [`PendingOp`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Session {
    slot: Option<PendingOp>,
}

impl Session {
    /// Park `op`, replacing whatever was waiting before.
    pub fn begin(&mut self, op: PendingOp) {
        self.slot = Some(op);
    }

    /// Take the waiting operation, leaving the session idle.
    pub fn take(&mut self) -> Option<PendingOp> {
        self.slot.take()
    }

    pub fn pending(&self) -> Option<PendingOp> {
        self.slot
    }

    pub fn is_idle(&self) -> bool {
        self.slot.is_none()
    }
}

/// Parse a whole, non-negative number of currency units into cents.
pub fn parse_whole_units(text: &str) -> Result<Amount, InputError> {
    let trimmed = text.trim();
    let units: u64 = trimmed
        .parse()
        .map_err(|_| InputError::NotWholeNumber(trimmed.to_string()))?;
    units
        .checked_mul(CENTS_PER_UNIT)
        .ok_or_else(|| InputError::Overflow(trimmed.to_string()))
}

/// Parse a non-negative decimal (`2`, `2.5`, `0.125`) into cents, rounding
/// half up to two fractional digits.
pub fn parse_decimal_cents(text: &str) -> Result<Amount, InputError> {
    let trimmed = text.trim();
    let not_decimal = || InputError::NotDecimal(trimmed.to_string());
    let overflow = || InputError::Overflow(trimmed.to_string());

    let (whole, frac) = trimmed.split_once('.').unwrap_or((trimmed, ""));
    if whole.is_empty() && frac.is_empty() {
        return Err(not_decimal());
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(not_decimal());
    }

    let whole: u64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| overflow())?
    };
    let digit = |i: usize| frac.as_bytes().get(i).map_or(0, |b| u64::from(b - b'0'));
    let mut cents = digit(0) * 10 + digit(1);
    if digit(2) >= 5 {
        cents += 1;
    }

    whole
        .checked_mul(CENTS_PER_UNIT)
        .and_then(|c| c.checked_add(cents))
        .ok_or_else(overflow)
}
