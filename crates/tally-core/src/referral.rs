//! Referral engine: invite-link parsing, inviter capture, and exactly-once
//! crediting of a referral.
//!
//! A referred user carries at most one `pending_inviter`, captured on first
//! contact. It is consumed the first time a membership check succeeds and is
//! never looked at again, whatever the outcome of the credit.

use crate::balance;
use crate::error::StoreError;
use crate::registry::Registry;
use crate::types::{Amount, BalanceKind, UserId, UserRecord};

/// Outcome of [`credit_referral`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreditResult {
    Credited,
    SkippedSelf,
    /// The referred user was already credited to some inviter.
    SkippedDuplicate,
    SkippedUnknownInviter,
}

/// Extract the inviter from a start command (`/start 12345`).
///
/// Anything other than exactly one positive numeric argument, or the
/// user's own id, means "no inviter".
pub fn parse_invite(text: &str, user: UserId) -> Option<UserId> {
    let mut parts = text.split_whitespace();
    let (_command, arg) = (parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    let inviter: UserId = arg.parse().ok()?;
    (inviter.0 > 0 && inviter != user).then_some(inviter)
}

/// Remember `inviter` on a user who has not been verified yet and has no
/// inviter recorded. Returns whether the inviter was stored.
pub fn capture_inviter(record: &mut UserRecord, inviter: Option<UserId>) -> bool {
    match inviter {
        Some(inviter)
            if inviter != record.id && !record.subscribed && record.pending_inviter.is_none() =>
        {
            record.pending_inviter = Some(inviter);
            true
        }
        _ => false,
    }
}

/// Credit `reward` to both `inviter` and `referred` if this is the first
/// time `referred` is credited.
///
/// Both records are written to the store before either changes in memory.
pub fn credit_referral(
    registry: &mut Registry,
    referred: UserId,
    inviter: UserId,
    reward: Amount,
) -> Result<CreditResult, StoreError> {
    if inviter == referred {
        return Ok(CreditResult::SkippedSelf);
    }
    let Some(inviter_record) = registry.get(inviter) else {
        return Ok(CreditResult::SkippedUnknownInviter);
    };
    if already_referred(registry, referred) {
        return Ok(CreditResult::SkippedDuplicate);
    }

    let mut inviter_record = inviter_record.clone();
    let mut referred_record = registry
        .get(referred)
        .cloned()
        .unwrap_or_else(|| UserRecord::new(referred, ""));

    inviter_record.invites.insert(referred);
    balance::credit(&mut inviter_record, reward, BalanceKind::ReferralInviter);
    balance::credit(&mut referred_record, reward, BalanceKind::ReferralJoined);

    registry.commit_all(vec![inviter_record, referred_record])?;
    Ok(CreditResult::Credited)
}

fn already_referred(registry: &Registry, referred: UserId) -> bool {
    registry
        .sorted()
        .into_iter()
        .any(|record| record.invites.contains(&referred))
}

/// Consume the pending inviter of `referred`, crediting the referral.
///
/// Returns `None` when there was nothing pending. On a store failure the
/// pending inviter is put back so a later verification can retry.
pub fn resolve_pending(
    registry: &mut Registry,
    referred: UserId,
    reward: Amount,
) -> Result<Option<(UserId, CreditResult)>, StoreError> {
    let Some(inviter) = registry
        .get_mut(referred)
        .and_then(|record| record.pending_inviter.take())
    else {
        return Ok(None);
    };

    match credit_referral(registry, referred, inviter, reward) {
        Ok(result) => Ok(Some((inviter, result))),
        Err(e) => {
            if let Some(record) = registry.get_mut(referred) {
                record.pending_inviter = Some(inviter);
            }
            Err(e)
        }
    }
}
