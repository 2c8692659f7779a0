//! Balance policy applied to every balance mutation.
//!
//! Credits saturate at `u64::MAX`, debits clamp at zero and are never
//! refused. Every non-zero change is appended to the record's history so the
//! user can see exactly how their balance was reached. There are no implicit
//! or periodic deductions.

use crate::types::{Amount, BalanceEntry, BalanceKind, UserRecord};

/// Add `amount` to the balance. Returns the amount actually applied.
pub fn credit(record: &mut UserRecord, amount: Amount, kind: BalanceKind) -> Amount {
    let before = record.balance;
    record.balance = before.saturating_add(amount);
    let applied = record.balance - before;
    record_change(record, kind, i64::try_from(applied).unwrap_or(i64::MAX));
    applied
}

/// Subtract `amount`, clamping the balance at zero. Returns the amount
/// actually removed.
pub fn debit(record: &mut UserRecord, amount: Amount, kind: BalanceKind) -> Amount {
    let before = record.balance;
    record.balance = before.saturating_sub(amount);
    let removed = before - record.balance;
    record_change(record, kind, -i64::try_from(removed).unwrap_or(i64::MAX));
    removed
}

fn record_change(record: &mut UserRecord, kind: BalanceKind, delta: i64) {
    if delta == 0 {
        return;
    }
    record.history.push(BalanceEntry {
        kind,
        delta,
        balance_after: record.balance,
        at: chrono::Utc::now().timestamp(),
    });
}

/// Sum of all recorded deltas. Equals the balance for records whose every
/// change went through this module.
pub fn history_total(record: &UserRecord) -> i128 {
    record.history.iter().map(|e| e.delta as i128).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UserId;

    fn user(balance: Amount) -> UserRecord {
        let mut rec = UserRecord::new(UserId(1), "u");
        rec.balance = balance;
        rec
    }

    #[test]
    fn debit_clamps_at_zero() {
        let mut rec = user(5_000);
        let removed = debit(&mut rec, 100_000, BalanceKind::AdminDebit);
        assert_eq!(rec.balance, 0);
        assert_eq!(removed, 5_000);
        assert_eq!(rec.history[0].delta, -5_000);
    }

    #[test]
    fn debit_of_empty_balance_leaves_no_entry() {
        let mut rec = user(0);
        assert_eq!(debit(&mut rec, 10, BalanceKind::AdminDebit), 0);
        assert!(rec.history.is_empty());
    }

    #[test]
    fn credit_saturates() {
        let mut rec = user(u64::MAX - 1);
        let applied = credit(&mut rec, 10, BalanceKind::AdminCredit);
        assert_eq!(rec.balance, u64::MAX);
        assert_eq!(applied, 1);
    }

    #[test]
    fn history_tracks_balance() {
        let mut rec = user(0);
        credit(&mut rec, 300, BalanceKind::ReferralInviter);
        debit(&mut rec, 120, BalanceKind::AdminDebit);
        credit(&mut rec, 100, BalanceKind::AdminCredit);
        assert_eq!(rec.balance, 280);
        assert_eq!(history_total(&rec), 280);
        assert_eq!(rec.history.last().unwrap().balance_after, 280);
    }

    #[test]
    fn crediting_reaches_any_threshold() {
        let mut rec = user(0);
        for _ in 0..500 {
            credit(&mut rec, 100, BalanceKind::ReferralInviter);
        }
        assert_eq!(rec.balance, 50_000);
    }
}
