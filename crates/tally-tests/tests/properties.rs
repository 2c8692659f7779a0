//! Property-based tests for the balance policy, the referral engine and the
//! admin input parsers.
//!
//! Each property runs 256 cases with proptest shrinking.

use std::collections::HashSet;
use std::sync::Arc;

use proptest::prelude::*;
use tally_core::balance;
use tally_core::ledger::MemoryLedger;
use tally_core::pending::{parse_decimal_cents, parse_whole_units};
use tally_core::referral::{credit_referral, CreditResult};
use tally_core::registry::Registry;
use tally_core::types::{BalanceKind, UserId, UserRecord};

#[derive(Debug, Clone)]
enum Change {
    Credit(u64),
    Debit(u64),
}

fn change() -> impl Strategy<Value = Change> {
    prop_oneof![
        (0u64..1_000_000).prop_map(Change::Credit),
        (0u64..2_000_000).prop_map(Change::Debit),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// The history always explains the balance exactly, and a debit never
    /// removes more than was there.
    #[test]
    fn history_sums_to_balance(changes in prop::collection::vec(change(), 0..40)) {
        let mut rec = UserRecord::new(UserId(1), "p");
        for c in changes {
            let before = rec.balance;
            match c {
                Change::Credit(a) => {
                    balance::credit(&mut rec, a, BalanceKind::AdminCredit);
                    prop_assert_eq!(rec.balance, before + a);
                }
                Change::Debit(a) => {
                    let removed = balance::debit(&mut rec, a, BalanceKind::AdminDebit);
                    prop_assert_eq!(removed, a.min(before));
                    prop_assert_eq!(rec.balance, before.saturating_sub(a));
                }
            }
            prop_assert_eq!(balance::history_total(&rec), i128::from(rec.balance));
        }
        prop_assert!(rec.history.iter().all(|e| e.delta != 0));
    }

    /// However many times a pair is replayed, each referred user is credited
    /// at most once and both sides receive the same reward.
    #[test]
    fn each_user_is_referred_at_most_once(
        pairs in prop::collection::vec((1i64..8, 1i64..8), 0..40),
        reward in 1u64..10_000,
    ) {
        let mut reg = Registry::load(Arc::new(MemoryLedger::new()), 1).unwrap();
        for id in 1..8 {
            reg.ensure(UserId(id), "p");
        }
        let mut credited = HashSet::new();
        for (referred, inviter) in pairs {
            let result = credit_referral(&mut reg, UserId(referred), UserId(inviter), reward).unwrap();
            if result == CreditResult::Credited {
                prop_assert!(credited.insert(referred), "credited twice: {}", referred);
            }
        }
        let invites: usize = reg.sorted().iter().map(|r| r.invites.len()).sum();
        prop_assert_eq!(invites, credited.len());
        let total: u64 = reg.sorted().iter().map(|r| r.balance).sum();
        prop_assert_eq!(total, 2 * reward * credited.len() as u64);
    }

    #[test]
    fn whole_units_scale_to_cents(units in 0u64..=u64::MAX / 100) {
        prop_assert_eq!(parse_whole_units(&units.to_string()), Ok(units * 100));
    }

    #[test]
    fn two_digit_decimals_parse_exactly(whole in 0u64..1_000_000_000, cents in 0u64..100) {
        let text = format!("{whole}.{cents:02}");
        prop_assert_eq!(parse_decimal_cents(&text), Ok(whole * 100 + cents));
    }

    #[test]
    fn decimal_parser_rejects_signs(whole in 1u64..1_000_000) {
        prop_assert!(parse_decimal_cents(&format!("-{whole}")).is_err());
        prop_assert!(parse_whole_units(&format!("-{whole}")).is_err());
    }
}
