//! Withdrawal requests: picking a payment method and capturing the payout
//! details from the user's next message.
//!
//! Nothing is paid out here. A request that clears the withdrawal limit is
//! handed to the operator, who settles it outside the program.

use serde::Serialize;

use crate::constants::{PaymentMethod, PAYMENT_METHODS};
use crate::types::{format_amount, Amount, UserId, UserRecord};

/// A withdrawal request forwarded to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WithdrawalRequest {
    pub user: UserId,
    pub name: String,
    pub method: &'static str,
    pub details: String,
    pub balance: Amount,
}

impl WithdrawalRequest {
    /// Operator-facing summary.
    pub fn summary(&self) -> String {
        format!(
            "Withdrawal request from {} (id={})\nMethod: {}\nDetails: {}\nBalance: {}",
            self.name,
            self.user,
            self.method,
            self.details,
            format_amount(self.balance)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    /// The user has no payment method selected; the text is not a payout.
    NoPendingMethod,
    BelowLimit { balance: Amount, limit: Amount },
    Forward(WithdrawalRequest),
}

/// Look up a catalog entry by index.
pub fn method(index: usize) -> Option<&'static PaymentMethod> {
    PAYMENT_METHODS.get(index)
}

/// Select a payment method for the user. Returns the catalog entry, or
/// `None` if `index` is outside the catalog (nothing is changed then).
pub fn pick_method(record: &mut UserRecord, index: usize) -> Option<&'static PaymentMethod> {
    let entry = method(index)?;
    record.pending_payment_method = Some(index);
    Some(entry)
}

/// Consume the pending payment method with `text` as the payout details.
pub fn submit(record: &mut UserRecord, text: &str, withdraw_limit: Amount) -> PaymentOutcome {
    let Some(index) = record.pending_payment_method.take() else {
        return PaymentOutcome::NoPendingMethod;
    };
    let details = text.trim().to_string();
    record.last_payment_submission = Some(details.clone());

    if record.balance < withdraw_limit {
        return PaymentOutcome::BelowLimit {
            balance: record.balance,
            limit: withdraw_limit,
        };
    }
    let label = method(index).map_or("unknown", |(label, _)| *label);
    PaymentOutcome::Forward(WithdrawalRequest {
        user: record.id,
        name: record.display_name.clone(),
        method: label,
        details,
        balance: record.balance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(balance: Amount) -> UserRecord {
        let mut rec = UserRecord::new(UserId(10), "Lee");
        rec.balance = balance;
        rec
    }

    #[test]
    fn pick_rejects_out_of_range() {
        let mut rec = user(0);
        assert!(pick_method(&mut rec, PAYMENT_METHODS.len()).is_none());
        assert_eq!(rec.pending_payment_method, None);
        assert!(pick_method(&mut rec, 0).is_some());
        assert_eq!(rec.pending_payment_method, Some(0));
    }

    #[test]
    fn below_limit_is_not_forwarded() {
        let mut rec = user(4_999);
        pick_method(&mut rec, 2);
        let outcome = submit(&mut rec, " wallet-abc ", 5_000);
        assert_eq!(outcome, PaymentOutcome::BelowLimit { balance: 4_999, limit: 5_000 });
        assert_eq!(rec.pending_payment_method, None);
        assert_eq!(rec.last_payment_submission.as_deref(), Some("wallet-abc"));
    }

    #[test]
    fn at_limit_is_forwarded() {
        let mut rec = user(5_000);
        pick_method(&mut rec, 0);
        match submit(&mut rec, "me@example.com", 5_000) {
            PaymentOutcome::Forward(req) => {
                assert_eq!(req.method, PAYMENT_METHODS[0].0);
                assert_eq!(req.details, "me@example.com");
                assert!(req.summary().contains("id=10"));
            }
            other => panic!("expected forward, got {other:?}"),
        }
    }

    #[test]
    fn no_method_means_no_submission() {
        let mut rec = user(9_999);
        assert_eq!(submit(&mut rec, "hello", 0), PaymentOutcome::NoPendingMethod);
        assert_eq!(rec.last_payment_submission, None);
    }
}
