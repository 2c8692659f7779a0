//! Administrator flows: the pending-operation router and the admin panel.

use std::sync::Arc;

use tally_core::ledger::MemoryLedger;
use tally_core::pending::PendingOp;
use tally_core::types::{BalanceKind, UserId};
use tally_tests::helpers::{Harness, ADMIN};

const ADMIN_ID: i64 = ADMIN.0;

async fn with_members(ids: &[i64]) -> Harness {
    let mut h = Harness::new();
    for id in ids {
        h.oracle.join(UserId(*id));
        h.start(*id, "/start").await.unwrap();
    }
    h
}

#[tokio::test]
async fn deduct_beyond_balance_clamps_at_zero() {
    let mut h = with_members(&[20]).await;

    h.press(ADMIN_ID, "add_20").await.unwrap();
    assert_eq!(h.service.pending_op(), Some(PendingOp::AddBalance { target: UserId(20) }));
    h.text(ADMIN_ID, "50").await.unwrap();
    assert_eq!(h.balance(20), 5_000);

    h.press(ADMIN_ID, "dec_20").await.unwrap();
    h.text(ADMIN_ID, "1000").await.unwrap();
    assert_eq!(h.balance(20), 0);
    assert_eq!(h.service.pending_op(), None);

    let history = &h.service.registry().get(UserId(20)).unwrap().history;
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].kind, BalanceKind::AdminDebit);
    assert_eq!(history[1].delta, -5_000);

    let ack = h.transport.last_sent_to(ADMIN).unwrap();
    assert!(ack.text.contains("is now 0.00"), "{}", ack.text);
}

#[tokio::test]
async fn bad_amount_clears_the_slot() {
    let mut h = with_members(&[20]).await;
    h.press(ADMIN_ID, "add_20").await.unwrap();
    h.text(ADMIN_ID, "abc").await.unwrap();

    let reply = h.transport.last_sent_to(ADMIN).unwrap();
    assert!(reply.text.contains("whole number"), "{}", reply.text);
    assert_eq!(h.service.pending_op(), None);

    // the next message is ordinary text, not an amount
    h.text(ADMIN_ID, "5").await.unwrap();
    assert_eq!(h.balance(20), 0);
}

#[tokio::test]
async fn negative_amount_is_rejected() {
    let mut h = with_members(&[20]).await;
    h.press(ADMIN_ID, "add_20").await.unwrap();
    h.text(ADMIN_ID, "-5").await.unwrap();
    assert_eq!(h.balance(20), 0);
    assert!(h.service.registry().get(UserId(20)).unwrap().history.is_empty());
}

#[tokio::test]
async fn unknown_target_is_reported() {
    let mut h = with_members(&[]).await;
    h.press(ADMIN_ID, "add_999").await.unwrap();
    let edit = h.transport.last_edit().unwrap();
    assert_eq!(edit.text, "User not found.");
    assert_eq!(h.service.pending_op(), None);
}

#[tokio::test]
async fn target_removed_before_reply_is_reported() {
    let mut h = with_members(&[20]).await;
    h.press(ADMIN_ID, "add_20").await.unwrap();
    h.press(ADMIN_ID, "ban_20").await.unwrap();
    h.text(ADMIN_ID, "5").await.unwrap();

    let reply = h.transport.last_sent_to(ADMIN).unwrap();
    assert_eq!(reply.text, "User not found.");
    assert!(h.service.registry().get(UserId(20)).is_none());
}

#[tokio::test]
async fn ban_deletes_the_stored_record() {
    let ledger = Arc::new(MemoryLedger::new());
    let mut h = Harness::with_store(ledger.clone(), 1);
    h.oracle.join(UserId(20));
    h.start(20, "/start").await.unwrap();
    assert!(ledger.get(UserId(20)).is_some());

    h.press(ADMIN_ID, "ban_20").await.unwrap();
    assert!(ledger.get(UserId(20)).is_none());
    assert!(!h.service.registry().contains(UserId(20)));
}

#[tokio::test]
async fn referral_reward_accepts_decimals() {
    let mut h = with_members(&[10, 20]).await;
    h.press(ADMIN_ID, "edit_referral").await.unwrap();
    h.text(ADMIN_ID, "2.5").await.unwrap();
    assert_eq!(h.service.settings().referral_reward(), 250);

    h.oracle.join(UserId(30));
    h.start(30, "/start 10").await.unwrap();
    assert_eq!(h.balance(10), 250);
    assert_eq!(h.balance(30), 250);
}

#[tokio::test]
async fn withdraw_limit_is_set_in_whole_units() {
    let mut h = with_members(&[]).await;
    h.press(ADMIN_ID, "set_limit").await.unwrap();
    h.text(ADMIN_ID, "20").await.unwrap();
    assert_eq!(h.service.settings().withdraw_limit(), 2_000);

    h.press(ADMIN_ID, "set_limit").await.unwrap();
    h.text(ADMIN_ID, "2.5").await.unwrap();
    assert_eq!(h.service.settings().withdraw_limit(), 2_000);
    assert_eq!(h.service.pending_op(), None);
}

#[tokio::test]
async fn broadcast_continues_past_failed_recipients() {
    let mut h = with_members(&[20, 30, 40]).await;
    h.transport.fail_for(UserId(30));

    h.press(ADMIN_ID, "broadcast").await.unwrap();
    h.text(ADMIN_ID, "hello everyone").await.unwrap();

    for id in [20, 40] {
        let last = h.transport.last_sent_to(UserId(id)).unwrap();
        assert_eq!(last.text, "hello everyone");
    }
    let ack = h.transport.last_sent_to(ADMIN).unwrap();
    assert!(ack.text.contains("(1 failed)"), "{}", ack.text);
}

#[tokio::test]
async fn edited_template_is_used_for_later_screens() {
    let mut h = with_members(&[20]).await;
    h.press(ADMIN_ID, "msg_edit_main_menu").await.unwrap();
    assert!(h.service.pending_op().is_some());
    h.text(ADMIN_ID, "Hi there").await.unwrap();

    h.start(20, "/start").await.unwrap();
    assert_eq!(h.transport.last_sent_to(UserId(20)).unwrap().text, "Hi there");
}

#[tokio::test]
async fn non_admin_cannot_reach_the_panel() {
    let mut h = with_members(&[20]).await;
    h.transport.clear();

    for data in ["settings", "broadcast", "add_20", "set_limit", "ban_20"] {
        h.press(20, data).await.unwrap();
    }
    assert!(h.transport.edits().is_empty());
    assert_eq!(h.service.pending_op(), None);
    assert!(h.service.registry().contains(UserId(20)));

    // free text from a user never reaches the admin router
    h.text(20, "100").await.unwrap();
    assert_eq!(h.balance(20), 0);
}

#[tokio::test]
async fn admin_panel_shows_current_settings() {
    let mut h = with_members(&[]).await;
    h.press(ADMIN_ID, "settings").await.unwrap();
    let edit = h.transport.last_edit().unwrap();
    assert!(edit.text.contains("Withdrawal minimum: 500.00"), "{}", edit.text);
    assert!(edit.text.contains("Referral reward: 1.00"), "{}", edit.text);
}

#[tokio::test]
async fn admin_user_list_is_sorted_by_id() {
    let mut h = with_members(&[30, 20]).await;
    h.press(ADMIN_ID, "admin_users").await.unwrap();
    let edit = h.transport.last_edit().unwrap();
    let labels: Vec<&str> = edit.rows.iter().map(|row| row[0].label.as_str()).collect();
    assert_eq!(labels[0], "user1 - 0.00");
    assert_eq!(labels[1], "user20 - 0.00");
    assert_eq!(labels[2], "user30 - 0.00");
}
