//! Transport-neutral message content: text plus rows of buttons, and the
//! fixed keyboards the service shows.

use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::constants::PAYMENT_METHODS;
use crate::settings::TemplateKey;
use crate::types::{format_amount, UserId, UserRecord};

/// Identifies a message previously sent to a chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRef {
    pub chat: UserId,
    pub message_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ButtonTarget {
    /// Callback data, see [`Action`].
    Callback(String),
    Url(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub label: String,
    pub target: ButtonTarget,
}

impl Button {
    pub fn action(label: impl Into<String>, action: Action) -> Self {
        Self {
            label: label.into(),
            target: ButtonTarget::Callback(action.to_string()),
        }
    }

    pub fn url(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            target: ButtonTarget::Url(url.into()),
        }
    }
}

/// Message text with its inline keyboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Screen {
    pub text: String,
    pub rows: Vec<Vec<Button>>,
}

impl Screen {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            rows: Vec::new(),
        }
    }

    pub fn with_rows(text: impl Into<String>, rows: Vec<Vec<Button>>) -> Self {
        Self {
            text: text.into(),
            rows,
        }
    }
}

pub fn subscribe_keyboard(channel: &str) -> Vec<Vec<Button>> {
    let handle = channel.trim_start_matches('@');
    vec![
        vec![Button::url("Join the channel", format!("https://t.me/{handle}"))],
        vec![Button::action("I joined - verify", Action::VerifySubscription)],
    ]
}

pub fn main_keyboard(is_admin: bool) -> Vec<Vec<Button>> {
    let mut rows = vec![
        vec![Button::action("My stats", Action::Stats)],
        vec![Button::action("Balance history", Action::History)],
        vec![Button::action("Invite friends", Action::Invite)],
        vec![Button::action("Withdraw", Action::Withdraw)],
    ];
    if is_admin {
        rows.push(vec![Button::action("Settings", Action::Settings)]);
    }
    rows
}

pub fn back_keyboard(to: Action) -> Vec<Vec<Button>> {
    vec![vec![Button::action("Back", to)]]
}

pub fn admin_menu_keyboard() -> Vec<Vec<Button>> {
    vec![
        vec![Button::action("Manage users", Action::AdminUsers)],
        vec![Button::action("Edit message texts", Action::EditMessages)],
        vec![Button::action("Edit referral reward", Action::SetReferralReward)],
        vec![Button::action("Broadcast a message", Action::Broadcast)],
        vec![Button::action("Back", Action::BackToMain)],
    ]
}

/// One row per user, then the limit editor and a back button.
pub fn admin_users_keyboard<'a>(users: impl IntoIterator<Item = &'a UserRecord>) -> Vec<Vec<Button>> {
    let mut rows: Vec<Vec<Button>> = users
        .into_iter()
        .map(|user| {
            vec![Button::action(
                format!("{} - {}", user.display_name, format_amount(user.balance)),
                Action::AdminUser(user.id),
            )]
        })
        .collect();
    if rows.is_empty() {
        rows.push(vec![Button::action("No users yet", Action::Nothing)]);
    }
    rows.push(vec![Button::action("Edit withdrawal minimum", Action::SetWithdrawLimit)]);
    rows.push(vec![Button::action("Back", Action::AdminPanel)]);
    rows
}

pub fn user_edit_keyboard(target: UserId) -> Vec<Vec<Button>> {
    vec![
        vec![
            Button::action("Add balance", Action::AddBalance(target)),
            Button::action("Deduct balance", Action::DeductBalance(target)),
        ],
        vec![Button::action("Remove / ban user", Action::Ban(target))],
        vec![Button::action("Back", Action::AdminUsers)],
    ]
}

/// Payment catalog, two methods per row.
pub fn payment_keyboard() -> Vec<Vec<Button>> {
    let mut rows: Vec<Vec<Button>> = PAYMENT_METHODS
        .chunks(2)
        .enumerate()
        .map(|(row, pair)| {
            pair.iter()
                .enumerate()
                .map(|(col, (label, _))| Button::action(*label, Action::PickPayment(row * 2 + col)))
                .collect()
        })
        .collect();
    rows.push(vec![Button::action("Back", Action::BackToMain)]);
    rows
}

pub fn edit_messages_keyboard() -> Vec<Vec<Button>> {
    let mut rows: Vec<Vec<Button>> = TemplateKey::ALL
        .into_iter()
        .map(|key| {
            vec![Button::action(
                format!("Edit text: {}", key.as_str()),
                Action::EditTemplate(key),
            )]
        })
        .collect();
    rows.push(vec![Button::action("Back", Action::AdminPanel)]);
    rows
}
