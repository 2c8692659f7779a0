//! Inbound events delivered by the chat gateway.

use serde::{Deserialize, Serialize};

use crate::screen::{MessageRef, Screen};
use crate::types::UserId;

/// Who sent an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    pub id: UserId,
    #[serde(default)]
    pub name: String,
}

impl Sender {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id: UserId(id),
            name: name.into(),
        }
    }
}

/// The message a button was pressed on, as currently displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pressed {
    pub message: MessageRef,
    #[serde(default)]
    pub current: Screen,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InboundEvent {
    /// `/start`, optionally with an invite argument.
    Start { from: Sender, text: String },
    /// Button press carrying callback data.
    Callback { from: Sender, data: String, pressed: Pressed },
    /// Free text that is not a command.
    Text { from: Sender, text: String },
}

impl InboundEvent {
    pub fn sender(&self) -> &Sender {
        match self {
            Self::Start { from, .. } | Self::Callback { from, .. } | Self::Text { from, .. } => from,
        }
    }
}
