//! Console gateway: outbound messages as JSON lines on stdout and a
//! membership oracle backed by a configured member list.
//!
//! Stands in for the chat platform when running the bot locally; a real
//! platform adapter implements the same traits.

use std::collections::HashSet;
use std::io::Write;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;

use tally_core::error::{OracleError, TransportError};
use tally_core::screen::{MessageRef, Screen};
use tally_core::traits::{MembershipOracle, Transport};
use tally_core::types::UserId;

/// One outbound operation, as written to stdout.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outbound<'a> {
    Send { to: UserId, screen: &'a Screen },
    Edit { message: &'a MessageRef, screen: &'a Screen },
}

/// Writes every outbound operation as one JSON line.
pub struct ConsoleTransport<W: Write + Send> {
    out: Mutex<W>,
}

impl ConsoleTransport<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> ConsoleTransport<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    fn emit(&self, op: &Outbound<'_>) -> std::io::Result<()> {
        let line = serde_json::to_string(op)?;
        let mut out = self.out.lock();
        writeln!(out, "{line}")?;
        out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

#[async_trait]
impl<W: Write + Send> Transport for ConsoleTransport<W> {
    async fn send(&self, to: UserId, screen: &Screen) -> Result<(), TransportError> {
        self.emit(&Outbound::Send { to, screen })
            .map_err(|e| TransportError::Delivery(to, e.to_string()))
    }

    async fn edit(&self, message: &MessageRef, screen: &Screen) -> Result<(), TransportError> {
        self.emit(&Outbound::Edit { message, screen })
            .map_err(|e| TransportError::Edit(e.to_string()))
    }
}

/// Reports membership from a fixed set of user ids.
pub struct ListOracle {
    members: HashSet<UserId>,
}

impl ListOracle {
    pub fn new(members: impl IntoIterator<Item = i64>) -> Self {
        Self {
            members: members.into_iter().map(UserId).collect(),
        }
    }
}

#[async_trait]
impl MembershipOracle for ListOracle {
    async fn check(&self, _channel: &str, user: UserId) -> Result<bool, OracleError> {
        Ok(self.members.contains(&user))
    }
}
