//! Shared test doubles and a service harness for the integration tests.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use tally_core::error::{OracleError, StoreError, TallyError, TransportError};
use tally_core::event::{InboundEvent, Pressed, Sender};
use tally_core::ledger::MemoryLedger;
use tally_core::registry::Registry;
use tally_core::screen::{MessageRef, Screen};
use tally_core::service::{Service, ServiceConfig};
use tally_core::settings::Settings;
use tally_core::traits::{LedgerStore, MembershipOracle, Transport};
use tally_core::types::{StoredUser, UserId};

/// Administrator id used by every harness.
pub const ADMIN: UserId = UserId(1);

/// Records every outbound message; delivery to chosen users fails.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<(UserId, Screen)>>,
    edits: Mutex<Vec<(MessageRef, Screen)>>,
    unreachable: Mutex<HashSet<UserId>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later send to `user` fail.
    pub fn fail_for(&self, user: UserId) {
        self.unreachable.lock().insert(user);
    }

    /// Screens successfully sent to `user`, oldest first.
    pub fn sent_to(&self, user: UserId) -> Vec<Screen> {
        self.sent
            .lock()
            .iter()
            .filter(|(to, _)| *to == user)
            .map(|(_, screen)| screen.clone())
            .collect()
    }

    pub fn last_sent_to(&self, user: UserId) -> Option<Screen> {
        self.sent_to(user).pop()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().len()
    }

    pub fn edits(&self) -> Vec<(MessageRef, Screen)> {
        self.edits.lock().clone()
    }

    pub fn last_edit(&self) -> Option<Screen> {
        self.edits.lock().last().map(|(_, screen)| screen.clone())
    }

    pub fn clear(&self) {
        self.sent.lock().clear();
        self.edits.lock().clear();
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, to: UserId, screen: &Screen) -> Result<(), TransportError> {
        if self.unreachable.lock().contains(&to) {
            return Err(TransportError::Delivery(to, "blocked by user".into()));
        }
        self.sent.lock().push((to, screen.clone()));
        Ok(())
    }

    async fn edit(&self, message: &MessageRef, screen: &Screen) -> Result<(), TransportError> {
        self.edits.lock().push((message.clone(), screen.clone()));
        Ok(())
    }
}

/// Membership oracle with a scripted member list. Users marked broken make
/// the lookup itself fail.
#[derive(Default)]
pub struct ScriptedOracle {
    members: Mutex<HashSet<UserId>>,
    broken: Mutex<HashSet<UserId>>,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn join(&self, user: UserId) {
        self.members.lock().insert(user);
    }

    pub fn leave(&self, user: UserId) {
        self.members.lock().remove(&user);
    }

    /// Make lookups for `user` fail until [`repair`](Self::repair).
    pub fn break_for(&self, user: UserId) {
        self.broken.lock().insert(user);
    }

    pub fn repair(&self, user: UserId) {
        self.broken.lock().remove(&user);
    }
}

#[async_trait]
impl MembershipOracle for ScriptedOracle {
    async fn check(&self, channel: &str, user: UserId) -> Result<bool, OracleError> {
        if self.broken.lock().contains(&user) {
            return Err(OracleError::Lookup {
                channel: channel.to_string(),
                user,
                reason: "bot is not a member of the channel".into(),
            });
        }
        Ok(self.members.lock().contains(&user))
    }
}

/// Memory ledger whose next `n` writes fail.
#[derive(Default)]
pub struct FlakyLedger {
    inner: MemoryLedger,
    failures_left: Mutex<u32>,
}

impl FlakyLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next(&self, n: u32) {
        *self.failures_left.lock() = n;
    }

    pub fn get(&self, id: UserId) -> Option<StoredUser> {
        self.inner.get(id)
    }

    fn maybe_fail(&self) -> Result<(), StoreError> {
        let mut left = self.failures_left.lock();
        if *left > 0 {
            *left -= 1;
            return Err(StoreError::Backend("disk full".into()));
        }
        Ok(())
    }
}

impl LedgerStore for FlakyLedger {
    fn upsert(&self, user: &StoredUser) -> Result<(), StoreError> {
        self.maybe_fail()?;
        self.inner.upsert(user)
    }

    fn delete(&self, id: UserId) -> Result<(), StoreError> {
        self.maybe_fail()?;
        self.inner.delete(id)
    }

    fn load_all(&self) -> Result<Vec<StoredUser>, StoreError> {
        self.inner.load_all()
    }
}

/// A service wired to recording doubles.
pub struct Harness {
    pub service: Service,
    pub transport: Arc<RecordingTransport>,
    pub oracle: Arc<ScriptedOracle>,
}

impl Harness {
    /// Fresh service over an in-memory ledger with default settings.
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryLedger::new()), 1)
    }

    /// Fresh service over `store`, retrying each write `attempts` times.
    pub fn with_store(store: Arc<dyn LedgerStore>, attempts: u32) -> Self {
        let transport = Arc::new(RecordingTransport::new());
        let oracle = Arc::new(ScriptedOracle::new());
        let registry = Registry::load(store, attempts).expect("load registry");
        let service = Service::new(
            registry,
            Settings::default(),
            oracle.clone(),
            transport.clone(),
            ServiceConfig::new(ADMIN),
        );
        Self {
            service,
            transport,
            oracle,
        }
    }

    pub async fn start(&mut self, user: i64, text: &str) -> Result<(), TallyError> {
        self.service
            .handle(InboundEvent::Start {
                from: sender(user),
                text: text.to_string(),
            })
            .await
    }

    /// Press a button on a message that currently shows nothing.
    pub async fn press(&mut self, user: i64, data: &str) -> Result<(), TallyError> {
        self.press_on(user, data, Screen::default()).await
    }

    /// Press a button on a message that currently shows `current`.
    pub async fn press_on(&mut self, user: i64, data: &str, current: Screen) -> Result<(), TallyError> {
        self.service
            .handle(InboundEvent::Callback {
                from: sender(user),
                data: data.to_string(),
                pressed: Pressed {
                    message: MessageRef {
                        chat: UserId(user),
                        message_id: 1,
                    },
                    current,
                },
            })
            .await
    }

    pub async fn text(&mut self, user: i64, text: &str) -> Result<(), TallyError> {
        self.service
            .handle(InboundEvent::Text {
                from: sender(user),
                text: text.to_string(),
            })
            .await
    }

    pub fn balance(&self, user: i64) -> u64 {
        self.service
            .registry()
            .get(UserId(user))
            .map_or(0, |r| r.balance)
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

/// Sender with a name derived from the id.
pub fn sender(id: i64) -> Sender {
    Sender::new(id, format!("user{id}"))
}
