//! Event handlers for the referral program.
//!
//! [`Service`] owns the registry, the settings and the admin sessions, and
//! is driven one event at a time. Oracle and transport calls are the only
//! suspension points; both are bounded by `external_timeout`.
//!
//! Failures talking to users (replies, edits, inviter notifications,
//! broadcast recipients) are logged and dropped. Store failures are
//! returned to the caller.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::action::Action;
use crate::balance;
use crate::constants::{
    DEFAULT_BOT_USERNAME, DEFAULT_CHANNEL, DEFAULT_EXTERNAL_TIMEOUT_SECS, HISTORY_SCREEN_ENTRIES,
};
use crate::error::{OracleError, TallyError, TransportError};
use crate::event::{InboundEvent, Pressed, Sender};
use crate::payment::{self, PaymentOutcome};
use crate::pending::{self, PendingOp, Session};
use crate::referral::{self, CreditResult};
use crate::registry::Registry;
use crate::screen::{self, Screen};
use crate::settings::{Settings, TemplateKey};
use crate::traits::{edit_if_changed, Membership, MembershipOracle, Transport};
use crate::types::{format_amount, BalanceKind, UserId};

/// Static service parameters.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// The single administrator, who also receives withdrawal requests and
    /// operator alerts.
    pub admin: UserId,
    /// Channel users must join.
    pub channel: String,
    /// Bot username used in invite links.
    pub bot_username: String,
    /// Upper bound on each oracle or transport call.
    pub external_timeout: Duration,
}

impl ServiceConfig {
    pub fn new(admin: UserId) -> Self {
        Self {
            admin,
            channel: DEFAULT_CHANNEL.to_string(),
            bot_username: DEFAULT_BOT_USERNAME.to_string(),
            external_timeout: Duration::from_secs(DEFAULT_EXTERNAL_TIMEOUT_SECS),
        }
    }
}

/// Where a reply goes: a new message, or an edit of the pressed one.
#[derive(Clone, Copy)]
enum Reply<'a> {
    Send(UserId),
    Edit(&'a Pressed),
}

pub struct Service {
    registry: Registry,
    settings: Settings,
    sessions: HashMap<UserId, Session>,
    oracle: Arc<dyn MembershipOracle>,
    transport: Arc<dyn Transport>,
    config: ServiceConfig,
}

impl Service {
    pub fn new(
        registry: Registry,
        settings: Settings,
        oracle: Arc<dyn MembershipOracle>,
        transport: Arc<dyn Transport>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            registry,
            settings,
            sessions: HashMap::new(),
            oracle,
            transport,
            config,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The admin's pending operation, if any.
    pub fn pending_op(&self) -> Option<PendingOp> {
        self.sessions.get(&self.config.admin).and_then(Session::pending)
    }

    /// Dispatch one inbound event.
    pub async fn handle(&mut self, event: InboundEvent) -> Result<(), TallyError> {
        match event {
            InboundEvent::Start { from, text } => self.handle_start(&from, &text).await,
            InboundEvent::Callback {
                from,
                data,
                pressed,
            } => self.handle_callback(&from, &data, &pressed).await,
            InboundEvent::Text { from, text } => self.handle_text(&from, &text).await,
        }
    }

    /// `/start [inviter]`.
    pub async fn handle_start(&mut self, from: &Sender, text: &str) -> Result<(), TallyError> {
        let inviter = referral::parse_invite(text, from.id);
        let record = self.registry.ensure(from.id, &from.name);
        if referral::capture_inviter(record, inviter) {
            debug!(user = %from.id, inviter = ?inviter, "inviter captured");
        }
        if !self.gate(from, Reply::Send(from.id)).await? {
            return Ok(());
        }
        self.respond(Reply::Send(from.id), self.main_menu(from.id)).await;
        Ok(())
    }

    /// Button press.
    pub async fn handle_callback(
        &mut self,
        from: &Sender,
        data: &str,
        pressed: &Pressed,
    ) -> Result<(), TallyError> {
        let Some(action) = Action::parse(data) else {
            debug!(user = %from.id, data, "ignoring unknown callback data");
            return Ok(());
        };
        let reply = Reply::Edit(pressed);

        if action == Action::VerifySubscription {
            return self.verify(from, reply).await;
        }
        if !self.gate(from, reply).await? {
            return Ok(());
        }
        if action.is_admin_only() && from.id != self.config.admin {
            debug!(user = %from.id, %action, "non-admin pressed admin action");
            return Ok(());
        }

        match action {
            // handled before the gate
            Action::VerifySubscription => {}
            Action::Settings | Action::AdminPanel => {
                self.respond(reply, self.admin_settings_screen()).await;
            }
            Action::AdminUsers => {
                self.respond(reply, self.admin_users_screen("Users:")).await;
            }
            Action::AdminUser(target) => {
                let screen = match self.registry.get(target) {
                    Some(user) => Screen::with_rows(
                        format!(
                            "User settings:\nName: {}\nBalance: {}\nInvited: {}",
                            user.display_name,
                            format_amount(user.balance),
                            user.invites.len()
                        ),
                        screen::user_edit_keyboard(target),
                    ),
                    None => self.admin_users_screen("User not found."),
                };
                self.respond(reply, screen).await;
            }
            Action::AddBalance(target) | Action::DeductBalance(target) => {
                if !self.registry.contains(target) {
                    self.respond(reply, self.admin_users_screen("User not found.")).await;
                    return Ok(());
                }
                let (op, prompt) = if matches!(action, Action::AddBalance(_)) {
                    (PendingOp::AddBalance { target }, "Enter the amount to add for this user:")
                } else {
                    (PendingOp::DeductBalance { target }, "Enter the amount to deduct from this user:")
                };
                self.begin(op);
                self.respond(reply, Screen::text(prompt)).await;
            }
            Action::Ban(target) => {
                let text = match self.registry.remove(target) {
                    Ok(Some(_)) => {
                        info!(user = %target, "user removed by admin");
                        "User removed and their data deleted."
                    }
                    Ok(None) => "User not found.",
                    Err(e) => {
                        self.respond(reply, self.admin_users_screen("Could not remove the user: storage error."))
                            .await;
                        return Err(e.into());
                    }
                };
                self.respond(reply, self.admin_users_screen(text)).await;
            }
            Action::SetWithdrawLimit => {
                self.begin(PendingOp::SetWithdrawLimit);
                let text = format!(
                    "Enter the new withdrawal minimum in whole units (current: {}):",
                    format_amount(self.settings.withdraw_limit())
                );
                self.respond(reply, Screen::with_rows(text, screen::admin_menu_keyboard())).await;
            }
            Action::SetReferralReward => {
                self.begin(PendingOp::SetReferralReward);
                let text = format!(
                    "Enter the new reward per referral (current: {}):",
                    format_amount(self.settings.referral_reward())
                );
                self.respond(reply, Screen::text(text)).await;
            }
            Action::Broadcast => {
                self.begin(PendingOp::Broadcast);
                let screen = Screen::with_rows(
                    "Enter the text to send to every user:",
                    screen::admin_menu_keyboard(),
                );
                self.respond(reply, screen).await;
            }
            Action::EditMessages => {
                let screen = Screen::with_rows(
                    "Choose the text you want to edit:",
                    screen::edit_messages_keyboard(),
                );
                self.respond(reply, screen).await;
            }
            Action::EditTemplate(key) => {
                self.begin(PendingOp::EditTemplate { key });
                let text = format!(
                    "Enter the new text for ({}):\nCurrent text:\n\n{}",
                    key.as_str(),
                    self.settings.template(key)
                );
                self.respond(reply, Screen::text(text)).await;
            }
            Action::BackToMain => {
                self.respond(reply, self.main_menu(from.id)).await;
            }
            Action::Nothing => {}
            Action::Withdraw | Action::BackToWithdraw => {
                if let Some(record) = self.registry.get_mut(from.id) {
                    record.pending_payment_method = None;
                }
                let screen = Screen::with_rows(
                    self.settings.template(TemplateKey::WithdrawMenu),
                    screen::payment_keyboard(),
                );
                self.respond(reply, screen).await;
            }
            Action::PickPayment(index) => {
                let picked = self
                    .registry
                    .get_mut(from.id)
                    .and_then(|record| payment::pick_method(record, index));
                let screen = match picked {
                    Some((label, prompt)) => Screen::with_rows(
                        format!("Payment method selected: {label}\n\n{prompt}\n\nSend your details now."),
                        screen::back_keyboard(Action::BackToWithdraw),
                    ),
                    None => Screen::with_rows("Invalid payment method.", screen::payment_keyboard()),
                };
                self.respond(reply, screen).await;
            }
            Action::Invite => {
                let link = format!("https://t.me/{}?start={}", self.config.bot_username, from.id);
                let text = self.settings.render(TemplateKey::Invite, &[("link", &link)]);
                self.respond(reply, Screen::with_rows(text, screen::back_keyboard(Action::BackToMain)))
                    .await;
            }
            Action::Stats => {
                let screen = self.stats_screen(from.id);
                self.respond(reply, screen).await;
            }
            Action::History => {
                let screen = self.history_screen(from.id);
                self.respond(reply, screen).await;
            }
        }
        Ok(())
    }

    /// Free-text message.
    pub async fn handle_text(&mut self, from: &Sender, text: &str) -> Result<(), TallyError> {
        self.registry.ensure(from.id, &from.name);

        if from.id == self.config.admin {
            if let Some(op) = self.pending_op() {
                let result = self.apply_admin_reply(op, text).await;
                if let Some(session) = self.sessions.get_mut(&self.config.admin) {
                    session.take();
                }
                return result;
            }
        }

        if !self.gate(from, Reply::Send(from.id)).await? {
            return Ok(());
        }

        let limit = self.settings.withdraw_limit();
        let outcome = match self.registry.get_mut(from.id) {
            Some(record) => payment::submit(record, text, limit),
            None => PaymentOutcome::NoPendingMethod,
        };
        match outcome {
            PaymentOutcome::NoPendingMethod => {
                self.respond(Reply::Send(from.id), self.main_menu(from.id)).await;
            }
            PaymentOutcome::BelowLimit { balance, limit } => {
                let text = self.settings.render(
                    TemplateKey::WithdrawFail,
                    &[("balance", &format_amount(balance)), ("limit", &format_amount(limit))],
                );
                let screen = Screen::with_rows(text, screen::main_keyboard(from.id == self.config.admin));
                self.respond(Reply::Send(from.id), screen).await;
            }
            PaymentOutcome::Forward(request) => {
                let ack = match self.send(self.config.admin, &Screen::text(request.summary())).await {
                    Ok(()) => {
                        info!(user = %from.id, method = request.method, balance = request.balance, "withdrawal request forwarded");
                        format!("Your withdrawal request ({}) was received. We will contact you soon.", request.method)
                    }
                    Err(e) => {
                        warn!(user = %from.id, error = %e, "failed to forward withdrawal request");
                        "Your request could not be delivered. Please pick the method and try again.".to_string()
                    }
                };
                let screen = Screen::with_rows(ack, screen::main_keyboard(from.id == self.config.admin));
                self.respond(Reply::Send(from.id), screen).await;
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Membership
    // ------------------------------------------------------------------

    async fn membership(&self, user: UserId) -> Membership {
        if user == self.config.admin {
            return Membership::Member;
        }
        let check = self.oracle.check(&self.config.channel, user);
        let result = match tokio::time::timeout(self.config.external_timeout, check).await {
            Ok(result) => result,
            Err(_) => Err(OracleError::Timeout),
        };
        if let Err(e) = &result {
            warn!(%user, error = %e, "membership check failed");
        }
        Membership::from(result)
    }

    /// Make sure the sender is a verified member before anything else runs.
    ///
    /// Creates the record if needed, resolves a pending referral on success,
    /// and answers with the subscribe prompt otherwise.
    async fn gate(&mut self, from: &Sender, reply: Reply<'_>) -> Result<bool, TallyError> {
        self.registry.ensure(from.id, &from.name);
        if from.id == self.config.admin {
            self.set_subscribed(from.id, true);
            return Ok(true);
        }
        match self.membership(from.id).await {
            Membership::Member => {
                self.on_verified(from.id).await?;
                Ok(true)
            }
            Membership::NotMember => {
                self.set_subscribed(from.id, false);
                let screen = Screen::with_rows(
                    "To continue you must join the channel first.",
                    screen::subscribe_keyboard(&self.config.channel),
                );
                self.respond(reply, screen).await;
                Ok(false)
            }
            Membership::Unknown => {
                self.set_subscribed(from.id, false);
                let screen = Screen::with_rows(
                    "We could not verify your membership automatically.\n\
                     The bot may lack access to the channel. Make sure it is a member or \
                     admin of the channel, then press the verify button.",
                    screen::subscribe_keyboard(&self.config.channel),
                );
                self.respond(reply, screen).await;
                self.alert_unverifiable(from).await;
                Ok(false)
            }
        }
    }

    /// The explicit verify button.
    async fn verify(&mut self, from: &Sender, reply: Reply<'_>) -> Result<(), TallyError> {
        self.registry.ensure(from.id, &from.name);
        let screen = match self.membership(from.id).await {
            Membership::Member => {
                self.on_verified(from.id).await?;
                self.main_menu(from.id)
            }
            Membership::NotMember => Screen::with_rows(
                "It looks like you have not joined yet. Join the channel, then press verify.",
                screen::subscribe_keyboard(&self.config.channel),
            ),
            Membership::Unknown => {
                self.alert_unverifiable(from).await;
                Screen::with_rows(
                    "We could not verify automatically.\nMake sure the bot is a member or \
                     admin of the channel and try again.\nThe administrator has been notified.",
                    screen::subscribe_keyboard(&self.config.channel),
                )
            }
        };
        self.respond(reply, screen).await;
        Ok(())
    }

    async fn on_verified(&mut self, user: UserId) -> Result<(), TallyError> {
        self.set_subscribed(user, true);
        let reward = self.settings.referral_reward();
        let resolved = referral::resolve_pending(&mut self.registry, user, reward)?;
        if let Some(record) = self.registry.get(user).filter(|r| !r.stored).cloned() {
            self.registry.commit(record)?;
        }
        let Some((inviter, result)) = resolved else {
            return Ok(());
        };
        info!(%user, %inviter, ?result, "referral resolved");
        if result == CreditResult::Credited {
            let name = self
                .registry
                .get(user)
                .map(|r| r.display_name.clone())
                .unwrap_or_default();
            let note = Screen::text(format!(
                "{name} joined through your invite link! {} was added to your balance.",
                format_amount(reward)
            ));
            if let Err(e) = self.send(inviter, &note).await {
                warn!(%inviter, error = %e, "failed to notify inviter");
            }
        }
        Ok(())
    }

    async fn alert_unverifiable(&self, from: &Sender) {
        let alert = Screen::text(format!(
            "Warning: could not verify the membership of {} (id={}) in {}. Check the bot's permissions.",
            from.name, from.id, self.config.channel
        ));
        if let Err(e) = self.send(self.config.admin, &alert).await {
            warn!(error = %e, "failed to alert operator about membership check");
        }
    }

    fn set_subscribed(&mut self, user: UserId, subscribed: bool) {
        if let Some(record) = self.registry.get_mut(user) {
            record.subscribed = subscribed;
        }
    }

    // ------------------------------------------------------------------
    // Admin replies
    // ------------------------------------------------------------------

    fn begin(&mut self, op: PendingOp) {
        debug!(?op, "admin operation pending");
        self.sessions.entry(self.config.admin).or_default().begin(op);
    }

    /// Validate, mutate, persist, then acknowledge. The caller clears the
    /// slot afterwards, whatever the outcome.
    async fn apply_admin_reply(&mut self, op: PendingOp, text: &str) -> Result<(), TallyError> {
        let admin = Reply::Send(self.config.admin);
        match op {
            PendingOp::AddBalance { target } | PendingOp::DeductBalance { target } => {
                let amount = match pending::parse_whole_units(text) {
                    Ok(amount) => amount,
                    Err(e) => {
                        debug!(error = %e, "rejected admin amount");
                        let screen = Screen::with_rows(
                            "Enter a whole number only.",
                            screen::user_edit_keyboard(target),
                        );
                        self.respond(admin, screen).await;
                        return Ok(());
                    }
                };
                let Some(mut record) = self.registry.get(target).cloned() else {
                    self.respond(admin, self.admin_users_screen("User not found.")).await;
                    return Ok(());
                };
                if matches!(op, PendingOp::AddBalance { .. }) {
                    balance::credit(&mut record, amount, BalanceKind::AdminCredit);
                } else {
                    balance::debit(&mut record, amount, BalanceKind::AdminDebit);
                }
                let (name, now) = (record.display_name.clone(), record.balance);
                self.registry.commit(record)?;
                info!(user = %target, balance = now, "balance adjusted by admin");
                let screen = Screen::with_rows(
                    format!("Balance of {name} is now {}.", format_amount(now)),
                    screen::user_edit_keyboard(target),
                );
                self.respond(admin, screen).await;
            }
            PendingOp::SetWithdrawLimit => {
                let text = match pending::parse_whole_units(text) {
                    Ok(limit) => {
                        self.settings.set_withdraw_limit(limit);
                        info!(limit, "withdrawal minimum changed");
                        format!("Withdrawal minimum changed to {}.", format_amount(limit))
                    }
                    Err(_) => "Enter a whole number only.".to_string(),
                };
                self.respond(admin, Screen::with_rows(text, screen::admin_menu_keyboard())).await;
            }
            PendingOp::SetReferralReward => {
                let text = match pending::parse_decimal_cents(text) {
                    Ok(reward) => {
                        self.settings.set_referral_reward(reward);
                        info!(reward, "referral reward changed");
                        format!("Reward per referral changed to {}.", format_amount(reward))
                    }
                    Err(_) => "Enter a number only (for example 1 or 2.5).".to_string(),
                };
                self.respond(admin, Screen::with_rows(text, screen::admin_menu_keyboard())).await;
            }
            PendingOp::Broadcast => {
                let message = Screen::text(text);
                let recipients = self.registry.ids();
                let mut failed = 0usize;
                for user in &recipients {
                    if let Err(e) = self.send(*user, &message).await {
                        debug!(%user, error = %e, "broadcast delivery failed");
                        failed += 1;
                    }
                }
                info!(recipients = recipients.len(), failed, "broadcast finished");
                let ack = format!(
                    "Message sent to {} users ({failed} failed).",
                    recipients.len() - failed
                );
                self.respond(admin, Screen::with_rows(ack, screen::admin_menu_keyboard())).await;
            }
            PendingOp::EditTemplate { key } => {
                self.settings.set_template(key, text);
                info!(key = key.as_str(), "message template replaced");
                let screen = Screen::with_rows(
                    format!("Text ({}) updated.", key.as_str()),
                    screen::edit_messages_keyboard(),
                );
                self.respond(admin, screen).await;
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Screens
    // ------------------------------------------------------------------

    fn main_menu(&self, user: UserId) -> Screen {
        Screen::with_rows(
            self.settings.template(TemplateKey::MainMenu),
            screen::main_keyboard(user == self.config.admin),
        )
    }

    fn admin_settings_screen(&self) -> Screen {
        let text = self.settings.render(
            TemplateKey::AdminSettings,
            &[
                ("limit", &format_amount(self.settings.withdraw_limit())),
                ("referral", &format_amount(self.settings.referral_reward())),
            ],
        );
        Screen::with_rows(text, screen::admin_menu_keyboard())
    }

    fn admin_users_screen(&self, text: &str) -> Screen {
        Screen::with_rows(text, screen::admin_users_keyboard(self.registry.sorted()))
    }

    fn stats_screen(&self, user: UserId) -> Screen {
        let (balance, invites) = self
            .registry
            .get(user)
            .map_or((0, 0), |r| (r.balance, r.invites.len()));
        let text = self.settings.render(
            TemplateKey::Stats,
            &[
                ("balance", &format_amount(balance)),
                ("invites", &invites.to_string()),
                ("limit", &format_amount(self.settings.withdraw_limit())),
            ],
        );
        Screen::with_rows(text, screen::main_keyboard(user == self.config.admin))
    }

    fn history_screen(&self, user: UserId) -> Screen {
        let entries = self.registry.get(user).map_or(&[][..], |r| &r.history[..]);
        let mut text = String::from("Balance history (latest first):");
        if entries.is_empty() {
            text.push_str("\nNo changes yet.");
        }
        for entry in entries.iter().rev().take(HISTORY_SCREEN_ENTRIES) {
            let sign = if entry.delta < 0 { "-" } else { "+" };
            let at = chrono::DateTime::from_timestamp(entry.at, 0)
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default();
            text.push_str(&format!(
                "\n{at} {sign}{} {} -> {}",
                format_amount(entry.delta.unsigned_abs()),
                entry.kind.label(),
                format_amount(entry.balance_after)
            ));
        }
        Screen::with_rows(text, screen::back_keyboard(Action::BackToMain))
    }

    // ------------------------------------------------------------------
    // Transport
    // ------------------------------------------------------------------

    async fn send(&self, to: UserId, screen: &Screen) -> Result<(), TransportError> {
        match tokio::time::timeout(self.config.external_timeout, self.transport.send(to, screen)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout),
        }
    }

    async fn respond(&self, reply: Reply<'_>, screen: Screen) {
        let result = match reply {
            Reply::Send(to) => self.send(to, &screen).await,
            Reply::Edit(pressed) => {
                let edit = edit_if_changed(
                    self.transport.as_ref(),
                    &pressed.message,
                    &pressed.current,
                    &screen,
                );
                match tokio::time::timeout(self.config.external_timeout, edit).await {
                    Ok(Ok(outcome)) => {
                        debug!(?outcome, "message edit");
                        Ok(())
                    }
                    Ok(Err(e)) => Err(e),
                    Err(_) => Err(TransportError::Timeout),
                }
            }
        };
        if let Err(e) = result {
            warn!(error = %e, "reply not delivered");
        }
    }
}
