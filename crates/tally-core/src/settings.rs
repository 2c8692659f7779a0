//! Process-wide program settings: withdrawal limit, referral reward and the
//! editable message templates.
//!
//! The service owns exactly one [`Settings`] value; admin edits go through
//! the setters below.

use std::collections::BTreeMap;

use crate::constants::{DEFAULT_REFERRAL_REWARD, DEFAULT_WITHDRAW_LIMIT};
use crate::types::Amount;

/// Identifies an editable message template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TemplateKey {
    MainMenu,
    Stats,
    Invite,
    WithdrawMenu,
    WithdrawFail,
    AdminSettings,
}

impl TemplateKey {
    pub const ALL: [TemplateKey; 6] = [
        Self::MainMenu,
        Self::Stats,
        Self::Invite,
        Self::WithdrawMenu,
        Self::WithdrawFail,
        Self::AdminSettings,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MainMenu => "main_menu",
            Self::Stats => "stats",
            Self::Invite => "invite",
            Self::WithdrawMenu => "withdraw_menu",
            Self::WithdrawFail => "withdraw_fail",
            Self::AdminSettings => "admin_settings",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == s)
    }

    fn default_text(&self) -> &'static str {
        match self {
            Self::MainMenu => {
                "Welcome to the rewards bot!\nPick an option below.\n\n\
                 Note: only real accounts count toward referrals and rewards."
            }
            Self::Stats => {
                "Your balance: {balance}\nPeople invited: {invites}\n\
                 (withdrawals open at {limit})"
            }
            Self::Invite => "Share this link to invite your friends and earn rewards:\n{link}",
            Self::WithdrawMenu => "Choose the payment method that suits you:",
            Self::WithdrawFail => {
                "Your balance ({balance}) is below the withdrawal minimum ({limit}).\n\
                 You can submit a request once you reach {limit}."
            }
            Self::AdminSettings => {
                "Admin settings:\n- Withdrawal minimum: {limit}\n\
                 - Referral reward: {referral}\nChoose an option:"
            }
        }
    }
}

/// Substitute `{name}` placeholders in `template`.
///
/// Unknown placeholders are left as they are; admins may edit templates
/// freely and a typo must not break rendering.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (name, value) in vars {
        out = out.replace(&format!("{{{name}}}"), value);
    }
    out
}

#[derive(Debug, Clone)]
pub struct Settings {
    withdraw_limit: Amount,
    referral_reward: Amount,
    templates: BTreeMap<TemplateKey, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self::new(DEFAULT_WITHDRAW_LIMIT, DEFAULT_REFERRAL_REWARD)
    }
}

impl Settings {
    pub fn new(withdraw_limit: Amount, referral_reward: Amount) -> Self {
        let templates = TemplateKey::ALL
            .into_iter()
            .map(|key| (key, key.default_text().to_string()))
            .collect();
        Self {
            withdraw_limit,
            referral_reward,
            templates,
        }
    }

    pub fn withdraw_limit(&self) -> Amount {
        self.withdraw_limit
    }

    pub fn set_withdraw_limit(&mut self, limit: Amount) {
        self.withdraw_limit = limit;
    }

    pub fn referral_reward(&self) -> Amount {
        self.referral_reward
    }

    pub fn set_referral_reward(&mut self, reward: Amount) {
        self.referral_reward = reward;
    }

    pub fn template(&self, key: TemplateKey) -> &str {
        self.templates
            .get(&key)
            .map(String::as_str)
            .unwrap_or_else(|| key.default_text())
    }

    pub fn set_template(&mut self, key: TemplateKey, text: impl Into<String>) {
        self.templates.insert(key, text.into());
    }

    /// Render the template for `key` with the given placeholder values.
    pub fn render(&self, key: TemplateKey, vars: &[(&str, &str)]) -> String {
        render(self.template(key), vars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_key_round_trips_through_its_name() {
        for key in TemplateKey::ALL {
            assert_eq!(TemplateKey::parse(key.as_str()), Some(key));
        }
        assert_eq!(TemplateKey::parse("missing"), None);
    }

    #[test]
    fn render_fills_known_placeholders_only() {
        let out = render("{a} and {b} and {c}", &[("a", "1"), ("b", "2")]);
        assert_eq!(out, "1 and 2 and {c}");
    }

    #[test]
    fn setters_replace_values() {
        let mut s = Settings::default();
        s.set_withdraw_limit(1_000);
        s.set_referral_reward(250);
        s.set_template(TemplateKey::Invite, "go: {link}");
        assert_eq!(s.withdraw_limit(), 1_000);
        assert_eq!(s.referral_reward(), 250);
        assert_eq!(s.render(TemplateKey::Invite, &[("link", "x")]), "go: x");
    }

    #[test]
    fn defaults_match_constants() {
        let s = Settings::default();
        assert_eq!(s.withdraw_limit(), DEFAULT_WITHDRAW_LIMIT);
        assert_eq!(s.referral_reward(), DEFAULT_REFERRAL_REWARD);
    }
}
