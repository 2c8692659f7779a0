//! Button actions and their wire encoding as callback data.
//!
//! Callback data is a short ASCII tag, optionally followed by `_` and a
//! parameter (`add_1234`, `pay_3`, `msg_edit_stats`). Unknown or malformed
//! data decodes to `None` and is ignored by the service.

use std::fmt;

use crate::settings::TemplateKey;
use crate::types::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    VerifySubscription,
    Stats,
    Invite,
    Withdraw,
    PickPayment(usize),
    BackToWithdraw,
    History,
    BackToMain,
    Settings,
    AdminUsers,
    AdminUser(UserId),
    AdminPanel,
    AddBalance(UserId),
    DeductBalance(UserId),
    Ban(UserId),
    SetWithdrawLimit,
    SetReferralReward,
    Broadcast,
    EditMessages,
    EditTemplate(TemplateKey),
    Nothing,
}

impl Action {
    /// Decode callback data.
    pub fn parse(data: &str) -> Option<Self> {
        let fixed = match data {
            "verify_subs" => Some(Self::VerifySubscription),
            "stats" => Some(Self::Stats),
            "invite" => Some(Self::Invite),
            "withdraw" => Some(Self::Withdraw),
            "back_withdraw" => Some(Self::BackToWithdraw),
            "history" => Some(Self::History),
            "back_main" => Some(Self::BackToMain),
            "settings" => Some(Self::Settings),
            "admin_users" => Some(Self::AdminUsers),
            "admin_panel" => Some(Self::AdminPanel),
            "set_limit" => Some(Self::SetWithdrawLimit),
            "edit_referral" => Some(Self::SetReferralReward),
            "broadcast" => Some(Self::Broadcast),
            "edit_msgs" => Some(Self::EditMessages),
            "none" => Some(Self::Nothing),
            _ => None,
        };
        if fixed.is_some() {
            return fixed;
        }

        if let Some(key) = data.strip_prefix("msg_edit_") {
            return TemplateKey::parse(key).map(Self::EditTemplate);
        }
        let (tag, param) = data.split_once('_')?;
        if param.is_empty() || !param.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        match tag {
            "pay" => param.parse().ok().map(Self::PickPayment),
            "admin" => param.parse().ok().map(Self::AdminUser),
            "add" => param.parse().ok().map(Self::AddBalance),
            "dec" => param.parse().ok().map(Self::DeductBalance),
            "ban" => param.parse().ok().map(Self::Ban),
            _ => None,
        }
    }

    /// Whether only the administrator may trigger this action.
    pub fn is_admin_only(&self) -> bool {
        matches!(
            self,
            Self::Settings
                | Self::AdminUsers
                | Self::AdminUser(_)
                | Self::AdminPanel
                | Self::AddBalance(_)
                | Self::DeductBalance(_)
                | Self::Ban(_)
                | Self::SetWithdrawLimit
                | Self::SetReferralReward
                | Self::Broadcast
                | Self::EditMessages
                | Self::EditTemplate(_)
        )
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VerifySubscription => f.write_str("verify_subs"),
            Self::Stats => f.write_str("stats"),
            Self::Invite => f.write_str("invite"),
            Self::Withdraw => f.write_str("withdraw"),
            Self::PickPayment(i) => write!(f, "pay_{i}"),
            Self::BackToWithdraw => f.write_str("back_withdraw"),
            Self::History => f.write_str("history"),
            Self::BackToMain => f.write_str("back_main"),
            Self::Settings => f.write_str("settings"),
            Self::AdminUsers => f.write_str("admin_users"),
            Self::AdminUser(id) => write!(f, "admin_{id}"),
            Self::AdminPanel => f.write_str("admin_panel"),
            Self::AddBalance(id) => write!(f, "add_{id}"),
            Self::DeductBalance(id) => write!(f, "dec_{id}"),
            Self::Ban(id) => write!(f, "ban_{id}"),
            Self::SetWithdrawLimit => f.write_str("set_limit"),
            Self::SetReferralReward => f.write_str("edit_referral"),
            Self::Broadcast => f.write_str("broadcast"),
            Self::EditMessages => f.write_str("edit_msgs"),
            Self::EditTemplate(key) => write!(f, "msg_edit_{}", key.as_str()),
            Self::Nothing => f.write_str("none"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameterized_actions_decode() {
        assert_eq!(Action::parse("add_42"), Some(Action::AddBalance(UserId(42))));
        assert_eq!(Action::parse("dec_7"), Some(Action::DeductBalance(UserId(7))));
        assert_eq!(Action::parse("pay_3"), Some(Action::PickPayment(3)));
        assert_eq!(
            Action::parse("msg_edit_stats"),
            Some(Action::EditTemplate(TemplateKey::Stats))
        );
    }

    #[test]
    fn admin_panel_is_not_a_user_id() {
        assert_eq!(Action::parse("admin_panel"), Some(Action::AdminPanel));
        assert_eq!(Action::parse("admin_99"), Some(Action::AdminUser(UserId(99))));
    }

    #[test]
    fn malformed_data_is_rejected() {
        assert_eq!(Action::parse("pay_x"), None);
        assert_eq!(Action::parse("add_-5"), None);
        assert_eq!(Action::parse("ban_"), None);
        assert_eq!(Action::parse("msg_edit_nope"), None);
        assert_eq!(Action::parse(""), None);
    }

    #[test]
    fn encoding_matches_parsing() {
        let actions = [
            Action::AdminUser(UserId(5)),
            Action::PickPayment(12),
            Action::EditTemplate(TemplateKey::WithdrawFail),
            Action::Nothing,
        ];
        for action in actions {
            assert_eq!(Action::parse(&action.to_string()), Some(action));
        }
    }

    #[test]
    fn user_actions_are_open_to_everyone() {
        assert!(!Action::Stats.is_admin_only());
        assert!(!Action::PickPayment(0).is_admin_only());
        assert!(Action::Ban(UserId(1)).is_admin_only());
    }
}
