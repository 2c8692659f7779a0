//! Node configuration for the Tally bot.
//!
//! [`NodeConfig`] has working defaults for everything except the admin id.
//! [`NodeConfig::load`] layers an optional TOML file and `TALLY_*`
//! environment variables over those defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use tally_core::constants::{
    CENTS_PER_UNIT, DEFAULT_BOT_USERNAME, DEFAULT_CHANNEL, DEFAULT_EXTERNAL_TIMEOUT_SECS,
    DEFAULT_PERSIST_ATTEMPTS, DEFAULT_REFERRAL_REWARD, DEFAULT_WITHDRAW_LIMIT,
};
use tally_core::service::ServiceConfig;
use tally_core::settings::Settings;
use tally_core::types::UserId;

/// Configuration for a bot instance.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Root directory for all persistent data.
    pub data_dir: PathBuf,
    /// Administrator user id. Receives withdrawal requests and alerts.
    pub admin_id: i64,
    /// Channel users must join.
    pub channel: String,
    /// Bot username used in invite links.
    pub bot_username: String,
    /// Initial withdrawal minimum, in whole units.
    pub withdraw_limit_units: u64,
    /// Initial reward per referral, in cents.
    pub referral_reward_cents: u64,
    /// Ledger write attempts before a store error is reported.
    pub persist_attempts: u32,
    /// Timeout for each membership check or outbound message, in seconds.
    pub external_timeout_secs: u64,
    /// Users the console oracle reports as channel members.
    pub members: Vec<i64>,
    /// Log level filter string (e.g. "info", "debug", "tally_core=trace").
    pub log_level: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tally");

        Self {
            data_dir,
            admin_id: 0,
            channel: DEFAULT_CHANNEL.to_string(),
            bot_username: DEFAULT_BOT_USERNAME.to_string(),
            withdraw_limit_units: DEFAULT_WITHDRAW_LIMIT / CENTS_PER_UNIT,
            referral_reward_cents: DEFAULT_REFERRAL_REWARD,
            persist_attempts: DEFAULT_PERSIST_ATTEMPTS,
            external_timeout_secs: DEFAULT_EXTERNAL_TIMEOUT_SECS,
            members: Vec::new(),
            log_level: "info".to_string(),
        }
    }
}

impl NodeConfig {
    /// Defaults, then `file` (if given and present), then `TALLY_*` env vars.
    pub fn load(file: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(false));
        }
        builder
            .add_source(
                config::Environment::with_prefix("TALLY")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("members"),
            )
            .build()?
            .try_deserialize()
    }

    /// Path to the RocksDB ledger directory.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("ledger")
    }

    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            admin: UserId(self.admin_id),
            channel: self.channel.clone(),
            bot_username: self.bot_username.clone(),
            external_timeout: Duration::from_secs(self.external_timeout_secs),
        }
    }

    /// Initial runtime settings.
    pub fn settings(&self) -> Settings {
        Settings::new(
            self.withdraw_limit_units.saturating_mul(CENTS_PER_UNIT),
            self.referral_reward_cents,
        )
    }
}
