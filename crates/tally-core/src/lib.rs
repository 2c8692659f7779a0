//! # tally-core
//! Types, traits and program logic for the Tally referral bot:
//! - [`registry::Registry`]: in-memory user records over a [`traits::LedgerStore`]
//! - [`referral`]: invite parsing and exactly-once referral credit
//! - [`balance`]: balance changes with a user-visible history
//! - [`pending`]: the admin's single pending-operation slot
//! - [`payment`]: withdrawal method selection and request forwarding
//! - [`service::Service`]: event handlers wiring it all together

pub mod action;
pub mod balance;
pub mod constants;
pub mod error;
pub mod event;
pub mod ledger;
pub mod payment;
pub mod pending;
pub mod referral;
pub mod registry;
pub mod screen;
pub mod service;
pub mod settings;
pub mod traits;
pub mod types;
