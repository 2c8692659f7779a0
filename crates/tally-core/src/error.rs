//! Error types for Tally.
use thiserror::Error;

use crate::types::UserId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("backend: {0}")] Backend(String),
    #[error("encoding: {0}")] Encoding(String),
    #[error("decoding record {key}: {reason}")] Decoding { key: String, reason: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    #[error("membership lookup failed for {user} in {channel}: {reason}")] Lookup { channel: String, user: UserId, reason: String },
    #[error("membership lookup timed out")] Timeout,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("delivery to {0} failed: {1}")] Delivery(UserId, String),
    #[error("edit failed: {0}")] Edit(String),
    #[error("transport timed out")] Timeout,
}

/// Rejected free-text input from the administrator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("expected a whole non-negative number, got {0:?}")] NotWholeNumber(String),
    #[error("expected a non-negative decimal, got {0:?}")] NotDecimal(String),
    #[error("amount too large: {0}")] Overflow(String),
}

#[derive(Error, Debug)]
pub enum TallyError {
    #[error(transparent)] Store(#[from] StoreError),
    #[error(transparent)] Oracle(#[from] OracleError),
    #[error(transparent)] Transport(#[from] TransportError),
    #[error(transparent)] Input(#[from] InputError),
    #[error("unknown user: {0}")] UnknownUser(UserId),
}
