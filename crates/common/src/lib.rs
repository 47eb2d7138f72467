//! # Common library
//!
//! This crate contains the shared [`Config`] struct used to configurate
//! services within the workspace, logging bootstrap utilities and the
//! wire signature primitive shared between the server and the host client.
//!
//! [`Config`]: config::Config

/// Shared workspace configuration.
pub mod config;

/// Logging utilities.
#[cfg(feature = "logging")]
pub mod logging;

/// Node message signature primitive.
pub mod signature;
