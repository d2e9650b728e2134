//! Error types for riolink operations
//!
//! Connectivity failures are not errors here: the connector reports them as
//! attempt outcomes. This module covers what a command flow or the binary can
//! actually fail with, bridged into one `RiolinkError` the CLI renders.

use thiserror::Error;

use crate::actions::ActionError;
use crate::endpoint::EndpointError;
use crate::interaction::InteractionError;
use crate::preferences::PreferenceError;

/// Core error type for riolink operations
#[derive(Error, Debug)]
pub enum RiolinkError {
    /// Prompting the user failed for a reason other than cancellation
    #[error("interaction failed: {0}")]
    Interaction(#[from] InteractionError),

    /// A preference could not be persisted or loaded
    #[error(transparent)]
    Preference(#[from] PreferenceError),

    /// An external deploy/debug/tool action failed
    #[error(transparent)]
    Action(#[from] ActionError),

    /// Team number could not be turned into an endpoint
    #[error(transparent)]
    Endpoint(#[from] EndpointError),

    /// Configuration file could not be read or parsed
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for riolink operations
pub type Result<T, E = RiolinkError> = std::result::Result<T, E>;
