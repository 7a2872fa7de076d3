//! Error taxonomy for the window stack
//!
//! Configuration problems are fatal and surface at the point of first use.
//! Operations on windows that are not on the stack are never errors; they
//! resolve to no-ops instead.

use crate::window::WindowKind;

/// Errors raised by the window stack and its collaborators.
#[derive(Debug, thiserror::Error)]
pub enum StackError {
    /// A transition selector (or other policy value) was not recognized.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Neither the explicit windows config nor the fallback resource path
    /// produced a template for this kind.
    #[error(
        "no template for window '{kind}': not in the windows config and nothing at '{fallback_path}'"
    )]
    ConfigurationMissing {
        kind: WindowKind,
        fallback_path: String,
    },

    /// The fallback resource provider failed while reading a template.
    #[error("failed to load template for window '{kind}'")]
    TemplateLoad {
        kind: WindowKind,
        #[source]
        source: anyhow::Error,
    },

    /// The host factory could not produce an instance.
    #[error("factory failed to create window '{kind}': {reason}")]
    Factory { kind: WindowKind, reason: String },
}

impl StackError {
    /// Shorthand for [`StackError::InvalidConfiguration`].
    pub fn invalid(message: impl Into<String>) -> Self {
        StackError::InvalidConfiguration(message.into())
    }
}

/// Result alias used across the crate's public API.
pub type Result<T> = std::result::Result<T, StackError>;
