// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the configuration module.

use std::fmt;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A value could not be deserialized into the requested type.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// An error raised by a specific configuration provider.
    #[error("provider error: {provider}: {message}")]
    ProviderError { provider: String, message: String },

    /// A generic error.
    #[error("{0}")]
    Other(String),
}

impl ConfigError {
    /// Create a new provider error.
    pub fn provider_error<P: fmt::Display, M: fmt::Display>(provider: P, message: M) -> Self {
        Self::ProviderError {
            provider: provider.to_string(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_config_error_display() {
        let error = ConfigError::ParseError("expected a sequence".to_string());
        assert_eq!(error.to_string(), "failed to parse configuration: expected a sequence");

        let error = ConfigError::Other("something else".to_string());
        assert_eq!(error.to_string(), "something else");
    }

    #[test]
    fn test_provider_error_constructor_accepts_display_types() {
        let error = ConfigError::provider_error("file", format!("failed to read {}", "surrogate.toml"));
        match &error {
            ConfigError::ProviderError { provider, message } => {
                assert_eq!(provider, "file");
                assert_eq!(message, "failed to read surrogate.toml");
            }
            other => panic!("unexpected variant: {other:?}"),
        }
        assert_eq!(error.to_string(), "provider error: file: failed to read surrogate.toml");
    }

    #[test]
    fn test_config_error_has_no_source() {
        let error = ConfigError::provider_error("env", 42);
        assert!(error.source().is_none());
    }
}
