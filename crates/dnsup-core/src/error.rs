//! Error types for the reconciler
//!
//! Failures are contained to the narrowest scope that can carry on: a bad
//! subdomain ends that subdomain's pass, a bad provider config ends that
//! provider's pass, and siblings continue either way.

use crate::config::RecordType;
use thiserror::Error;

/// Result type alias for reconciler operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the reconciler
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors (missing required field, unreadable settings)
    #[error("configuration error: {0}")]
    Config(String),

    /// The provider rejected or failed a record lookup
    #[error("describe failed for {fqdn}: {message}")]
    Describe {
        /// Fully-qualified record name that was being looked up
        fqdn: String,
        /// Provider or transport failure detail
        message: String,
    },

    /// More than one record of the configured type exists for a subdomain
    #[error("{count} {record_type} records exist for {fqdn}, refusing to pick one")]
    AmbiguousRecord {
        /// Fully-qualified record name
        fqdn: String,
        /// Configured record type
        record_type: RecordType,
        /// Number of records the provider returned
        count: usize,
    },

    /// The provider rejected a record creation
    #[error("create rejected for {fqdn}: {message}")]
    Create {
        /// Fully-qualified record name
        fqdn: String,
        /// Provider failure detail
        message: String,
    },

    /// The provider rejected a record update
    #[error("update rejected for {fqdn}: {message}")]
    Update {
        /// Fully-qualified record name
        fqdn: String,
        /// Provider failure detail
        message: String,
    },

    /// Public IP resolution failed
    #[error("ip resolution failed: {0}")]
    IpResolve(String),

    /// Network-related errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a describe error
    pub fn describe(fqdn: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Describe {
            fqdn: fqdn.into(),
            message: message.into(),
        }
    }

    /// Create a create-rejected error
    pub fn create(fqdn: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Create {
            fqdn: fqdn.into(),
            message: message.into(),
        }
    }

    /// Create an update-rejected error
    pub fn update(fqdn: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Update {
            fqdn: fqdn.into(),
            message: message.into(),
        }
    }

    /// Create an IP resolution error
    pub fn ip_resolve(msg: impl Into<String>) -> Self {
        Self::IpResolve(msg.into())
    }
}

/// Helper for converting anyhow::Error at the binary boundary
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Config(err.to_string())
    }
}
