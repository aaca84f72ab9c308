//! Configuration error types.

/// Errors raised while resolving deployment configuration.
///
/// Every variant is raised before any network traffic happens, so a
/// misconfigured environment never produces a half-deployed contract.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The requested network is not in the recognized network table.
    #[error("Unknown network `{name}` (expected one of: {known})")]
    UnknownNetwork { name: String, known: String },

    /// A required environment variable is absent or empty.
    #[error("Missing required environment variable {0}")]
    MissingVar(String),

    /// An endpoint is not a well-formed http(s) URL.
    #[error("Invalid URL in {var}: {value}")]
    InvalidUrl { var: String, value: String },

    /// A value that must be an account address failed to parse.
    #[error("Invalid address in {var}: {value}")]
    InvalidAddress { var: String, value: String },

    /// A numeric setting failed to parse.
    #[error("Invalid number in {var}: {value}")]
    InvalidNumber { var: String, value: String },

    /// Verification was requested on a network that cannot support it.
    #[error("Explorer verification is unavailable on {network}: {reason}")]
    MissingExplorer { network: String, reason: String },
}
