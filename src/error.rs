//! Typed failures raised by the credential and preference stores and by input validation

use thiserror::Error;

/// Credential-store lookup and mutation failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProfileError {
    /// No section with this name exists in the credentials file
    #[error("Unknown profile: {0}")]
    UnknownProfile(String),

    /// A section with this name already exists in the credentials file
    #[error("Profile already exists: {0}")]
    DuplicateProfile(String),
}

/// Rejected workflow input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// STS GetSessionToken only accepts TOTP codes
    #[error(
        "Due to a limitation in AWS STS, U2F MFA devices are not supported ({0}). Use a TOTP app instead."
    )]
    UnsupportedMfaDevice(String),

    #[error("Failed to parse TTL: {0:?}")]
    InvalidTtl(String),
}
