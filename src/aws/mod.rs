use aws_smithy_types::{DateTime, date_time::Format};

pub mod credentials;
pub mod mfa;
pub mod sts;

/// AWS temporary credentials structure
#[derive(Debug, Clone)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expiration: DateTime,
}

/// Render a session expiration as an RFC 3339 timestamp
pub fn format_expiration(expiration: &DateTime) -> String {
    expiration
        .fmt(Format::DateTime)
        .unwrap_or_else(|_| "unknown".to_string())
}

pub use credentials::{ProfileEntry, ProfileRecord, ProfileSet, ProfileStore};
pub use sts::{SessionIssuer, SessionRequest, StsSessionIssuer};
