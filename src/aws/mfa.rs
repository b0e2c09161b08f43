use regex::Regex;
use std::sync::LazyLock;

use crate::error::ValidationError;

/// ARN shape of a U2F security key registered as an IAM MFA device
static U2F_DEVICE_ARN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"arn:aws:iam::\d+:u2f/.+").expect("U2F device pattern is a valid regex")
});

/// Reject MFA devices that cannot produce a TOTP code for GetSessionToken
pub fn validate_device(device: &str) -> Result<(), ValidationError> {
    if U2F_DEVICE_ARN.is_match(device) {
        return Err(ValidationError::UnsupportedMfaDevice(device.to_string()));
    }
    Ok(())
}
