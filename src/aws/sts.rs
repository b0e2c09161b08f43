use anyhow::{Context, Result};
use aws_config::{BehaviorVersion, Region};
use aws_sdk_sts::{
    Client as StsClient,
    config::{Config as StsConfig, Credentials as StaticCredentials},
};
use tracing::{debug, info};

use super::{Credentials, ProfileRecord};

/// Provider name attached to the source profile's static keys
const SOURCE_PROVIDER_NAME: &str = "aws-mfa-util-source";

/// Everything needed to trade long-lived keys and an MFA code for a session
#[derive(Debug, Clone, Copy)]
pub struct SessionRequest<'a> {
    pub source: &'a ProfileRecord,
    pub duration_seconds: u32,
    pub mfa_serial: &'a str,
    pub mfa_code: &'a str,
    /// Region the STS request is signed for
    pub region: &'a str,
}

/// Issues temporary session credentials
#[allow(async_fn_in_trait)]
pub trait SessionIssuer {
    async fn issue(&self, request: SessionRequest<'_>) -> Result<Credentials>;
}

/// Session issuer backed by AWS STS GetSessionToken
#[derive(Debug, Clone, Copy, Default)]
pub struct StsSessionIssuer;

impl SessionIssuer for StsSessionIssuer {
    async fn issue(&self, request: SessionRequest<'_>) -> Result<Credentials> {
        info!("Calling AWS STS GetSessionToken");
        debug!("Region: {}", request.region);
        debug!("MFA device: {}", request.mfa_serial);
        debug!("Duration: {} seconds", request.duration_seconds);

        let duration_seconds =
            i32::try_from(request.duration_seconds).context("Session TTL is out of range")?;

        let source = request.source;
        let session_token =
            (!source.session_token.is_empty()).then(|| source.session_token.clone());
        let source_credentials = StaticCredentials::new(
            &source.access_key_id,
            &source.secret_access_key,
            session_token,
            None,
            SOURCE_PROVIDER_NAME,
        );

        let config = StsConfig::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(request.region.to_string()))
            .credentials_provider(source_credentials)
            .build();

        let client = StsClient::from_conf(config);

        let response = client
            .get_session_token()
            .duration_seconds(duration_seconds)
            .serial_number(request.mfa_serial)
            .token_code(request.mfa_code)
            .send()
            .await
            .context("Failed to create STS session")?;

        let sts_creds = response
            .credentials()
            .context("AWS STS returned no credentials")?;

        let credentials = Credentials {
            access_key_id: sts_creds.access_key_id().to_string(),
            secret_access_key: sts_creds.secret_access_key().to_string(),
            session_token: sts_creds.session_token().to_string(),
            expiration: *sts_creds.expiration(),
        };

        info!("Successfully obtained session credentials");
        Ok(credentials)
    }
}
