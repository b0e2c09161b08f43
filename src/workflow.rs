//! One interactive credential rotation.
//!
//! Each value can be supplied up front; anything missing is asked for, with
//! defaults taken from what was chosen the last time the same source profile
//! was rotated. Choices are persisted before STS is called so they survive a
//! rejected code, and the credentials file is only touched once a session has
//! been issued and any overwrite has been confirmed.

use anyhow::{Context, Result};
use aws_smithy_types::DateTime;
use tracing::{debug, info};

use crate::{
    aws::{ProfileRecord, ProfileSet, ProfileStore, SessionIssuer, SessionRequest, mfa},
    constants::{self, DEFAULT_SESSION_TTL_SECONDS, DEFAULT_STS_REGION},
    error::{ProfileError, ValidationError},
    preferences::{PreferenceStore, SourceProfilePreference},
    prompt::Prompter,
};

/// Values known before the workflow starts; `None` means ask
#[derive(Debug, Clone, Default)]
pub struct RotationInputs {
    pub source: Option<String>,
    pub destination: Option<String>,
    pub mfa_device: Option<String>,
    pub mfa_code: Option<String>,
    /// Zero is treated the same as absent
    pub ttl: Option<u32>,
    pub region: Option<String>,
    /// Replace an existing destination profile without asking
    pub overwrite: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RotationOutcome {
    /// Session credentials were written to `destination`
    Rotated {
        destination: String,
        expiration: DateTime,
    },
    /// The user refused to overwrite `destination`; nothing was written
    Declined { destination: String },
}

pub struct RotationWorkflow<P, S> {
    profiles: ProfileStore,
    preferences: PreferenceStore,
    prompter: P,
    issuer: S,
}

impl<P: Prompter, S: SessionIssuer> RotationWorkflow<P, S> {
    pub fn new(profiles: ProfileStore, preferences: PreferenceStore, prompter: P, issuer: S) -> Self {
        Self {
            profiles,
            preferences,
            prompter,
            issuer,
        }
    }

    pub async fn run(mut self, inputs: RotationInputs) -> Result<RotationOutcome> {
        let mut preferences = self.preferences.load().await;
        let mut profiles = self
            .profiles
            .load()
            .await
            .context("Failed to load AWS credentials")?;

        let source = self.resolve_source(inputs.source, &profiles, &preferences.last_source_profile)?;
        let prior = preferences.source_profile(&source).cloned();
        debug!("Previous rotation recorded for {}: {}", source, prior.is_some());

        let destination =
            self.resolve_destination(inputs.destination, &source, prior.as_ref(), &mut profiles)?;
        let device = self.resolve_device(inputs.mfa_device, prior.as_ref())?;
        mfa::validate_device(&device)?;
        let ttl = self.resolve_ttl(inputs.ttl, prior.as_ref())?;
        let region = inputs
            .region
            .or_else(|| Some(preferences.last_region.clone()).filter(|r| !r.is_empty()))
            .unwrap_or_else(|| DEFAULT_STS_REGION.to_string());

        preferences.record(&source, &device, &destination, ttl);
        preferences.last_region.clone_from(&region);
        self.preferences
            .save(&preferences)
            .await
            .context("Failed to save config")?;

        let code = match inputs.mfa_code {
            Some(code) => code,
            None => self.prompter.input("MFA Code", "")?,
        };

        let source_record = &profiles
            .get(&source)
            .ok_or_else(|| ProfileError::UnknownProfile(source.clone()))?
            .record;
        let session = self
            .issuer
            .issue(SessionRequest {
                source: source_record,
                duration_seconds: ttl,
                mfa_serial: &device,
                mfa_code: &code,
                region: &region,
            })
            .await?;

        let is_new = profiles.get(&destination).is_some_and(|entry| entry.is_new());
        if !is_new
            && !inputs.overwrite
            && !self
                .prompter
                .confirm("Overwrite existing AWS profile?", true)?
        {
            info!("Keeping existing profile {}", destination);
            return Ok(RotationOutcome::Declined { destination });
        }

        profiles.mark_changed(&destination, ProfileRecord::from(&session))?;
        self.profiles
            .save(&profiles)
            .await
            .context("Failed to save credentials")?;

        Ok(RotationOutcome::Rotated {
            destination,
            expiration: session.expiration,
        })
    }

    fn resolve_source(
        &mut self,
        supplied: Option<String>,
        profiles: &ProfileSet,
        last_source: &str,
    ) -> Result<String> {
        let source = match supplied {
            Some(name) => name,
            None => self
                .prompter
                .choose("Source profile name", profiles.names(), last_source)?,
        };

        if !profiles.contains(&source) {
            return Err(ProfileError::UnknownProfile(source).into());
        }
        Ok(source)
    }

    fn resolve_destination(
        &mut self,
        supplied: Option<String>,
        source: &str,
        prior: Option<&SourceProfilePreference>,
        profiles: &mut ProfileSet,
    ) -> Result<String> {
        let destination = match supplied {
            Some(name) => name,
            None => self.prompt_destination(source, prior, profiles)?,
        };

        if !profiles.contains(&destination) {
            return Err(ProfileError::UnknownProfile(destination).into());
        }
        Ok(destination)
    }

    fn prompt_destination(
        &mut self,
        source: &str,
        prior: Option<&SourceProfilePreference>,
        profiles: &mut ProfileSet,
    ) -> Result<String> {
        if self
            .prompter
            .confirm("Create a new destination profile?", prior.is_none())?
        {
            let name = self.prompter.input(
                "New profile name",
                &constants::default_destination_profile(source),
            )?;
            profiles.create_profile(&name)?;
            info!("Creating new profile {}", name);
            return Ok(name);
        }

        let default = prior.map_or("", |p| p.destination_profile.as_str());
        self.prompter
            .choose("Destination profile name", profiles.names(), default)
    }

    fn resolve_device(
        &mut self,
        supplied: Option<String>,
        prior: Option<&SourceProfilePreference>,
    ) -> Result<String> {
        match supplied {
            Some(device) => Ok(device),
            None => {
                let default = prior.map_or("", |p| p.mfa_device.as_str());
                self.prompter.input("MFA device ID", default)
            }
        }
    }

    fn resolve_ttl(
        &mut self,
        supplied: Option<u32>,
        prior: Option<&SourceProfilePreference>,
    ) -> Result<u32> {
        if let Some(ttl) = supplied.filter(|ttl| *ttl > 0) {
            return Ok(ttl);
        }

        let default = prior
            .map(|p| p.ttl)
            .filter(|ttl| *ttl > 0)
            .unwrap_or(DEFAULT_SESSION_TTL_SECONDS);
        let answer = self.prompter.input("Session TTL", &default.to_string())?;

        let ttl = answer.trim().parse::<u32>();
        ttl.map_err(|_| ValidationError::InvalidTtl(answer).into())
    }
}
