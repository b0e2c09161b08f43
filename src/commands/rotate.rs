use anyhow::Result;
use clap::Args;
use std::process::ExitCode;
use tracing::info;

use crate::{
    aws::{self, ProfileStore, StsSessionIssuer},
    preferences::PreferenceStore,
    prompt::TerminalPrompter,
    workflow::{RotationInputs, RotationOutcome, RotationWorkflow},
};

/// Values left out on the command line are asked for interactively
#[derive(Debug, Clone, Default, Args)]
pub struct RotateCommand {
    #[arg(long, help = "Source AWS profile")]
    pub src: Option<String>,

    #[arg(long, help = "Destination AWS profile")]
    pub dst: Option<String>,

    #[arg(long, help = "MFA device ID")]
    pub device: Option<String>,

    #[arg(long, help = "MFA code")]
    pub code: Option<String>,

    #[arg(long, help = "Session token lifetime in seconds")]
    pub ttl: Option<u32>,

    #[arg(long, help = "Overwrite existing destination profile")]
    pub overwrite: bool,

    #[arg(long, help = "Region used to sign the STS request [default: aws-global]")]
    pub region: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl RotateCommand {
    fn into_inputs(self) -> RotationInputs {
        RotationInputs {
            source: non_empty(self.src),
            destination: non_empty(self.dst),
            mfa_device: non_empty(self.device),
            mfa_code: non_empty(self.code),
            ttl: self.ttl.filter(|ttl| *ttl > 0),
            region: non_empty(self.region),
            overwrite: self.overwrite,
        }
    }

    pub async fn execute(self) -> Result<ExitCode> {
        let profiles = ProfileStore::from_default_path()?;
        let preferences = PreferenceStore::from_default_path()?;
        info!("Using credentials file {}", profiles.path().display());

        let workflow = RotationWorkflow::new(
            profiles,
            preferences,
            TerminalPrompter::default(),
            StsSessionIssuer,
        );

        match workflow.run(self.into_inputs()).await? {
            RotationOutcome::Rotated {
                destination,
                expiration,
            } => {
                println!("\nSession created! Credentials saved to {destination} profile.");
                println!("Expires: {}", aws::format_expiration(&expiration));
                Ok(ExitCode::SUCCESS)
            }
            RotationOutcome::Declined { destination } => {
                eprintln!("Aborting... profile {destination} was left unchanged.");
                Ok(ExitCode::FAILURE)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_values_are_prompted() {
        let cmd = RotateCommand {
            src: Some(String::new()),
            dst: Some("alice-mfa".to_string()),
            ttl: Some(0),
            ..RotateCommand::default()
        };

        let inputs = cmd.into_inputs();
        assert_eq!(inputs.source, None);
        assert_eq!(inputs.destination.as_deref(), Some("alice-mfa"));
        assert_eq!(inputs.ttl, None);
        assert!(!inputs.overwrite);
    }

    #[test]
    fn test_supplied_values_pass_through() {
        let cmd = RotateCommand {
            src: Some("alice".to_string()),
            device: Some("GAHT12345678".to_string()),
            code: Some("123456".to_string()),
            ttl: Some(900),
            overwrite: true,
            region: Some("us-west-2".to_string()),
            ..RotateCommand::default()
        };

        let inputs = cmd.into_inputs();
        assert_eq!(inputs.source.as_deref(), Some("alice"));
        assert_eq!(inputs.mfa_device.as_deref(), Some("GAHT12345678"));
        assert_eq!(inputs.mfa_code.as_deref(), Some("123456"));
        assert_eq!(inputs.ttl, Some(900));
        assert_eq!(inputs.region.as_deref(), Some("us-west-2"));
        assert!(inputs.overwrite);
    }
}
