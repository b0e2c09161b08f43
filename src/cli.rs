use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use std::process::ExitCode;

use crate::commands::{CompletionsCommand, RotateCommand};

#[derive(Debug, Clone, Parser)]
#[command(
    name = "aws-mfa-util",
    version,
    about = "Rotate MFA-backed AWS session credentials into a credentials profile",
    long_about = None,
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    #[command(flatten)]
    pub rotate: RotateCommand,

    #[arg(short = 'v', long, global = true, action = ArgAction::Count, help = "Increase verbosity (-v info, -vv debug, -vvv trace)")]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    #[command(about = "Generate shell completion scripts for aws-mfa-util")]
    Completions(CompletionsCommand),
}

impl Cli {
    pub async fn execute(self) -> Result<ExitCode> {
        match self.command {
            Some(Commands::Completions(cmd)) => {
                cmd.execute();
                Ok(ExitCode::SUCCESS)
            }
            None => self.rotate.execute().await,
        }
    }
}
