use clap::{Args, CommandFactory};
use clap_complete::Shell;
use std::io;

use crate::cli::Cli;

#[derive(Debug, Clone, Args)]
pub struct CompletionsCommand {
    #[arg(value_enum, help = "Target shell for completion script")]
    pub shell: Shell,
}

impl CompletionsCommand {
    pub fn execute(self) {
        self.write_to(&mut io::stdout());
    }

    fn write_to(&self, out: &mut dyn io::Write) {
        let mut cmd = Cli::command();
        let app_name = cmd.get_name().to_string();
        clap_complete::generate(self.shell, &mut cmd, app_name, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generate(shell: Shell) -> String {
        let mut buffer = Vec::new();
        CompletionsCommand { shell }.write_to(&mut buffer);
        String::from_utf8(buffer).unwrap_or_default()
    }

    #[test]
    fn test_bash_completion() {
        let script = generate(Shell::Bash);
        assert!(script.contains("COMPREPLY"));
        assert!(script.contains("aws-mfa-util"));
    }

    #[test]
    fn test_zsh_completion() {
        let script = generate(Shell::Zsh);
        assert!(script.contains("#compdef aws-mfa-util"));
    }

    #[test]
    fn test_completion_contains_rotation_flags() {
        for shell in [Shell::Bash, Shell::Zsh, Shell::Fish] {
            let script = generate(shell);
            for flag in ["src", "dst", "device", "code", "ttl", "overwrite"] {
                assert!(
                    script.contains(flag),
                    "{flag} should be in {shell} completions"
                );
            }
            assert!(script.contains("completions"));
        }
    }
}
