use anyhow::{Context, Result, bail};
use dialoguer::{Confirm, Input, Select, theme::ColorfulTheme};

/// Interactive terminal input
pub trait Prompter {
    /// Pick one of `items`, preselecting `default` when it is listed
    fn choose(&mut self, prompt: &str, items: &[String], default: &str) -> Result<String>;

    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool>;

    /// Free text; an empty `default` means an answer is required
    fn input(&mut self, prompt: &str, default: &str) -> Result<String>;
}

#[derive(Default)]
pub struct TerminalPrompter {
    theme: ColorfulTheme,
}

impl Prompter for TerminalPrompter {
    fn choose(&mut self, prompt: &str, items: &[String], default: &str) -> Result<String> {
        if items.is_empty() {
            bail!("No profiles to choose from");
        }

        let default_index = items.iter().position(|item| item == default).unwrap_or(0);
        let index = Select::with_theme(&self.theme)
            .with_prompt(prompt)
            .items(items)
            .default(default_index)
            .interact()
            .with_context(|| format!("Failed to read {prompt}"))?;

        Ok(items[index].clone())
    }

    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool> {
        Confirm::with_theme(&self.theme)
            .with_prompt(prompt)
            .default(default)
            .interact()
            .with_context(|| format!("Failed to read {prompt}"))
    }

    fn input(&mut self, prompt: &str, default: &str) -> Result<String> {
        let mut input = Input::<String>::with_theme(&self.theme).with_prompt(prompt);
        if !default.is_empty() {
            input = input.default(default.to_string());
        }

        input
            .interact_text()
            .with_context(|| format!("Failed to read {prompt}"))
    }
}
