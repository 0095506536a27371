use crate::traits::CountPrompt;
use anyhow::{Context, Result};
use dialoguer::{theme::ColorfulTheme, Input};

/// Reads the transfer count from the terminal.
pub struct TerminalPrompt;

impl CountPrompt for TerminalPrompt {
    fn ask_count(&self, prompt: &str) -> Result<u64> {
        Input::<u64>::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .interact_text()
            .context("Cannot read transfer count (not a terminal?)")
    }
}

/// Answers every prompt with the same count. Used for unattended runs.
#[derive(Debug, Clone, Copy)]
pub struct FixedCount(pub u64);

impl CountPrompt for FixedCount {
    fn ask_count(&self, _prompt: &str) -> Result<u64> {
        Ok(self.0)
    }
}
