//! Yes/no confirmation collaborators.

use dialoguer::Confirm as Prompt;

use commonlink_core::SyncError;

/// Asks the user a yes/no question.
pub trait Confirm: Send + Sync {
    /// Ask `prompt`, returning `default` if the user just presses enter.
    fn confirm(&self, prompt: &str, default: bool) -> Result<bool, SyncError>;
}

/// Interactive prompt on the controlling terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalConfirm;

impl Confirm for TerminalConfirm {
    fn confirm(&self, prompt: &str, default: bool) -> Result<bool, SyncError> {
        Prompt::new()
            .with_prompt(prompt)
            .default(default)
            .interact()
            .map_err(|e| SyncError::Prompt {
                message: e.to_string(),
            })
    }
}

/// Always gives the same answer without asking.
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

impl Confirm for FixedAnswer {
    fn confirm(&self, _prompt: &str, _default: bool) -> Result<bool, SyncError> {
        Ok(self.0)
    }
}
