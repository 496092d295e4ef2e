use anyhow::{Context, Result};
use checker_core::CredentialProvider;
use dialoguer::{Input, Password};

/// Credential prompts on the controlling terminal.
pub struct TerminalPrompts;

impl CredentialProvider for TerminalPrompts {
    fn login_code(&self, account_id: &str) -> Result<String> {
        Input::<String>::new()
            .with_prompt(format!("Enter the login code for {account_id}"))
            .interact_text()
            .context("failed to read login code")
    }

    fn two_factor_password(&self, account_id: &str) -> Result<String> {
        Password::new()
            .with_prompt(format!("Two-factor password for {account_id}"))
            .interact()
            .context("failed to read two-factor password")
    }
}
