//! PIN and confirmation prompts.
//!
//! `CHATLOCK_PIN` stands in for every prompt so scripts and tests can run
//! without a terminal.

use dialoguer::{Confirm, Password};
use zeroize::Zeroizing;

use chatlock_core::crypto::{validate_pin, PinPolicy};

use crate::constants::env;
use crate::errors::CliError;
use crate::ui::UiContext;

fn pin_from_env() -> Option<Zeroizing<String>> {
    std::env::var(env::PIN)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(Zeroizing::new)
}

fn no_tty_error() -> CliError {
    CliError::invalid_input(format!(
        "No PIN provided and no TTY available. Set {}.",
        env::PIN
    ))
}

/// Prompt for the PIN, or read it from `CHATLOCK_PIN`.
pub fn prompt_pin(prompt: &str, no_input: bool) -> anyhow::Result<Zeroizing<String>> {
    if let Some(pin) = pin_from_env() {
        return Ok(pin);
    }
    if no_input || !UiContext::is_interactive() {
        return Err(no_tty_error().into());
    }
    Password::new()
        .with_prompt(prompt)
        .interact()
        .map(Zeroizing::new)
        .map_err(|e| anyhow::anyhow!("Failed to read PIN: {}", e))
}

/// Prompt for a new PIN twice, or read it from `CHATLOCK_PIN`.
///
/// Returns the PIN and its confirmation; the caller validates them.
/// Interactive entry re-prompts until the pair passes `policy`.
pub fn prompt_new_pin(
    policy: &PinPolicy,
    no_input: bool,
) -> anyhow::Result<(Zeroizing<String>, Zeroizing<String>)> {
    if let Some(pin) = pin_from_env() {
        return Ok((pin.clone(), pin));
    }
    if no_input || !UiContext::is_interactive() {
        return Err(no_tty_error().into());
    }
    loop {
        let pin = Zeroizing::new(
            Password::new()
                .with_prompt(format!(
                    "New PIN ({}-{} digits)",
                    policy.min_length, policy.max_length
                ))
                .interact()
                .map_err(|e| anyhow::anyhow!("Failed to read PIN: {}", e))?,
        );
        let confirm = Zeroizing::new(
            Password::new()
                .with_prompt("Confirm PIN")
                .interact()
                .map_err(|e| anyhow::anyhow!("Failed to read PIN: {}", e))?,
        );
        match validate_pin(pin.trim(), confirm.trim(), policy) {
            Ok(()) => return Ok((pin, confirm)),
            Err(err) => eprintln!("{}", err),
        }
    }
}

/// Ask a yes/no question; non-interactive sessions must pass `--yes`.
pub fn confirm(prompt: &str, assume_yes: bool) -> anyhow::Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    if !UiContext::is_interactive() {
        return Err(CliError::invalid_input("Refusing to continue without a TTY. Pass --yes.").into());
    }
    Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| anyhow::anyhow!("Failed to read answer: {}", e))
}
