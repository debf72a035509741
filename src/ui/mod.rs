//! Terminal interaction: menus, prompts, the editor round-trip, and the
//! generation spinner.

pub mod editor;
pub mod spinner;

use std::io::BufRead;

use dialoguer::{Input, Password, Select};

use crate::error::UiError;

pub use editor::edit_in_editor;
pub use spinner::Spinner;

/// Arrow-key selection menu; returns the chosen index.
pub fn select(label: &str, options: &[&str], default: usize) -> Result<usize, UiError> {
    Select::new()
        .with_prompt(label)
        .items(options)
        .default(default.min(options.len().saturating_sub(1)))
        .interact()
        .map_err(UiError::Prompt)
}

/// Line input with a default value.
pub fn input(label: &str, default: &str) -> Result<String, UiError> {
    Input::<String>::new()
        .with_prompt(label)
        .default(default.to_string())
        .interact_text()
        .map_err(UiError::Prompt)
}

/// Hidden input for credentials.
pub fn password(label: &str) -> Result<String, UiError> {
    Password::new()
        .with_prompt(label)
        .interact()
        .map_err(UiError::Prompt)
}

/// Read one short token from stdin, lowercased and trimmed.
pub fn read_choice() -> Result<String, UiError> {
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(UiError::Io)?;
    Ok(line.trim().to_lowercase())
}
