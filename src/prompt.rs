//! Plain stdin prompts for the interactive front end. The pipeline itself
//! never prompts; everything is collected up front into a `ScaffoldConfig`.

use anyhow::Result;
use std::io::{self, Write};

/// Ask for a value, returning `default` on an empty answer.
pub fn ask(question: &str, default: &str) -> Result<String> {
    print!("{question} [{default}]: ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let trimmed = input.trim();
    Ok(if trimmed.is_empty() {
        default.to_string()
    } else {
        trimmed.to_string()
    })
}

/// Yes/no prompt with a stated default.
pub fn confirm(question: &str, default: bool) -> Result<bool> {
    let hint = if default { "Y/n" } else { "y/N" };
    print!("{question} [{hint}]: ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let trimmed = input.trim().to_lowercase();
    Ok(match trimmed.as_str() {
        "" => default,
        "y" | "yes" => true,
        _ => false,
    })
}
