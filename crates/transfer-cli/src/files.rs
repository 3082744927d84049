//! Key and recipient list files.
//!
//! One entry per line. Lines are trimmed; blank lines and `#` comments are ignored. Entries that
//! fail to parse are skipped with a warning carrying their line number, never their content
//! for keys.

use std::path::Path;
use std::str::FromStr;

use eyre::{Result, WrapErr};
use transfer_dispatcher::{ConfigError, Credential, RecipientAddress};

/// Non-empty, non-comment lines of `text` with their one-based line numbers.
pub fn entries(text: &str) -> Vec<(usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .collect()
}

pub fn read_lines(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).wrap_err_with(|| format!("Failed to read {}", path.display()))
}

pub fn read_credentials(path: &Path) -> Result<Vec<Credential>> {
    let text = read_lines(path)?;
    Ok(parse_credentials(&text, &path.display().to_string())?)
}

pub fn read_recipients(path: &Path) -> Result<Vec<RecipientAddress>> {
    let text = read_lines(path)?;
    Ok(parse_recipients(&text, &path.display().to_string())?)
}

pub fn parse_credentials(text: &str, source: &str) -> Result<Vec<Credential>, ConfigError> {
    collect_valid(text, source, |line, _| {
        tracing::warn!(source, line, "Skipping invalid private key");
    })
}

pub fn parse_recipients(text: &str, source: &str) -> Result<Vec<RecipientAddress>, ConfigError> {
    collect_valid(text, source, |line, entry| {
        tracing::warn!(source, line, entry, "Skipping invalid address");
    })
}

fn collect_valid<T, F>(text: &str, source: &str, mut on_skip: F) -> Result<Vec<T>, ConfigError>
where
    T: FromStr,
    F: FnMut(usize, &str),
{
    let mut valid = Vec::new();
    for (line, entry) in entries(text) {
        match entry.parse::<T>() {
            Ok(item) => valid.push(item),
            Err(_) => on_skip(line, entry),
        }
    }
    if valid.is_empty() {
        return Err(ConfigError::EmptyInput(source.to_string()));
    }
    Ok(valid)
}
