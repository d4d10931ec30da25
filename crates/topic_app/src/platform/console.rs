//! Line-oriented command parser for the interactive console.

use std::path::PathBuf;

use thiserror::Error;
use topic_core::{DraftField, Screen, SettingsEdit, SettingsError, Slot};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ConsoleCommand {
    Screen(Screen),
    Input { slot: Slot, path: PathBuf },
    Set { slot: Slot, field: DraftField, value: String },
    Config(SettingsEdit),
    Submit(Slot),
    Cancel(Slot),
    Show,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum ConsoleError {
    #[error("unknown command '{0}', type 'help' for a list")]
    UnknownCommand(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("{0}")]
    InvalidArgument(String),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

/// Parses one console line. Blank lines and `#` comments yield `None`.
pub(crate) fn parse(line: &str) -> Result<Option<ConsoleCommand>, ConsoleError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let (verb, rest) = split_word(line);

    let command = match verb.to_ascii_lowercase().as_str() {
        "screen" | "tab" => {
            let name = required(rest, "screen <preprocess|modeling|visualization|settings>")?;
            ConsoleCommand::Screen(name.parse().map_err(ConsoleError::InvalidArgument)?)
        }
        "input" => {
            const USAGE: &str = "input <slot> <path>";
            let (slot, path) = split_word(required(rest, USAGE)?);
            ConsoleCommand::Input {
                slot: parse_slot(slot)?,
                path: PathBuf::from(required(path, USAGE)?),
            }
        }
        "set" => {
            const USAGE: &str = "set <slot> <field> <value>";
            let (slot, rest) = split_word(required(rest, USAGE)?);
            let (field, value) = split_word(required(rest, USAGE)?);
            ConsoleCommand::Set {
                slot: parse_slot(slot)?,
                field: field.parse().map_err(ConsoleError::InvalidArgument)?,
                value: required(value, USAGE)?.to_string(),
            }
        }
        "config" => {
            let (key, value) = split_word(required(rest, "config <key> <value>")?);
            ConsoleCommand::Config(SettingsEdit::parse(key, value)?)
        }
        "submit" | "run" => ConsoleCommand::Submit(parse_slot(required(rest, "submit <slot>")?)?),
        "cancel" => ConsoleCommand::Cancel(parse_slot(required(rest, "cancel <slot>")?)?),
        "show" | "status" => ConsoleCommand::Show,
        "help" | "?" => ConsoleCommand::Help,
        "quit" | "exit" => ConsoleCommand::Quit,
        _ => return Err(ConsoleError::UnknownCommand(verb.to_string())),
    };
    Ok(Some(command))
}

fn split_word(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    match text.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (text, ""),
    }
}

fn required<'a>(text: &'a str, usage: &'static str) -> Result<&'a str, ConsoleError> {
    if text.trim().is_empty() {
        Err(ConsoleError::Usage(usage))
    } else {
        Ok(text.trim())
    }
}

fn parse_slot(text: &str) -> Result<Slot, ConsoleError> {
    text.parse().map_err(ConsoleError::InvalidArgument)
}
