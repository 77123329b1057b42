//! Interactive command parsing
//!
//! Accepted lines:
//! - `0 2`, `0,2`, `(0, 2)` - run with detector settings
//! - `history` / `h`        - list runs
//! - `stats`                - correlation table
//! - `save [PATH]`          - write history (format from extension)
//! - `help` / `?`
//! - `quit` / `exit` / `q`

use std::path::PathBuf;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Two integers separated by a comma and/or whitespace, optional parens
    static ref RE_RUN: Regex = Regex::new(
        r"^\(?\s*([+-]?\d+)\s*(?:,\s*|\s+)([+-]?\d+)\s*\)?$"
    ).unwrap();

    static ref RE_SAVE: Regex = Regex::new(
        r"(?i)^save(?:\s+(\S.*))?$"
    ).unwrap();
}

/// A parsed interactive command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run with raw settings; validation happens in the device
    Run(String, String),
    History,
    Stats,
    Save(Option<PathBuf>),
    Help,
    Quit,
}

/// Parse one input line, `None` if unrecognized
pub fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();

    if let Some(caps) = RE_RUN.captures(line) {
        return Some(Command::Run(caps[1].to_string(), caps[2].to_string()));
    }

    if let Some(caps) = RE_SAVE.captures(line) {
        let path = caps.get(1).map(|m| PathBuf::from(m.as_str().trim()));
        return Some(Command::Save(path));
    }

    match line.to_ascii_lowercase().as_str() {
        "history" | "h" => Some(Command::History),
        "stats" => Some(Command::Stats),
        "help" | "?" => Some(Command::Help),
        "quit" | "exit" | "q" => Some(Command::Quit),
        _ => None,
    }
}
