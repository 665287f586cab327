use std::fmt::Display;

use console::{style, StyledObject};

pub fn dim(text: impl Display) -> StyledObject<String> {
    style(text.to_string()).dim()
}

pub fn cyan(text: impl Display) -> StyledObject<String> {
    style(text.to_string()).cyan()
}

pub fn ok(text: impl Display) -> StyledObject<String> {
    style(text.to_string()).bright().green()
}

pub fn warning(text: impl Display) -> StyledObject<String> {
    style(text.to_string()).bright().yellow()
}

pub fn failure(text: impl Display) -> StyledObject<String> {
    style(text.to_string()).bright().red()
}

pub fn title(text: impl Display) -> StyledObject<String> {
    style(text.to_string()).magenta().bold()
}

/// Section heading: emoji followed by an underlined title.
pub fn heading(emoji: &str, text: &str) -> String {
    format!(
        "{} {}",
        style(emoji).bright(),
        style(text).bright().underlined()
    )
}

/// `label: value` line, indented two spaces.
pub fn field(label: &str, value: impl Display) -> String {
    format!("  {} {value}", dim(format!("{label}:")))
}
