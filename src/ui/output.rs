//! Status lines for the `kaychen` CLI

use crate::ui::Icons;
use owo_colors::{OwoColorize, Style};
use std::sync::OnceLock;

/// What a piece of CLI output is reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    /// Database paths and table names
    Heading,
    Success,
    Failure,
    Notice,
    /// Field labels and secondary values
    Muted,
}

impl Tone {
    fn style(self) -> Style {
        match self {
            Tone::Heading => Style::new().cyan().bold(),
            Tone::Success => Style::new().green().bold(),
            Tone::Failure => Style::new().red().bold(),
            Tone::Notice => Style::new().yellow(),
            Tone::Muted => Style::new().dimmed(),
        }
    }
}

fn colors_enabled() -> bool {
    static ENABLED: OnceLock<bool> = OnceLock::new();
    *ENABLED.get_or_init(|| console::Term::stdout().is_term())
}

/// Style `text` for `tone`, or leave it plain when stdout is not a terminal
pub fn paint(text: &str, tone: Tone) -> String {
    if colors_enabled() {
        text.style(tone.style()).to_string()
    } else {
        text.to_string()
    }
}

pub fn header(text: &str) {
    println!("{} {}", Icons::DATABASE, paint(text, Tone::Heading));
}

pub fn success(label: &str) {
    println!("{} {}", Icons::CHECK, paint(label, Tone::Success));
}

pub fn error(label: &str) {
    eprintln!("{} {}", Icons::CROSS, paint(label, Tone::Failure));
}

pub fn warn(label: &str) {
    eprintln!("{} {}", Icons::WARN, paint(label, Tone::Notice));
}

pub fn info(label: &str, value: &str) {
    println!("{} {}: {}", Icons::INFO, paint(label, Tone::Muted), value);
}

pub fn section(title: &str) {
    println!();
    println!("{} {}", Icons::TABLE, paint(title, Tone::Heading));
}

pub fn dim(text: &str) -> String {
    paint(text, Tone::Muted)
}
