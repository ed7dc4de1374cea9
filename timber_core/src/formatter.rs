//! Log line formatting.
//!
//! A formatter turns one logging call into two strings: a "pretty" one for
//! the console (colored when the terminal supports it) and a "simple" one
//! that is persisted to the log file.

use crate::inspect::inspect;
use crate::{LogLevel, Logger, Message};
use chrono::{DateTime, SecondsFormat, Utc};
use colored::{ColoredString, Colorize};
use serde::{Deserialize, Serialize};

/// Everything a formatter gets to see about a single logging call
pub struct FormatOptions<'a> {
    pub level: LogLevel,
    /// Read once per call so both renderings agree
    pub timestamp: DateTime<Utc>,
    pub messages: &'a [Message],
    pub logger: &'a Logger,
}

/// Pluggable rendering of log calls
pub trait Formatter: Send + Sync {
    fn format_console_log(&self, options: &FormatOptions<'_>) -> String;
    fn format_write_stream_log(&self, options: &FormatOptions<'_>) -> String;
}

/// Whether console output may carry ANSI colors
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Follow terminal detection and `NO_COLOR` / `CLICOLOR`
    #[default]
    Auto,
    Never,
}

/// `<timestamp> <LEVEL> [label]... <messages>`
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultFormatter {
    pub color: ColorMode,
}

impl DefaultFormatter {
    pub fn new(color: ColorMode) -> Self {
        Self { color }
    }

    pub fn colors_enabled(&self) -> bool {
        match self.color {
            ColorMode::Auto => colored::control::SHOULD_COLORIZE.should_colorize(),
            ColorMode::Never => false,
        }
    }

    fn render(&self, options: &FormatOptions<'_>, colors: bool) -> String {
        let timestamp = options.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true);
        let level = format!("{:<5}", options.level);

        let mut line = if colors {
            format!("{} {}", timestamp.dimmed(), paint_level(options.level, &level))
        } else {
            format!("{} {}", timestamp, level)
        };

        for label in options.logger.labels() {
            line.push_str(" [");
            line.push_str(&label);
            line.push(']');
        }

        let inspect_options = options.logger.inspect_options();
        for message in options.messages {
            line.push(' ');
            match message {
                Message::Text(text) => line.push_str(text),
                Message::Value(value) => line.push_str(&inspect(value, &inspect_options, colors)),
            }
        }
        line
    }
}

fn paint_level(level: LogLevel, text: &str) -> ColoredString {
    match level {
        LogLevel::Debug => text.magenta(),
        LogLevel::Info => text.cyan(),
        LogLevel::Warn => text.yellow(),
        LogLevel::Error => text.red().bold(),
    }
}

impl Formatter for DefaultFormatter {
    fn format_console_log(&self, options: &FormatOptions<'_>) -> String {
        self.render(options, self.colors_enabled())
    }

    fn format_write_stream_log(&self, options: &FormatOptions<'_>) -> String {
        self.render(options, false)
    }
}
