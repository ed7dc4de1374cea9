//! Core domain types for the timber logger.
//!
//! This module defines the fundamental values passed around the system:
//! - Log levels and thresholds
//! - Message values (plain text or structured data)

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Levels
// ============================================================================

/// Log severity, ordered from least to most severe
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug = 1,
    Info = 2,
    #[serde(alias = "warning")]
    Warn = 3,
    Error = 4,
}

impl LogLevel {
    /// All levels in ascending order
    pub const ALL: [LogLevel; 4] = [
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }

    /// Whether a message at this level passes the given threshold.
    /// A `None` threshold disables the sink.
    pub fn passes(self, threshold: Option<LogLevel>) -> bool {
        threshold.is_some_and(|t| self >= t)
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(crate::Error::Config(format!("Unknown log level: {}", other))),
        }
    }
}

/// Threshold as written in configuration files, where `off` disables a sink
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LevelSetting {
    Off,
    Debug,
    Info,
    #[serde(alias = "warning")]
    Warn,
    Error,
}

impl LevelSetting {
    pub fn threshold(self) -> Option<LogLevel> {
        match self {
            Self::Off => None,
            Self::Debug => Some(LogLevel::Debug),
            Self::Info => Some(LogLevel::Info),
            Self::Warn => Some(LogLevel::Warn),
            Self::Error => Some(LogLevel::Error),
        }
    }
}

impl From<Option<LogLevel>> for LevelSetting {
    fn from(level: Option<LogLevel>) -> Self {
        match level {
            None => Self::Off,
            Some(LogLevel::Debug) => Self::Debug,
            Some(LogLevel::Info) => Self::Info,
            Some(LogLevel::Warn) => Self::Warn,
            Some(LogLevel::Error) => Self::Error,
        }
    }
}

/// File-output threshold before it is resolved against the console threshold.
///
/// Leaving it as `MirrorConsole` copies whatever the console threshold is,
/// including "disabled". `Off` disables file output even when the console is
/// enabled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WriteLevel {
    #[default]
    MirrorConsole,
    Off,
    At(LogLevel),
}

impl WriteLevel {
    pub fn resolve(self, console_level: Option<LogLevel>) -> Option<LogLevel> {
        match self {
            Self::MirrorConsole => console_level,
            Self::Off => None,
            Self::At(level) => Some(level),
        }
    }
}

impl From<Option<LogLevel>> for WriteLevel {
    fn from(level: Option<LogLevel>) -> Self {
        match level {
            Some(level) => Self::At(level),
            None => Self::Off,
        }
    }
}

impl From<LogLevel> for WriteLevel {
    fn from(level: LogLevel) -> Self {
        Self::At(level)
    }
}

impl From<Option<LevelSetting>> for WriteLevel {
    fn from(setting: Option<LevelSetting>) -> Self {
        match setting {
            None => Self::MirrorConsole,
            Some(setting) => setting.threshold().into(),
        }
    }
}

// ============================================================================
// Messages
// ============================================================================

/// A single value passed to a logging call
#[derive(Clone, Debug, PartialEq)]
pub enum Message {
    /// Printed verbatim
    Text(String),
    /// Rendered through the inspector
    Value(Value),
}

impl Message {
    /// Capture any serializable value as structured data.
    ///
    /// Serialization failures become a text placeholder so that logging
    /// never fails.
    pub fn structured<T: Serialize + ?Sized>(value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(v) => Self::Value(v),
            Err(e) => Self::Text(format!("<unserializable: {}>", e)),
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }
}

impl From<&str> for Message {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for Message {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&String> for Message {
    fn from(s: &String) -> Self {
        Self::Text(s.clone())
    }
}

impl From<Value> for Message {
    fn from(v: Value) -> Self {
        Self::Value(v)
    }
}

macro_rules! message_from_scalar {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Message {
                fn from(v: $t) -> Self {
                    Self::Value(Value::from(v))
                }
            }
        )*
    };
}

message_from_scalar!(bool, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl From<char> for Message {
    fn from(c: char) -> Self {
        Self::Text(c.to_string())
    }
}

/// Build a `Vec<Message>` from mixed values.
///
/// ```
/// use timber_core::{messages, Message};
/// let msgs = messages!["loaded", 3, serde_json::json!({ "ok": true })];
/// assert_eq!(msgs.len(), 3);
/// assert!(matches!(msgs[0], Message::Text(_)));
/// ```
#[macro_export]
macro_rules! messages {
    ($($m:expr),* $(,)?) => {
        vec![$($crate::Message::from($m)),*]
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Error);
        assert_eq!(LogLevel::Warn as u8, 3);
    }

    #[test]
    fn test_passes_threshold() {
        for low in LogLevel::ALL {
            for threshold in LogLevel::ALL {
                assert_eq!(low.passes(Some(threshold)), low >= threshold);
            }
            assert!(!low.passes(None));
        }
    }

    #[test]
    fn test_parse_level() {
        assert_eq!("WARNING".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!(" debug ".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert!("verbose".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_write_level_resolution() {
        let console = Some(LogLevel::Warn);
        assert_eq!(WriteLevel::MirrorConsole.resolve(console), console);
        assert_eq!(WriteLevel::MirrorConsole.resolve(None), None);
        assert_eq!(WriteLevel::Off.resolve(console), None);
        assert_eq!(
            WriteLevel::At(LogLevel::Debug).resolve(None),
            Some(LogLevel::Debug)
        );
    }

    #[test]
    fn test_write_level_from_setting() {
        assert_eq!(WriteLevel::from(None::<LevelSetting>), WriteLevel::MirrorConsole);
        assert_eq!(WriteLevel::from(Some(LevelSetting::Off)), WriteLevel::Off);
        assert_eq!(
            WriteLevel::from(Some(LevelSetting::Error)),
            WriteLevel::At(LogLevel::Error)
        );
    }

    #[test]
    fn test_messages_macro() {
        let msgs = messages!["a", String::from("b"), 7, json!([1, 2])];
        assert_eq!(msgs[0], Message::Text("a".into()));
        assert_eq!(msgs[1], Message::Text("b".into()));
        assert_eq!(msgs[2], Message::Value(json!(7)));
        assert_eq!(msgs[3], Message::Value(json!([1, 2])));
    }

    #[test]
    fn test_small_scalars() {
        let msgs = messages![1u8, -2i8, 300u16, -4i16, 0.5f32, 'x'];
        assert_eq!(msgs[0], Message::Value(json!(1)));
        assert_eq!(msgs[1], Message::Value(json!(-2)));
        assert_eq!(msgs[2], Message::Value(json!(300)));
        assert_eq!(msgs[3], Message::Value(json!(-4)));
        assert_eq!(msgs[4], Message::Value(json!(0.5)));
        assert_eq!(msgs[5], Message::Text("x".into()));
    }

    #[test]
    fn test_structured_message() {
        #[derive(Serialize)]
        struct Point {
            x: i32,
            y: i32,
        }
        let msg = Message::structured(&Point { x: 1, y: 2 });
        assert_eq!(msg, Message::Value(json!({ "x": 1, "y": 2 })));
    }
}
