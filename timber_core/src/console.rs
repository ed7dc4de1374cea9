//! Console output channels.

use crate::LogLevel;
use std::io::Write;

/// Level-specific console output.
///
/// Each channel receives a fully formatted line without a trailing newline.
/// Implementations must not fail; write errors are dropped.
pub trait ConsoleSink: Send + Sync {
    fn debug(&self, line: &str);
    fn info(&self, line: &str);
    fn warn(&self, line: &str);
    fn error(&self, line: &str);

    /// Route a line to the channel for `level`
    fn write(&self, level: LogLevel, line: &str) {
        match level {
            LogLevel::Debug => self.debug(line),
            LogLevel::Info => self.info(line),
            LogLevel::Warn => self.warn(line),
            LogLevel::Error => self.error(line),
        }
    }
}

/// Debug and info go to stdout, warn and error to stderr
#[derive(Clone, Copy, Debug, Default)]
pub struct StdConsole;

impl StdConsole {
    fn stdout(line: &str) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{}", line);
    }

    fn stderr(line: &str) {
        let mut err = std::io::stderr().lock();
        let _ = writeln!(err, "{}", line);
    }
}

impl ConsoleSink for StdConsole {
    fn debug(&self, line: &str) {
        Self::stdout(line)
    }

    fn info(&self, line: &str) {
        Self::stdout(line)
    }

    fn warn(&self, line: &str) {
        Self::stderr(line)
    }

    fn error(&self, line: &str) {
        Self::stderr(line)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Records every line together with the channel it arrived on
    #[derive(Default)]
    pub struct CaptureConsole {
        pub lines: Mutex<Vec<(LogLevel, String)>>,
    }

    impl CaptureConsole {
        pub fn take(&self) -> Vec<(LogLevel, String)> {
            std::mem::take(&mut *self.lines.lock().unwrap())
        }

        fn push(&self, level: LogLevel, line: &str) {
            self.lines.lock().unwrap().push((level, line.to_string()));
        }
    }

    impl ConsoleSink for CaptureConsole {
        fn debug(&self, line: &str) {
            self.push(LogLevel::Debug, line)
        }

        fn info(&self, line: &str) {
            self.push(LogLevel::Info, line)
        }

        fn warn(&self, line: &str) {
            self.push(LogLevel::Warn, line)
        }

        fn error(&self, line: &str) {
            self.push(LogLevel::Error, line)
        }
    }

    #[test]
    fn test_write_routes_by_level() {
        let console = CaptureConsole::default();
        for level in LogLevel::ALL {
            console.write(level, level.as_str());
        }
        let lines = console.take();
        assert_eq!(lines.len(), 4);
        for (level, line) in lines {
            assert_eq!(level.as_str(), line);
        }
    }
}
