//! Hierarchical logger.
//!
//! A [`Logger`] is a cheap handle; clones of the handle refer to the same
//! logger. Loggers form a tree through their optional parent: events
//! published on a child are re-published on every ancestor, and a file
//! stream assigned to a child is shared upward with ancestors that have none.

use crate::console::{ConsoleSink, StdConsole};
use crate::formatter::{DefaultFormatter, FormatOptions, Formatter};
use crate::inspect::InspectOptions;
use crate::stream::{FileStreamOptions, FileWriteStream};
use crate::{Error, LogLevel, Message, Result, WriteLevel};
use chrono::Utc;
use once_cell::sync::Lazy;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

static DEFAULT_FORMATTER: Lazy<Arc<dyn Formatter>> =
    Lazy::new(|| Arc::new(DefaultFormatter::default()) as Arc<dyn Formatter>);

static DEFAULT_CONSOLE: Lazy<Arc<dyn ConsoleSink>> =
    Lazy::new(|| Arc::new(StdConsole) as Arc<dyn ConsoleSink>);

/// Payload delivered to subscribers for every logging call
#[derive(Clone)]
pub struct LogEvent {
    pub level: LogLevel,
    pub messages: Vec<Message>,
    /// Logger the call was made on
    pub logger: Logger,
    pub pretty: String,
    pub simple: String,
}

impl fmt::Debug for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogEvent")
            .field("level", &self.level)
            .field("messages", &self.messages)
            .field("simple", &self.simple)
            .finish()
    }
}

/// Handle returned by [`Logger::subscribe`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Arc<dyn Fn(&LogEvent) + Send + Sync>;

struct Subscriber {
    id: SubscriptionId,
    level: LogLevel,
    handler: Handler,
}

/// Construction options for [`Logger::new`]
#[derive(Clone)]
pub struct LoggerOptions {
    pub formatter: Arc<dyn Formatter>,
    pub console: Arc<dyn ConsoleSink>,
    pub parent: Option<Logger>,
    pub label: Option<String>,
    pub write_stream: Option<Arc<FileWriteStream>>,
    pub inspect: InspectOptions,
    /// `None` disables console output
    pub console_level: Option<LogLevel>,
    pub write_level: WriteLevel,
}

impl Default for LoggerOptions {
    fn default() -> Self {
        Self {
            formatter: DEFAULT_FORMATTER.clone(),
            console: DEFAULT_CONSOLE.clone(),
            parent: None,
            label: None,
            write_stream: None,
            inspect: InspectOptions::default(),
            console_level: Some(LogLevel::Info),
            write_level: WriteLevel::default(),
        }
    }
}

struct State {
    label: Option<String>,
    inspect: InspectOptions,
    console_level: Option<LogLevel>,
    write_level: Option<LogLevel>,
    write_stream: Option<Arc<FileWriteStream>>,
}

struct Inner {
    parent: Option<Logger>,
    formatter: Arc<dyn Formatter>,
    console: Arc<dyn ConsoleSink>,
    state: RwLock<State>,
    subscribers: RwLock<Vec<Subscriber>>,
    next_subscription: AtomicU64,
}

#[derive(Clone)]
pub struct Logger {
    inner: Arc<Inner>,
}

/// Non-owning handle to a [`Logger`], obtained from [`Logger::downgrade`]
#[derive(Clone)]
pub struct WeakLogger {
    inner: Weak<Inner>,
}

impl WeakLogger {
    /// `None` once every strong handle is gone
    pub fn upgrade(&self) -> Option<Logger> {
        self.inner.upgrade().map(|inner| Logger { inner })
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(LoggerOptions::default())
    }
}

impl Logger {
    pub fn new(options: LoggerOptions) -> Self {
        let write_level = options.write_level.resolve(options.console_level);
        let logger = Self {
            inner: Arc::new(Inner {
                parent: options.parent,
                formatter: options.formatter,
                console: options.console,
                state: RwLock::new(State {
                    label: options.label,
                    inspect: options.inspect,
                    console_level: options.console_level,
                    write_level,
                    write_stream: None,
                }),
                subscribers: RwLock::new(Vec::new()),
                next_subscription: AtomicU64::new(1),
            }),
        };
        if let Some(stream) = options.write_stream {
            logger.set_write_stream(Some(stream));
        }
        logger
    }

    // ------------------------------------------------------------------
    // Logging
    // ------------------------------------------------------------------

    pub fn debug<I>(&self, messages: I)
    where
        I: IntoIterator,
        I::Item: Into<Message>,
    {
        self.print(LogLevel::Debug, messages)
    }

    pub fn info<I>(&self, messages: I)
    where
        I: IntoIterator,
        I::Item: Into<Message>,
    {
        self.print(LogLevel::Info, messages)
    }

    pub fn warning<I>(&self, messages: I)
    where
        I: IntoIterator,
        I::Item: Into<Message>,
    {
        self.print(LogLevel::Warn, messages)
    }

    pub fn error<I>(&self, messages: I)
    where
        I: IntoIterator,
        I::Item: Into<Message>,
    {
        self.print(LogLevel::Error, messages)
    }

    /// Alias for [`Logger::info`]
    pub fn log<I>(&self, messages: I)
    where
        I: IntoIterator,
        I::Item: Into<Message>,
    {
        self.info(messages)
    }

    /// Alias for [`Logger::warning`]
    pub fn warn<I>(&self, messages: I)
    where
        I: IntoIterator,
        I::Item: Into<Message>,
    {
        self.warning(messages)
    }

    /// Alias for [`Logger::error`]
    pub fn err<I>(&self, messages: I)
    where
        I: IntoIterator,
        I::Item: Into<Message>,
    {
        self.error(messages)
    }

    /// Format, publish, and write one logging call.
    ///
    /// Never fails: a closed or broken file stream is skipped.
    pub fn print<I>(&self, level: LogLevel, messages: I)
    where
        I: IntoIterator,
        I::Item: Into<Message>,
    {
        let messages: Vec<Message> = messages.into_iter().map(Into::into).collect();
        let options = FormatOptions {
            level,
            timestamp: Utc::now(),
            messages: &messages,
            logger: self,
        };
        let pretty = self.inner.formatter.format_console_log(&options);
        let simple = self.inner.formatter.format_write_stream_log(&options);

        let event = LogEvent {
            level,
            messages,
            logger: self.clone(),
            pretty,
            simple,
        };
        self.publish(&event);

        let (console_level, write_level) = {
            let state = self.state();
            (state.console_level, state.write_level)
        };

        if level.passes(console_level) {
            self.inner.console.write(level, &event.pretty);
        }

        if level.passes(write_level) {
            if let Some(stream) = self.write_stream().filter(|s| !s.is_closed()) {
                if let Err(e) = stream.write_line(&event.simple) {
                    tracing::warn!("Failed to write to log file {:?}: {}", stream.path(), e);
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Register a handler for events at `level`, on this logger or any
    /// descendant.
    ///
    /// The logger owns its handlers. A handler that holds a strong handle to
    /// this logger or one of its descendants keeps the whole tree alive; log
    /// through a [`WeakLogger`] from [`Logger::downgrade`] instead.
    pub fn subscribe<F>(&self, level: LogLevel, handler: F) -> SubscriptionId
    where
        F: Fn(&LogEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.inner.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.subscribers_mut().push(Subscriber {
            id,
            level,
            handler: Arc::new(handler),
        });
        id
    }

    /// Returns false if the subscription was not registered here
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers_mut();
        let before = subscribers.len();
        subscribers.retain(|s| s.id != id);
        subscribers.len() != before
    }

    /// Deliver `event` to local subscribers, then to the parent chain
    pub fn publish(&self, event: &LogEvent) {
        let handlers: Vec<Handler> = self
            .subscribers()
            .iter()
            .filter(|s| s.level == event.level)
            .map(|s| s.handler.clone())
            .collect();
        for handler in handlers {
            handler(event);
        }

        if let Some(parent) = &self.inner.parent {
            parent.publish(event);
        }
    }

    // ------------------------------------------------------------------
    // File stream
    // ------------------------------------------------------------------

    /// Own stream, or the nearest ancestor's
    pub fn write_stream(&self) -> Option<Arc<FileWriteStream>> {
        let own = self.state().write_stream.clone();
        own.or_else(|| self.inner.parent.as_ref().and_then(Logger::write_stream))
    }

    /// Store `stream` on this logger. When the parent chain has no stream
    /// yet, the same stream is installed there as well.
    pub fn set_write_stream(&self, stream: Option<Arc<FileWriteStream>>) {
        self.state_mut().write_stream = stream.clone();

        if let (Some(stream), Some(parent)) = (stream, &self.inner.parent) {
            if parent.write_stream().is_none() {
                parent.set_write_stream(Some(stream));
            }
        }
    }

    pub fn is_write_stream_closed(&self) -> bool {
        self.write_stream().map_or(true, |s| s.is_closed())
    }

    /// Open a log file for this logger (and, if they have none, its ancestors).
    ///
    /// Fails with [`Error::StreamAlreadyOpen`] while a stream is open.
    pub fn create_file_write_stream(&self, options: FileStreamOptions) -> Result<&Self> {
        if let Some(stream) = self.write_stream().filter(|s| !s.is_closed()) {
            return Err(Error::StreamAlreadyOpen(stream.path().to_path_buf()));
        }
        let stream = FileWriteStream::create(options)?;
        self.set_write_stream(Some(stream));
        Ok(self)
    }

    /// Close the stream this logger writes to. Returns immediately if there
    /// is none or it is already closed.
    pub fn close_file_write_stream(&self) -> Result<&Self> {
        if let Some(stream) = self.write_stream() {
            stream.close()?;
        }
        Ok(self)
    }

    // ------------------------------------------------------------------
    // Derivation
    // ------------------------------------------------------------------

    /// Current configuration with the write stream and write level resolved
    pub fn options(&self) -> LoggerOptions {
        let write_stream = self.write_stream();
        let state = self.state();
        LoggerOptions {
            formatter: self.inner.formatter.clone(),
            console: self.inner.console.clone(),
            parent: self.inner.parent.clone(),
            label: state.label.clone(),
            write_stream,
            inspect: state.inspect.clone(),
            console_level: state.console_level,
            write_level: state.write_level.into(),
        }
    }

    /// New logger from this one's configuration.
    ///
    /// The parent is this logger's parent when `inherit_parent` is true,
    /// otherwise this logger itself. `overrides` runs after the parent is
    /// chosen and may replace it.
    pub fn clone_with<F>(&self, overrides: F, inherit_parent: bool) -> Logger
    where
        F: FnOnce(&mut LoggerOptions),
    {
        let mut options = self.options();
        options.parent = if inherit_parent {
            self.inner.parent.clone()
        } else {
            Some(self.clone())
        };
        overrides(&mut options);
        Logger::new(options)
    }

    /// Child logger with its own label
    pub fn child(&self, label: impl Into<String>) -> Logger {
        let label = label.into();
        self.clone_with(|o| o.label = Some(label), false)
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn parent(&self) -> Option<&Logger> {
        self.inner.parent.as_ref()
    }

    pub fn label(&self) -> Option<String> {
        self.state().label.clone()
    }

    pub fn set_label(&self, label: Option<String>) {
        self.state_mut().label = label;
    }

    /// Labels from the root down to this logger, skipping unlabeled loggers
    pub fn labels(&self) -> Vec<String> {
        let mut labels = self.parent().map(Logger::labels).unwrap_or_default();
        labels.extend(self.label());
        labels
    }

    pub fn console_level(&self) -> Option<LogLevel> {
        self.state().console_level
    }

    pub fn set_console_level(&self, level: Option<LogLevel>) {
        self.state_mut().console_level = level;
    }

    pub fn write_level(&self) -> Option<LogLevel> {
        self.state().write_level
    }

    /// `WriteLevel::MirrorConsole` copies the current console level
    pub fn set_write_level(&self, level: impl Into<WriteLevel>) {
        let mut state = self.state_mut();
        state.write_level = level.into().resolve(state.console_level);
    }

    pub fn inspect_options(&self) -> InspectOptions {
        self.state().inspect.clone()
    }

    pub fn set_inspect_options(&self, inspect: InspectOptions) {
        self.state_mut().inspect = inspect;
    }

    pub fn downgrade(&self) -> WeakLogger {
        WeakLogger {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Whether both handles refer to the same logger
    pub fn ptr_eq(&self, other: &Logger) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn state(&self) -> RwLockReadGuard<'_, State> {
        self.inner.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn state_mut(&self) -> RwLockWriteGuard<'_, State> {
        self.inner.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn subscribers(&self) -> RwLockReadGuard<'_, Vec<Subscriber>> {
        self.inner.subscribers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn subscribers_mut(&self) -> RwLockWriteGuard<'_, Vec<Subscriber>> {
        self.inner.subscribers.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("Logger")
            .field("label", &state.label)
            .field("console_level", &state.console_level)
            .field("write_level", &state.write_level)
            .field("has_parent", &self.inner.parent.is_some())
            .finish()
    }
}
