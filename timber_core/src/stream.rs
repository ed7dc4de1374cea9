//! File write streams with rotate-on-open.
//!
//! A stream is created once per log file through [`FileWriteStream::create`],
//! which applies the rotation policy to any file already at the target path
//! before opening it. Writes go straight to the file without buffering.

use crate::rotation::{self, Compression};
use crate::{Error, Result};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{File, Metadata, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Caller-supplied rotation, given the existing file and its metadata
pub type RotateFn = Arc<dyn Fn(&Path, &Metadata) -> Result<()> + Send + Sync>;

/// Produces a header from the absolute log path
pub type HeaderFn = Arc<dyn Fn(&Path) -> String + Send + Sync>;

/// What happens to a file that already exists when the stream is opened
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileWriteStreamMode {
    /// Keep the content and append to it
    Append,
    /// Discard the content
    Truncate,
    /// Move the old file aside (compressed by default) and start fresh
    #[default]
    Rename,
}

/// Header line written at the top of a fresh log file
#[derive(Clone, Default)]
pub enum InitialContent {
    /// No header
    None,
    /// `[<UTC RFC 3339 timestamp>]`
    #[default]
    Timestamp,
    Text(String),
    With(HeaderFn),
}

impl InitialContent {
    /// Header text including the trailing newline, if any was requested
    fn render(&self, path: &Path) -> Option<String> {
        let header = match self {
            Self::None => return None,
            Self::Timestamp => timestamp_header(),
            Self::Text(text) => text.clone(),
            Self::With(f) => f(path),
        };
        Some(format!("{}\n", header))
    }
}

impl fmt::Debug for InitialContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Timestamp => f.write_str("Timestamp"),
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::With(_) => f.write_str("With(<fn>)"),
        }
    }
}

/// `[2023-01-01T00:00:00.000Z]`
pub fn timestamp_header() -> String {
    format!("[{}]", Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Options for [`FileWriteStream::create`]
#[derive(Clone)]
pub struct FileStreamOptions {
    pub path: PathBuf,
    pub mode: FileWriteStreamMode,
    pub rotate: Option<RotateFn>,
    pub initial_content: InitialContent,
    /// Codec used by the default rotation
    pub compression: Compression,
}

impl FileStreamOptions {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            mode: FileWriteStreamMode::default(),
            rotate: None,
            initial_content: InitialContent::default(),
            compression: Compression::default(),
        }
    }

    pub fn mode(mut self, mode: FileWriteStreamMode) -> Self {
        self.mode = mode;
        self
    }

    /// Replace the default compress-and-rename rotation
    pub fn rotate_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&Path, &Metadata) -> Result<()> + Send + Sync + 'static,
    {
        self.rotate = Some(Arc::new(f));
        self
    }

    pub fn initial_content(mut self, content: InitialContent) -> Self {
        self.initial_content = content;
        self
    }

    pub fn compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }
}

impl fmt::Debug for FileStreamOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileStreamOptions")
            .field("path", &self.path)
            .field("mode", &self.mode)
            .field("rotate", &self.rotate.as_ref().map(|_| "<fn>"))
            .field("initial_content", &self.initial_content)
            .field("compression", &self.compression)
            .finish()
    }
}

/// An open log file plus the configuration it was opened with
pub struct FileWriteStream {
    path: PathBuf,
    mode: FileWriteStreamMode,
    header: Option<String>,
    compression: Compression,
    file: Mutex<Option<File>>,
}

impl FileWriteStream {
    /// Rotate any existing file according to `options.mode`, then open it.
    pub fn create(options: FileStreamOptions) -> Result<Arc<Self>> {
        let path = absolute(&options.path)?;

        let metadata = match std::fs::metadata(&path) {
            Ok(m) => Some(m),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        let header = options.initial_content.render(&path);

        if metadata.as_ref().is_some_and(|m| !m.is_file()) {
            return Err(Error::NotAFile(path));
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        if let Some(metadata) = &metadata {
            match options.mode {
                FileWriteStreamMode::Append => {}
                FileWriteStreamMode::Truncate => {
                    std::fs::write(&path, header.as_deref().unwrap_or_default())?;
                }
                FileWriteStreamMode::Rename => {
                    match &options.rotate {
                        Some(rotate) => rotate(&path, metadata)?,
                        None => {
                            rotation::compress_and_rename(&path, metadata, options.compression)?;
                        }
                    }
                    if !path.exists() {
                        std::fs::write(&path, header.as_deref().unwrap_or_default())?;
                    }
                }
            }
        }

        let mut open = OpenOptions::new();
        open.create(true);
        if options.mode == FileWriteStreamMode::Append {
            open.append(true);
        } else {
            open.write(true).truncate(true);
        }
        let mut file = open.open(&path)?;

        if file.metadata()?.len() == 0 {
            if let Some(header) = &header {
                file.write_all(header.as_bytes())?;
            }
        }

        tracing::debug!("Opened log file {:?} ({:?})", path, options.mode);

        Ok(Arc::new(Self {
            path,
            mode: options.mode,
            header,
            compression: options.compression,
            file: Mutex::new(Some(file)),
        }))
    }

    /// Absolute path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> FileWriteStreamMode {
        self.mode
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// Header written when the file was created, with its newline
    pub fn initial_content(&self) -> Option<&str> {
        self.header.as_deref()
    }

    pub fn is_closed(&self) -> bool {
        self.lock().is_none()
    }

    /// Append `line` followed by a newline
    pub fn write_line(&self, line: &str) -> Result<()> {
        let mut guard = self.lock();
        let file = guard.as_mut().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotConnected, "log file stream is closed")
        })?;
        let mut buf = String::with_capacity(line.len() + 1);
        buf.push_str(line);
        buf.push('\n');
        file.write_all(buf.as_bytes())?;
        Ok(())
    }

    pub fn flush(&self) -> Result<()> {
        if let Some(file) = self.lock().as_mut() {
            file.flush()?;
        }
        Ok(())
    }

    /// Close the file handle. Closing an already closed stream does nothing.
    pub fn close(&self) -> Result<()> {
        let Some(mut file) = self.lock().take() else {
            return Ok(());
        };
        file.flush()?;
        file.sync_all()?;
        tracing::debug!("Closed log file {:?}", self.path);
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Option<File>> {
        self.file.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for FileWriteStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileWriteStream")
            .field("path", &self.path)
            .field("mode", &self.mode)
            .field("closed", &self.is_closed())
            .finish()
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn read(path: &Path) -> String {
        std::fs::read_to_string(path).unwrap()
    }

    #[test]
    fn test_new_file_gets_timestamp_header() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested/dir/latest.log");

        let stream = FileWriteStream::create(FileStreamOptions::new(&path)).unwrap();
        assert!(!stream.is_closed());
        assert_eq!(stream.path(), path);

        let content = read(&path);
        let first = content.lines().next().unwrap();
        assert!(rotation::parse_header_timestamp(first).is_some(), "{}", first);
        assert_eq!(stream.initial_content(), Some(content.as_str()));
    }

    #[test]
    fn test_write_line_and_close() {
        crate::diagnostics::init_test();
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("app.log");
        let options = FileStreamOptions::new(&path).initial_content(InitialContent::None);

        let stream = FileWriteStream::create(options).unwrap();
        stream.write_line("one").unwrap();
        stream.write_line("two").unwrap();
        stream.close().unwrap();

        assert!(stream.is_closed());
        assert_eq!(read(&path), "one\ntwo\n");
        assert!(stream.write_line("three").is_err());
        // second close is a no-op
        stream.close().unwrap();
    }

    #[test]
    fn test_truncate_keeps_only_header() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("app.log");
        std::fs::write(&path, "old line\n").unwrap();

        let options = FileStreamOptions::new(&path)
            .mode(FileWriteStreamMode::Truncate)
            .initial_content(InitialContent::Text("# fresh".into()));
        let _stream = FileWriteStream::create(options).unwrap();

        assert_eq!(read(&path), "# fresh\n");
    }

    #[test]
    fn test_append_preserves_content() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("app.log");
        std::fs::write(&path, "old line\n").unwrap();

        let options = FileStreamOptions::new(&path).mode(FileWriteStreamMode::Append);
        let stream = FileWriteStream::create(options).unwrap();
        stream.write_line("new line").unwrap();

        assert_eq!(read(&path), "old line\nnew line\n");
    }

    #[test]
    fn test_rename_with_custom_rotation() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("app.log");
        let moved = temp_dir.path().join("app.old");
        std::fs::write(&path, "previous run\n").unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let target = moved.clone();
        let options = FileStreamOptions::new(&path)
            .initial_content(InitialContent::With(Arc::new(|p: &Path| {
                format!("# {}", p.file_name().unwrap().to_string_lossy())
            })))
            .rotate_with(move |p, metadata| {
                assert_eq!(metadata.len(), 13);
                seen.fetch_add(1, Ordering::SeqCst);
                std::fs::rename(p, &target)?;
                Ok(())
            });
        let _stream = FileWriteStream::create(options).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(read(&moved), "previous run\n");
        assert_eq!(read(&path), "# app.log\n");
    }

    #[test]
    fn test_rename_skipped_for_missing_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("app.log");

        let options = FileStreamOptions::new(&path).rotate_with(|_, _| {
            Err(Error::Rotate("should not run".into()))
        });
        assert!(FileWriteStream::create(options).is_ok());
    }

    #[test]
    fn test_rotation_error_propagates() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("app.log");
        std::fs::write(&path, "x\n").unwrap();

        let options = FileStreamOptions::new(&path)
            .rotate_with(|_, _| Err(Error::Rotate("disk full".into())));
        let err = FileWriteStream::create(options).unwrap_err();
        assert!(matches!(err, Error::Rotate(ref m) if m == "disk full"));
    }

    #[test]
    fn test_directory_is_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let err = FileWriteStream::create(FileStreamOptions::new(temp_dir.path())).unwrap_err();
        assert!(matches!(err, Error::NotAFile(_)));
    }
}
