//! Default log rotation: compress the previous file and move it aside.
//!
//! The old file is renamed to `<YYYY-MM-DD>-<H>-<M>-<S>-<ms><ext>.<codec>`
//! next to the original, where the timestamp is the time the old file was
//! started. A leading `[<RFC 3339>]` header line takes precedence over the
//! file system's birth time.

use crate::{Error, Result};
use chrono::{DateTime, Datelike, Timelike, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, Metadata};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const ZSTD_LEVEL: i32 = 19;

/// Codec applied to rotated files
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    Gzip,
    /// Slower, higher ratio
    Zstd,
}

impl Compression {
    pub fn name(self) -> &'static str {
        match self {
            Self::Gzip => "gzip",
            Self::Zstd => "zstd",
        }
    }

    /// File extension without the leading dot
    pub fn extension(self) -> &'static str {
        match self {
            Self::Gzip => "gz",
            Self::Zstd => "zst",
        }
    }

    pub fn compress(self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::Gzip => {
                let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
                encoder.write_all(data).map_err(|e| self.error(e))?;
                encoder.finish().map_err(|e| self.error(e))
            }
            Self::Zstd => zstd::encode_all(data, ZSTD_LEVEL).map_err(|e| self.error(e)),
        }
    }

    pub fn decompress(self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::Gzip => {
                let mut out = Vec::new();
                GzDecoder::new(data)
                    .read_to_end(&mut out)
                    .map_err(|e| self.error(e))?;
                Ok(out)
            }
            Self::Zstd => zstd::decode_all(data).map_err(|e| self.error(e)),
        }
    }

    fn error(self, e: std::io::Error) -> Error {
        Error::Compression {
            codec: self.name(),
            message: e.to_string(),
        }
    }
}

/// Parse a `[<RFC 3339>]` header line
pub fn parse_header_timestamp(line: &str) -> Option<DateTime<Utc>> {
    let inner = line.trim().strip_prefix('[')?.strip_suffix(']')?;
    DateTime::parse_from_rfc3339(inner)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Birth time of a file, falling back to its modification time
pub fn file_created_at(metadata: &Metadata) -> DateTime<Utc> {
    metadata
        .created()
        .or_else(|_| metadata.modified())
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now())
}

fn rotated_stem(created: DateTime<Utc>) -> String {
    format!(
        "{:04}-{:02}-{:02}-{}-{}-{}-{}",
        created.year(),
        created.month(),
        created.day(),
        created.hour(),
        created.minute(),
        created.second(),
        created.timestamp_subsec_millis()
    )
}

fn dotted_extension(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

/// Name the rotated copy of `path` would get
pub fn rotated_file_name(path: &Path, created: DateTime<Utc>, codec: Compression) -> PathBuf {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    dir.join(format!(
        "{}{}.{}",
        rotated_stem(created),
        dotted_extension(path),
        codec.extension()
    ))
}

/// First free rotated name, adding `-<n>` to the stem on collisions
fn available_rotated_path(path: &Path, created: DateTime<Utc>, codec: Compression) -> PathBuf {
    let candidate = rotated_file_name(path, created, codec);
    if !candidate.exists() {
        return candidate;
    }

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let stem = rotated_stem(created);
    let ext = dotted_extension(path);
    (1..)
        .map(|n| dir.join(format!("{}-{}{}.{}", stem, n, ext, codec.extension())))
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}

/// Compress `path` into a timestamped sibling and remove the original.
///
/// Returns the path of the compressed file. The original is locked
/// exclusively while it is read and is only removed once the compressed
/// copy has been persisted.
pub fn compress_and_rename(path: &Path, metadata: &Metadata, codec: Compression) -> Result<PathBuf> {
    let file = File::open(path)?;
    file.lock_exclusive()?;

    let mut content = Vec::new();
    let read = (&file).read_to_end(&mut content);
    if let Err(e) = read {
        let _ = file.unlock();
        return Err(e.into());
    }

    let first_line = content.split(|b| *b == b'\n').next().unwrap_or_default();
    let created = parse_header_timestamp(&String::from_utf8_lossy(first_line))
        .unwrap_or_else(|| file_created_at(metadata));

    let compressed = codec.compress(&content)?;
    let target = available_rotated_path(path, created, codec);

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(&compressed)?;
    temp.as_file().sync_all()?;
    temp.persist_noclobber(&target).map_err(|e| Error::Io(e.error))?;

    file.unlock()?;
    drop(file);
    std::fs::remove_file(path)?;

    tracing::info!(
        "Rotated {:?} -> {:?} ({} -> {} bytes)",
        path,
        target,
        content.len(),
        compressed.len()
    );
    Ok(target)
}
