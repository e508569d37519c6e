//! A file handle that knows what its open mode allows.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::content::{
    Content, ReadOptions, TextEncoding, WriteOptions, WriteReport, WriteWarning,
};
use crate::error::{Error, Result};
use crate::mode::Mode;

/// An open file together with the mode it was opened under.
///
/// The handle owns exactly one open [`File`] at a time. Changing mode or
/// retargeting the handle opens the replacement first and releases the old
/// file only once that succeeded, so a failed switch leaves the handle as it
/// was.
///
/// Writes made with [`WriteOptions::buffered`] are held in the handle until
/// the next flushing write, seek, read, offset query, mode change, rename,
/// truncate, [`flush`](Self::flush) or [`close`](Self::close).
#[derive(Debug)]
pub struct FileHandle {
    location: PathBuf,
    mode: Mode,
    encoding: TextEncoding,
    file: Option<File>,
    pending: Vec<u8>,
}

/// A snapshot of a handle's state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandleInfo {
    pub location: PathBuf,
    pub mode: Mode,
    pub encoding: TextEncoding,
    pub read: bool,
    pub write: bool,
    pub binary: bool,
    pub closed: bool,
}

impl FileHandle {
    /// Open `location` under `mode` with the default text encoding.
    ///
    /// Exclusive modes (`x`, `xb`, ...) create the file and then settle into
    /// the matching read-only mode: writing requires an explicit
    /// [`change_mode`](Self::change_mode).
    pub fn open(location: impl AsRef<Path>, mode: Mode) -> Result<Self> {
        Self::open_with_encoding(location, mode, TextEncoding::default())
    }

    pub fn open_with_encoding(
        location: impl AsRef<Path>,
        mode: Mode,
        encoding: TextEncoding,
    ) -> Result<Self> {
        let location = location.as_ref().to_path_buf();
        let (file, mode) = open_file(&location, mode)?;
        log::debug!("Opened {} as \"{}\"", location.display(), mode);

        Ok(Self {
            location,
            mode,
            encoding,
            file: Some(file),
            pending: Vec::new(),
        })
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    pub fn supports_read(&self) -> bool {
        self.mode.supports_read()
    }

    pub fn supports_write(&self) -> bool {
        self.mode.supports_write()
    }

    pub fn supports_binary(&self) -> bool {
        self.mode.is_binary()
    }

    pub fn is_closed(&self) -> bool {
        self.file.is_none()
    }

    pub fn info(&self) -> HandleInfo {
        HandleInfo {
            location: self.location.clone(),
            mode: self.mode,
            encoding: self.encoding,
            read: self.supports_read(),
            write: self.supports_write(),
            binary: self.supports_binary(),
            closed: self.is_closed(),
        }
    }

    /// Read from the cursor (or from `options.from_offset`).
    ///
    /// Text handles return [`Content::Text`] or [`Content::Lines`], binary
    /// handles [`Content::Bytes`] or [`Content::ByteLines`].
    pub fn read(&mut self, options: ReadOptions) -> Result<Content> {
        self.require(self.supports_read(), "read")?;
        self.flush()?;

        let binary = self.supports_binary();
        let encoding = self.encoding;
        let (file, location) = self.file_mut()?;
        let io_err = |e: io::Error| Error::io(location, e);

        if let Some(offset) = options.from_offset {
            file.seek(SeekFrom::Start(offset)).map_err(io_err)?;
        }
        let start = file.stream_position().map_err(io_err)?;

        let mut buffer = Vec::new();
        let reached_end = fill(file, &mut buffer, |read| match options.amount {
            None => false,
            Some(amount) if options.as_lines => newline_count(read) >= amount,
            Some(amount) if binary => read.len() >= amount,
            Some(amount) => encoding.char_starts(read) > amount,
        })
        .map_err(io_err)?;
        let fetched = buffer.len();
        if !binary && !reached_end {
            buffer.truncate(encoding.complete_prefix_len(&buffer));
        }

        let (content, consumed) = if binary {
            take_bytes(buffer, options)
        } else {
            match encoding.decode(&buffer) {
                Ok(text) => take_text(text, encoding, options),
                Err(message) => {
                    file.seek(SeekFrom::Start(start)).map_err(io_err)?;
                    return Err(Error::Decode {
                        location: location.to_path_buf(),
                        encoding,
                        message,
                    });
                }
            }
        };

        if consumed < fetched {
            file.seek(SeekFrom::Start(start + consumed as u64))
                .map_err(io_err)?;
        }
        Ok(content)
    }

    /// Read everything from the cursor to the end of the file.
    pub fn read_to_end(&mut self) -> Result<Content> {
        self.read(ReadOptions::all())
    }

    /// Write `content` at the cursor (at the end for append modes).
    ///
    /// Text written to a binary handle is encoded with the handle's
    /// encoding. Bytes written to a text handle that do not decode are
    /// stored as base64 text; the write still succeeds and the report
    /// carries a warning.
    pub fn write(
        &mut self,
        content: impl Into<Content>,
        options: WriteOptions,
    ) -> Result<WriteReport> {
        let encoded = self.encode(content.into(), options)?;
        self.commit(encoded, options)
    }

    /// Check that `content` may be written and convert it to file bytes.
    /// Nothing reaches the file.
    pub(crate) fn encode(&self, content: Content, options: WriteOptions) -> Result<Encoded> {
        self.require(self.supports_write(), "write")?;
        if self.is_closed() {
            return Err(Error::Closed {
                location: self.location.clone(),
            });
        }
        let (bytes, warnings) =
            content.into_file_bytes(self.supports_binary(), self.encoding, options.as_lines)?;
        Ok(Encoded { bytes, warnings })
    }

    /// Queue bytes produced by [`encode`](Self::encode), flushing if asked.
    pub(crate) fn commit(&mut self, encoded: Encoded, options: WriteOptions) -> Result<WriteReport> {
        let Encoded { bytes, warnings } = encoded;
        for warning in &warnings {
            log::warn!("Writing {}: {}", self.location.display(), warning);
        }

        self.pending.extend_from_slice(&bytes);
        if options.flush {
            self.flush()?;
        }

        Ok(WriteReport {
            bytes_written: bytes.len(),
            warnings,
        })
    }

    /// Hand buffered bytes to the file.
    pub fn flush(&mut self) -> Result<()> {
        let FileHandle {
            file,
            location,
            pending,
            ..
        } = self;
        let file = file.as_mut().ok_or_else(|| Error::Closed {
            location: location.clone(),
        })?;

        if !pending.is_empty() {
            file.write_all(pending)
                .map_err(|e| Error::io(location.as_path(), e))?;
            pending.clear();
        }
        file.flush().map_err(|e| Error::io(location.as_path(), e))
    }

    /// Move the cursor to `offset` bytes from the start. Allowed in every
    /// mode.
    pub fn seek(&mut self, offset: u64) -> Result<u64> {
        self.flush()?;
        let (file, location) = self.file_mut()?;
        file.seek(SeekFrom::Start(offset))
            .map_err(|e| Error::io(location, e))
    }

    pub fn current_offset(&mut self) -> Result<u64> {
        self.flush()?;
        let (file, location) = self.file_mut()?;
        file.stream_position().map_err(|e| Error::io(location, e))
    }

    /// Reopen the same file under `mode`.
    ///
    /// Reopening under the current mode keeps the content even for `w`
    /// modes; switching into a `w` mode from another mode truncates.
    pub fn change_mode(&mut self, mode: Mode) -> Result<()> {
        self.flush()?;
        let (file, mode) = if mode == self.mode {
            reopen_file(&self.location, mode)?
        } else {
            open_file(&self.location, mode)?
        };
        log::debug!(
            "Changed {} from \"{}\" to \"{}\"",
            self.location.display(),
            self.mode,
            mode
        );

        self.file = Some(file);
        self.mode = mode;
        Ok(())
    }

    /// Point the handle at `location`, opened under the current mode.
    ///
    /// The old file is left untouched on disk; it is only released.
    pub fn rename(&mut self, location: impl AsRef<Path>, create_if_absent: bool) -> Result<()> {
        let location = location.as_ref().to_path_buf();
        self.flush()?;

        if !location.exists() {
            if !create_if_absent {
                return Err(Error::NotFound { location });
            }
            create_empty(&location)?;
        }

        let (file, mode) = open_file(&location, self.mode)?;
        log::debug!(
            "Moved handle from {} to {}",
            self.location.display(),
            location.display()
        );

        self.file = Some(file);
        self.mode = mode;
        self.location = location;
        Ok(())
    }

    /// Discard the file's content and rewind.
    pub fn truncate(&mut self) -> Result<()> {
        self.require(self.supports_write(), "truncate")?;
        self.flush()?;
        let (file, location) = self.file_mut()?;
        file.set_len(0).map_err(|e| Error::io(location, e))?;
        file.seek(SeekFrom::Start(0))
            .map_err(|e| Error::io(location, e))?;
        Ok(())
    }

    pub fn set_encoding(&mut self, encoding: TextEncoding) {
        self.encoding = encoding;
    }

    /// Flush and release the file. Closing twice is a no-op.
    pub fn close(&mut self) -> Result<()> {
        if self.file.is_none() {
            return Ok(());
        }
        let flushed = self.flush();
        self.file = None;
        self.pending.clear();
        log::debug!("Closed {}", self.location.display());
        flushed
    }

    fn require(&self, supported: bool, operation: &'static str) -> Result<()> {
        if supported {
            Ok(())
        } else {
            Err(Error::UnsupportedOperation {
                operation,
                mode: self.mode,
                location: self.location.clone(),
            })
        }
    }

    fn file_mut(&mut self) -> Result<(&mut File, &Path)> {
        match self.file.as_mut() {
            Some(file) => Ok((file, &self.location)),
            None => Err(Error::Closed {
                location: self.location.clone(),
            }),
        }
    }
}

impl Drop for FileHandle {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::warn!("Failed to close {}: {}", self.location.display(), e);
        }
    }
}

/// Bytes ready to be queued on a handle, with any fallback warnings.
#[derive(Debug)]
pub(crate) struct Encoded {
    bytes: Vec<u8>,
    warnings: Vec<WriteWarning>,
}

/// Open `location` under `mode`, returning the mode the file ended up in.
fn open_file(location: &Path, mode: Mode) -> Result<(File, Mode)> {
    open_with(location, mode, mode.open_options())
}

/// Open `location` under `mode` without truncating it.
fn reopen_file(location: &Path, mode: Mode) -> Result<(File, Mode)> {
    let mut options = mode.open_options();
    options.truncate(false);
    open_with(location, mode, options)
}

fn open_with(location: &Path, mode: Mode, options: OpenOptions) -> Result<(File, Mode)> {
    let file = options
        .open(location)
        .map_err(|e| match e.kind() {
            io::ErrorKind::NotFound if !mode.creates() => Error::NotFound {
                location: location.to_path_buf(),
            },
            io::ErrorKind::AlreadyExists => Error::AlreadyExists {
                location: location.to_path_buf(),
            },
            _ => Error::io(location, e),
        })?;

    if !mode.is_exclusive() {
        return Ok((file, mode));
    }

    drop(file);
    let demoted = mode.demoted();
    let file = demoted
        .open_options()
        .open(location)
        .map_err(|e| Error::io(location, e))?;
    Ok((file, demoted))
}

fn create_empty(location: &Path) -> Result<()> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(location)
        .map(drop)
        .map_err(|e| Error::io(location, e))
}

const READ_CHUNK: usize = 8 * 1024;

/// Append chunks from `file` to `buffer` until `enough` holds or the file
/// ends. Returns `true` if the end was reached.
fn fill(file: &mut File, buffer: &mut Vec<u8>, enough: impl Fn(&[u8]) -> bool) -> io::Result<bool> {
    let mut chunk = [0u8; READ_CHUNK];
    while !enough(buffer) {
        match file.read(&mut chunk) {
            Ok(0) => return Ok(true),
            Ok(n) => buffer.extend_from_slice(&chunk[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(false)
}

fn newline_count(bytes: &[u8]) -> usize {
    bytes.iter().filter(|&&b| b == b'\n').count()
}

fn take_bytes(buffer: Vec<u8>, options: ReadOptions) -> (Content, usize) {
    if options.as_lines {
        let lines: Vec<Vec<u8>> = buffer
            .split_inclusive(|&b| b == b'\n')
            .take(options.amount.unwrap_or(usize::MAX))
            .map(<[u8]>::to_vec)
            .collect();
        let consumed = lines.iter().map(Vec::len).sum();
        return (Content::ByteLines(lines), consumed);
    }

    let mut buffer = buffer;
    if let Some(amount) = options.amount {
        buffer.truncate(amount);
    }
    let consumed = buffer.len();
    (Content::Bytes(buffer), consumed)
}

fn take_text(text: String, encoding: TextEncoding, options: ReadOptions) -> (Content, usize) {
    if options.as_lines {
        let lines: Vec<String> = text
            .split_inclusive('\n')
            .take(options.amount.unwrap_or(usize::MAX))
            .map(String::from)
            .collect();
        let consumed = lines.iter().map(|line| encoding.byte_len(line)).sum();
        return (Content::Lines(lines), consumed);
    }

    let text = match options.amount {
        Some(amount) => text.chars().take(amount).collect(),
        None => text,
    };
    let consumed = encoding.byte_len(&text);
    (Content::Text(text), consumed)
}
