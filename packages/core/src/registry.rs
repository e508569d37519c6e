//! A keyed collection of file handles.
//!
//! The registry is generic over its identifier type, so a `Registry<u64>`
//! only ever accepts numeric identifiers at compile time. Callers holding
//! untyped input (a shell line, a config value) go through
//! [`Registry::parse_identifier`], which rejects text of the wrong shape
//! with [`Error::TypeMismatch`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;

use crate::content::{Content, ReadOptions, TextEncoding, WriteOptions, WriteReport};
use crate::error::{Error, IdentifierKind, Result};
use crate::handle::FileHandle;
use crate::mode::Mode;

/// Identifier types a [`Registry`] can be keyed by.
pub trait RegistryKey: Ord + Clone + fmt::Display + fmt::Debug {
    const KIND: IdentifierKind;

    /// Parse caller-supplied text, or `None` if it has the wrong shape.
    fn parse_key(raw: &str) -> Option<Self>;
}

macro_rules! numeric_key {
    ($($ty:ty),*) => {
        $(
            impl RegistryKey for $ty {
                const KIND: IdentifierKind = IdentifierKind::Numeric;

                fn parse_key(raw: &str) -> Option<Self> {
                    raw.trim().parse().ok()
                }
            }
        )*
    };
}

numeric_key!(u32, u64, usize, i32, i64);

impl RegistryKey for String {
    const KIND: IdentifierKind = IdentifierKind::Text;

    fn parse_key(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            None
        } else {
            Some(raw.to_string())
        }
    }
}

/// Owns a set of [`FileHandle`]s addressed by identifier.
///
/// Dropping the registry closes every handle it holds.
#[derive(Debug)]
pub struct Registry<K: RegistryKey> {
    entries: BTreeMap<K, FileHandle>,
    default_encoding: TextEncoding,
}

impl<K: RegistryKey> Registry<K> {
    pub fn new() -> Self {
        Self::with_encoding(TextEncoding::default())
    }

    /// A registry whose handles open with `encoding`.
    pub fn with_encoding(encoding: TextEncoding) -> Self {
        Self {
            entries: BTreeMap::new(),
            default_encoding: encoding,
        }
    }

    pub fn kind(&self) -> IdentifierKind {
        K::KIND
    }

    pub fn parse_identifier(&self, raw: &str) -> Result<K> {
        K::parse_key(raw).ok_or_else(|| Error::TypeMismatch {
            expected: K::KIND,
            found: raw.to_string(),
        })
    }

    /// Open `location` and register it under `id`.
    ///
    /// An identifier that is already registered must be removed first.
    pub fn add(
        &mut self,
        id: K,
        location: impl AsRef<Path>,
        mode: Mode,
    ) -> Result<&mut FileHandle> {
        self.ensure_vacant(&id)?;
        let handle = FileHandle::open_with_encoding(location, mode, self.default_encoding)?;
        log::debug!("Registered {} -> {}", id, handle.location().display());
        Ok(self.entries.entry(id).or_insert(handle))
    }

    /// Open several files at once.
    ///
    /// The three slices are parallel. Nothing is opened unless their
    /// lengths agree, every identifier is new and every file can be opened
    /// under its mode. Nothing is registered unless every file opened.
    pub fn open_many<P: AsRef<Path>>(
        &mut self,
        locations: &[P],
        modes: &[Mode],
        identifiers: &[K],
    ) -> Result<()> {
        check_length("locations", identifiers.len(), locations.len())?;
        check_length("modes", identifiers.len(), modes.len())?;

        let mut seen = BTreeSet::new();
        for id in identifiers {
            self.ensure_vacant(id)?;
            if !seen.insert(id) {
                return Err(Error::AlreadyRegistered {
                    identifier: id.to_string(),
                });
            }
        }

        let mut exclusive = BTreeSet::new();
        for (location, &mode) in locations.iter().zip(modes) {
            let location = location.as_ref();
            check_openable(location, mode)?;
            if mode.is_exclusive() && !exclusive.insert(location) {
                return Err(Error::AlreadyExists {
                    location: location.to_path_buf(),
                });
            }
        }

        // Truncating opens go last so an earlier failure cannot empty a file.
        let mut order: Vec<usize> = (0..identifiers.len()).collect();
        order.sort_by_key(|&i| modes[i].truncates());

        let opened = order
            .into_iter()
            .map(|i| {
                FileHandle::open_with_encoding(&locations[i], modes[i], self.default_encoding)
                    .map(|handle| (identifiers[i].clone(), handle))
            })
            .collect::<Result<Vec<_>>>()?;

        for (id, handle) in opened {
            log::debug!("Registered {} -> {}", id, handle.location().display());
            self.entries.insert(id, handle);
        }
        Ok(())
    }

    /// Write one piece of content to each identifier.
    ///
    /// Every identifier must be registered and writable, and every content
    /// must suit its handle, before anything is written.
    pub fn write_many(
        &mut self,
        identifiers: &[K],
        contents: Vec<Content>,
        options: WriteOptions,
    ) -> Result<Vec<WriteReport>> {
        check_length("contents", identifiers.len(), contents.len())?;

        let encoded = identifiers
            .iter()
            .zip(contents)
            .map(|(id, content)| self.handle(id)?.encode(content, options))
            .collect::<Result<Vec<_>>>()?;

        identifiers
            .iter()
            .zip(encoded)
            .map(|(id, encoded)| self.handle_mut(id)?.commit(encoded, options))
            .collect()
    }

    pub fn get(&self, id: &K) -> Option<&FileHandle> {
        self.entries.get(id)
    }

    pub fn get_mut(&mut self, id: &K) -> Option<&mut FileHandle> {
        self.entries.get_mut(id)
    }

    pub fn contains(&self, id: &K) -> bool {
        self.entries.contains_key(id)
    }

    /// Close and forget the handle under `id`.
    ///
    /// Returns `Ok(false)` when nothing was registered under `id`.
    pub fn remove(&mut self, id: &K) -> Result<bool> {
        match self.entries.remove(id) {
            Some(mut handle) => {
                log::debug!("Removed {} ({})", id, handle.location().display());
                handle.close()?;
                Ok(true)
            }
            None => {
                log::info!("No file registered under {}, nothing to remove", id);
                Ok(false)
            }
        }
    }

    pub fn read_from(&mut self, id: &K, options: ReadOptions) -> Result<Content> {
        self.handle_mut(id)?.read(options)
    }

    pub fn write_to(
        &mut self,
        id: &K,
        content: impl Into<Content>,
        options: WriteOptions,
    ) -> Result<WriteReport> {
        self.handle_mut(id)?.write(content, options)
    }

    pub fn seek_in(&mut self, id: &K, offset: u64) -> Result<u64> {
        self.handle_mut(id)?.seek(offset)
    }

    pub fn offset_of(&mut self, id: &K) -> Result<u64> {
        self.handle_mut(id)?.current_offset()
    }

    pub fn change_mode_of(&mut self, id: &K, mode: Mode) -> Result<()> {
        self.handle_mut(id)?.change_mode(mode)
    }

    pub fn rename_of(
        &mut self,
        id: &K,
        location: impl AsRef<Path>,
        create_if_absent: bool,
    ) -> Result<()> {
        self.handle_mut(id)?.rename(location, create_if_absent)
    }

    /// Empty the file registered under `id`.
    pub fn clear(&mut self, id: &K) -> Result<()> {
        self.handle_mut(id)?.truncate()
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &K> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &FileHandle)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Close every handle and empty the registry.
    ///
    /// All handles are released even if some fail to flush; the first
    /// failure is returned.
    pub fn close_all(&mut self) -> Result<()> {
        let mut first_error = None;
        for (id, mut handle) in std::mem::take(&mut self.entries) {
            if let Err(e) = handle.close() {
                log::warn!("Failed to close {}: {}", id, e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn handle(&self, id: &K) -> Result<&FileHandle> {
        self.entries.get(id).ok_or_else(|| unknown(id))
    }

    fn handle_mut(&mut self, id: &K) -> Result<&mut FileHandle> {
        self.entries.get_mut(id).ok_or_else(|| unknown(id))
    }

    fn ensure_vacant(&self, id: &K) -> Result<()> {
        if self.entries.contains_key(id) {
            Err(Error::AlreadyRegistered {
                identifier: id.to_string(),
            })
        } else {
            Ok(())
        }
    }
}

impl<K: RegistryKey> Default for Registry<K> {
    fn default() -> Self {
        Self::new()
    }
}

fn unknown<K: RegistryKey>(id: &K) -> Error {
    Error::UnknownIdentifier {
        identifier: id.to_string(),
    }
}

/// Fail the way opening would, without touching the file.
fn check_openable(location: &Path, mode: Mode) -> Result<()> {
    let exists = location.exists();
    if !mode.creates() && !exists {
        return Err(Error::NotFound {
            location: location.to_path_buf(),
        });
    }
    if mode.is_exclusive() && exists {
        return Err(Error::AlreadyExists {
            location: location.to_path_buf(),
        });
    }
    Ok(())
}

fn check_length(argument: &'static str, expected: usize, found: usize) -> Result<()> {
    if expected == found {
        Ok(())
    } else {
        Err(Error::LengthMismatch {
            argument,
            expected,
            found,
        })
    }
}
