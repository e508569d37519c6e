//! # modefile-core
//!
//! Mode-aware file handles and a registry that manages many of them.
//!
//! A [`FileHandle`] wraps one open file together with the [`Mode`] it was
//! opened under. What the handle may do (read, write, binary content) is
//! always derived from that mode, and every operation the mode does not
//! allow fails with [`Error::UnsupportedOperation`] instead of reaching the
//! file.
//!
//! A [`Registry`] owns handles keyed by an identifier type of the caller's
//! choosing and adds bulk operations on top.
//!
//! ## Example
//!
//! ```rust,no_run
//! use modefile_core::{Content, Mode, ReadOptions, Registry, WriteOptions};
//!
//! let mut files: Registry<u64> = Registry::new();
//! files.add(1, "greeting.txt", "w".parse::<Mode>()?)?;
//! files.write_to(&1, "Hello", WriteOptions::default())?;
//! files.change_mode_of(&1, Mode::READ)?;
//!
//! assert_eq!(
//!     files.read_from(&1, ReadOptions::all())?,
//!     Content::Text("Hello".to_string())
//! );
//! # Ok::<(), modefile_core::Error>(())
//! ```

pub mod content;
pub mod error;
pub mod handle;
pub mod mode;
pub mod registry;

pub use content::{Content, ReadOptions, TextEncoding, WriteOptions, WriteReport, WriteWarning};
pub use error::{Error, IdentifierKind, Result};
pub use handle::{FileHandle, HandleInfo};
pub use mode::{Access, Capabilities, Mode};
pub use registry::{Registry, RegistryKey};
