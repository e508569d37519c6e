//! # modefile-repl
//!
//! An interactive shell over a [`modefile_core::Registry`].
//!
//! Files are opened under an identifier and then read, written, reopened
//! under another mode or pointed at another file by that identifier.
//!
//! ## Features
//!
//! - Numeric or text identifiers, chosen at startup
//! - Tab completion for commands
//! - Highlighting of commands, identifiers and flags
//! - Vi mode support (from config, EDITOR, VISUAL or .inputrc)
//! - Command history
//!
//! ## Usage
//!
//! ```bash
//! modefile --id-kind text
//!
//! # Inside the shell:
//! > open notes notes.txt w+
//! > write notes Hello\nWorld!
//! > read notes --lines --at 0
//! > mode notes r
//! > close notes
//! ```

pub mod commands;
pub mod completer;
pub mod config;
pub mod highlighter;
pub mod host;
pub mod io;
pub mod repl;

pub use config::ShellConfig;
pub use repl::{run, ReplCore};
