//! Open modes and the capabilities they grant.
//!
//! A [`Mode`] is parsed from the familiar `fopen`-style tokens (`"r"`,
//! `"wb+"`, `"a"`, `"x"`, ...). The read/write/binary capabilities of a
//! handle are always derived from its mode and are never stored apart from
//! it.
//!
//! | token | read | write | creates | truncates |
//! |-------|------|-------|---------|-----------|
//! | `r`   | yes  | no    | no      | no        |
//! | `w`   | no   | yes   | yes     | yes       |
//! | `a`   | no   | yes   | yes     | no        |
//! | `x`   | -    | -     | only if absent | no |
//!
//! A `+` suffix adds the missing capability, a `b` suffix selects binary
//! content.

use std::fmt;
use std::fs::OpenOptions;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// The base access kind of a mode token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    /// `r`: open an existing file for reading.
    Read,
    /// `w`: create or truncate, then write.
    Write,
    /// `a`: create if needed, writes go to the end.
    Append,
    /// `x`: create a file that must not exist yet.
    Exclusive,
}

impl Access {
    fn token(self) -> char {
        match self {
            Access::Read => 'r',
            Access::Write => 'w',
            Access::Append => 'a',
            Access::Exclusive => 'x',
        }
    }
}

/// Capability flags derived from a [`Mode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub read: bool,
    pub write: bool,
    pub binary: bool,
}

/// A parsed open mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Mode {
    access: Access,
    update: bool,
    binary: bool,
}

impl Mode {
    pub const READ: Mode = Mode::new(Access::Read, false, false);
    pub const WRITE: Mode = Mode::new(Access::Write, false, false);
    pub const APPEND: Mode = Mode::new(Access::Append, false, false);
    pub const EXCLUSIVE: Mode = Mode::new(Access::Exclusive, false, false);

    pub const fn new(access: Access, update: bool, binary: bool) -> Self {
        Self {
            access,
            update,
            binary,
        }
    }

    pub fn access(&self) -> Access {
        self.access
    }

    pub fn is_binary(&self) -> bool {
        self.binary
    }

    pub fn is_exclusive(&self) -> bool {
        self.access == Access::Exclusive
    }

    /// Same mode with binary content selected or cleared.
    pub fn with_binary(self, binary: bool) -> Self {
        Self { binary, ..self }
    }

    pub fn capabilities(&self) -> Capabilities {
        let (read, write) = match (self.access, self.update) {
            (_, true) => (true, true),
            (Access::Read, false) => (true, false),
            (Access::Write | Access::Append, false) => (false, true),
            (Access::Exclusive, false) => (false, false),
        };
        Capabilities {
            read,
            write,
            binary: self.binary,
        }
    }

    pub fn supports_read(&self) -> bool {
        self.capabilities().read
    }

    pub fn supports_write(&self) -> bool {
        self.capabilities().write
    }

    /// Whether opening under this mode may create a missing file.
    pub fn creates(&self) -> bool {
        !matches!(self.access, Access::Read)
    }

    /// Whether opening under this mode discards existing content.
    pub fn truncates(&self) -> bool {
        self.access == Access::Write
    }

    /// The read-only mode an exclusive-create handle settles into once the
    /// file exists. Other modes are returned unchanged.
    pub fn demoted(self) -> Self {
        match self.access {
            Access::Exclusive => Mode::new(Access::Read, false, self.binary),
            _ => self,
        }
    }

    /// `OpenOptions` matching this mode.
    pub fn open_options(&self) -> OpenOptions {
        let caps = self.capabilities();
        let mut options = OpenOptions::new();
        options.read(caps.read);
        match self.access {
            Access::Read => {
                options.write(caps.write);
            }
            Access::Write => {
                options.write(true).create(true).truncate(true);
            }
            Access::Append => {
                options.append(true).create(true);
            }
            Access::Exclusive => {
                options.write(true).create_new(true);
            }
        }
        options
    }
}

impl Default for Mode {
    fn default() -> Self {
        Mode::READ
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidMode {
            token: token.to_string(),
        };

        let mut chars = token.chars();
        let access = match chars.next() {
            Some('r') => Access::Read,
            Some('w') => Access::Write,
            Some('a') => Access::Append,
            Some('x') => Access::Exclusive,
            _ => return Err(invalid()),
        };

        let mut update = false;
        let mut binary = false;
        for c in chars {
            match c {
                '+' if !update => update = true,
                'b' if !binary => binary = true,
                _ => return Err(invalid()),
            }
        }

        Ok(Mode::new(access, update, binary))
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.access.token())?;
        if self.binary {
            write!(f, "b")?;
        }
        if self.update {
            write!(f, "+")?;
        }
        Ok(())
    }
}

impl Serialize for Mode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Mode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        token.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(token: &str) -> (bool, bool, bool) {
        let c = token.parse::<Mode>().unwrap().capabilities();
        (c.read, c.write, c.binary)
    }

    #[test]
    fn capability_table() {
        assert_eq!(caps("r"), (true, false, false));
        assert_eq!(caps("rb"), (true, false, true));
        assert_eq!(caps("w"), (false, true, false));
        assert_eq!(caps("wb"), (false, true, true));
        assert_eq!(caps("a"), (false, true, false));
        assert_eq!(caps("ab"), (false, true, true));
        assert_eq!(caps("r+"), (true, true, false));
        assert_eq!(caps("w+"), (true, true, false));
        assert_eq!(caps("a+"), (true, true, false));
        assert_eq!(caps("rb+"), (true, true, true));
        assert_eq!(caps("r+b"), (true, true, true));
        assert_eq!(caps("wb+"), (true, true, true));
        assert_eq!(caps("ab+"), (true, true, true));
    }

    #[test]
    fn exclusive_demotes_to_read_only() {
        let x: Mode = "x".parse().unwrap();
        assert_eq!(x.demoted(), Mode::READ);

        let xb: Mode = "xb+".parse().unwrap();
        let demoted = xb.demoted();
        assert_eq!(demoted.to_string(), "rb");
        assert!(!demoted.supports_write());
    }

    #[test]
    fn demoted_leaves_other_modes_alone() {
        let wb: Mode = "wb".parse().unwrap();
        assert_eq!(wb.demoted(), wb);
    }

    #[test]
    fn creation_and_truncation() {
        assert!(!Mode::READ.creates());
        assert!(Mode::WRITE.creates() && Mode::WRITE.truncates());
        assert!(Mode::APPEND.creates() && !Mode::APPEND.truncates());
        assert!(Mode::EXCLUSIVE.creates());
    }

    #[test]
    fn canonical_display() {
        assert_eq!("r+b".parse::<Mode>().unwrap().to_string(), "rb+");
        assert_eq!("a".parse::<Mode>().unwrap().to_string(), "a");
    }

    #[test]
    fn rejects_unknown_tokens() {
        for token in ["", "q", "rr", "r++", "rbb", "wt", "+r"] {
            assert!(
                matches!(token.parse::<Mode>(), Err(Error::InvalidMode { .. })),
                "{token:?} should be rejected"
            );
        }
    }

    #[test]
    fn serde_uses_tokens() {
        let mode: Mode = serde_json::from_str("\"ab+\"").unwrap();
        assert_eq!(mode, Mode::new(Access::Append, true, true));
        assert_eq!(serde_json::to_string(&mode).unwrap(), "\"ab+\"");
    }
}
