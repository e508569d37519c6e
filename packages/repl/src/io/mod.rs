//! I/O boundary of the shell.
//!
//! The shell core only talks to the user through [`IoHost`], so the same
//! loop runs against a terminal or against the in-memory host used in
//! tests.

pub mod types;

#[cfg(test)]
pub mod test_host;

pub use types::*;

#[cfg(test)]
pub use test_host::TestHost;

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("I/O error: {0}")]
    Io(String),
}

/// Where the shell reads commands from and prints results to.
pub trait IoHost {
    /// Block until a line or a signal is available.
    fn wait_for_input(&mut self) -> Result<(), IoError>;

    /// The pending line, if any.
    fn read_input(&mut self) -> Result<Option<InputLine>, IoError>;

    /// The pending signal, if any. Checked before [`read_input`](Self::read_input).
    fn read_signal(&mut self) -> Result<Option<Signal>, IoError>;

    fn write_output(&mut self, output: Output) -> Result<(), IoError>;

    /// Update what the next prompt shows.
    fn write_prompt(&mut self, config: PromptConfig) -> Result<(), IoError>;

    fn flush(&mut self) -> Result<(), IoError> {
        Ok(())
    }
}
