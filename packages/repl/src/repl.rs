//! Platform-independent shell core.
//!
//! [`ReplCore`] owns the registry and talks to the user only through
//! [`IoHost`]. [`run`] wires it to the terminal.

use modefile_core::{IdentifierKind, Registry, RegistryKey, TextEncoding};

use crate::commands::{self, CommandResult};
use crate::config::ShellConfig;
use crate::host::TerminalHost;
use crate::io::{ExitReason, IoError, IoHost, Output, PromptConfig, Signal};

/// The shell core, keyed by `K`.
pub struct ReplCore<K: RegistryKey> {
    registry: Registry<K>,
}

impl<K: RegistryKey> ReplCore<K> {
    pub fn new(default_encoding: TextEncoding) -> Self {
        Self {
            registry: Registry::with_encoding(default_encoding),
        }
    }

    /// Run the shell loop until the user exits or input ends.
    ///
    /// Every open file is closed before returning.
    pub fn run(&mut self, io: &mut impl IoHost) -> Result<ExitReason, IoError> {
        self.write_banner(io)?;

        let reason = loop {
            self.update_prompt(io)?;
            io.wait_for_input()?;

            if let Some(signal) = io.read_signal()? {
                match signal {
                    Signal::Eof => break ExitReason::Eof,
                    Signal::Interrupt => {
                        io.write_output(Output::info("^C (use 'exit' to quit)"))?;
                        continue;
                    }
                }
            }

            let input = match io.read_input()? {
                Some(input) => input,
                None => continue,
            };

            match commands::execute(&input.line, &mut self.registry) {
                CommandResult::Ok { display, warnings } => {
                    for warning in warnings {
                        io.write_output(Output::warning(warning))?;
                    }
                    if let Some(output) = display {
                        io.write_output(Output::normal(output))?;
                    }
                }
                CommandResult::Error(msg) => {
                    io.write_output(Output::error(msg))?;
                }
                CommandResult::Help => {
                    io.write_output(Output::normal(commands::format_help()))?;
                }
                CommandResult::Exit => break ExitReason::UserExit,
            }

            io.flush()?;
        };

        if let Err(e) = self.registry.close_all() {
            io.write_output(Output::error(format!("Failed to close files: {}", e)))?;
        }
        io.write_output(Output::info("Goodbye!"))?;
        io.flush()?;
        Ok(reason)
    }

    pub fn registry(&self) -> &Registry<K> {
        &self.registry
    }

    fn write_banner(&self, io: &mut impl IoHost) -> Result<(), IoError> {
        io.write_output(Output::banner(BANNER))
    }

    fn update_prompt(&self, io: &mut impl IoHost) -> Result<(), IoError> {
        io.write_prompt(PromptConfig {
            handle_count: self.registry.len(),
            identifier_kind: K::KIND.to_string(),
        })
    }
}

impl<K: RegistryKey> Default for ReplCore<K> {
    fn default() -> Self {
        Self::new(TextEncoding::default())
    }
}

/// Run an interactive session on the terminal.
pub fn run(config: &ShellConfig) -> Result<ExitReason, IoError> {
    let mut host = TerminalHost::new(config).map_err(|e| IoError::Io(e.to_string()))?;

    match config.identifier_kind {
        IdentifierKind::Numeric => {
            ReplCore::<u64>::new(config.default_encoding).run(&mut host)
        }
        IdentifierKind::Text => {
            ReplCore::<String>::new(config.default_encoding).run(&mut host)
        }
    }
}

const BANNER: &str = r#"
                     _       __ _ _
 _ __ ___   ___   __| | ___ / _(_) | ___
| '_ ` _ \ / _ \ / _` |/ _ \ |_| | |/ _ \
| | | | | | (_) | (_| |  __/  _| | |  __/
|_| |_| |_|\___/ \__,_|\___|_| |_|_|\___|

Type 'help' for available commands, 'exit' to quit.
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{OutputStyle, TestHost};
    use tempfile::TempDir;

    #[test]
    fn test_exit_command() {
        let mut core = ReplCore::<u64>::default();
        let mut host = TestHost::with_inputs(["exit"]);

        let result = core.run(&mut host);

        assert!(matches!(result, Ok(ExitReason::UserExit)));
        assert!(host.output().iter().any(|o| o.text.contains("Goodbye")));
    }

    #[test]
    fn test_eof_signal() {
        let mut core = ReplCore::<u64>::default();
        let mut host = TestHost::new();

        let result = core.run(&mut host);

        assert!(matches!(result, Ok(ExitReason::Eof)));
    }

    #[test]
    fn test_interrupt_continues() {
        let mut core = ReplCore::<u64>::default();
        let mut host = TestHost::with_inputs(["exit"]);
        host.queue_signal(Signal::Interrupt);

        let result = core.run(&mut host);

        assert!(matches!(result, Ok(ExitReason::UserExit)));
        assert!(host.output().iter().any(|o| o.text.contains("^C")));
    }

    #[test]
    fn test_session_writes_file_and_closes_on_exit() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("session.txt");

        let mut core = ReplCore::<u64>::default();
        let mut host = TestHost::with_inputs([
            format!("open 1 {} w", file.display()),
            "write 1 kept --no-flush".to_string(),
            "exit".to_string(),
        ]);

        core.run(&mut host).unwrap();

        assert!(core.registry().is_empty());
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "kept");
    }

    #[test]
    fn test_prompt_tracks_handles() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("p.txt");

        let mut core = ReplCore::<String>::default();
        let mut host = TestHost::with_inputs([format!("open log {} a", file.display())]);

        core.run(&mut host).unwrap();

        let prompt = host.last_prompt().unwrap();
        assert_eq!(prompt.handle_count, 1);
        assert_eq!(prompt.identifier_kind, "text");
    }

    #[test]
    fn test_errors_and_warnings_are_styled() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("w.txt");

        let mut core = ReplCore::<u64>::default();
        let mut host = TestHost::with_inputs([
            "read 9".to_string(),
            format!("open 1 {} w", file.display()),
            "writeb 1 //4A".to_string(),
        ]);

        core.run(&mut host).unwrap();

        assert_eq!(host.errors().len(), 1);
        assert!(host.errors()[0].contains("No file registered"));
        assert_eq!(host.output_with_style(OutputStyle::Warning).len(), 1);
    }
}
