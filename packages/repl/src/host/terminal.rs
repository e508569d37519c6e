//! Terminal host implementation using Reedline.
//!
//! This host provides interactive terminal I/O with:
//! - Readline-style line editing (Vi and Emacs modes)
//! - Tab completion of command names
//! - Highlighting of commands, identifiers and flags
//! - Command history

use std::borrow::Cow;
use std::io::{self, Write};
use std::path::PathBuf;

use nu_ansi_term::{Color, Style};
use reedline::{
    default_emacs_keybindings, default_vi_insert_keybindings, default_vi_normal_keybindings,
    ColumnarMenu, DefaultHinter, EditCommand, EditMode as LineEditMode, Emacs, KeyCode,
    KeyModifiers, MenuBuilder, Prompt, PromptEditMode, PromptHistorySearch,
    PromptHistorySearchStatus, Reedline, ReedlineEvent, ReedlineMenu, Signal as ReedlineSignal,
    Vi,
};

use crate::completer::ReplCompleter;
use crate::config::{EditMode, ShellConfig};
use crate::highlighter::ReplHighlighter;
use crate::io::{InputLine, IoError, IoHost, Output, OutputStyle, PromptConfig, Signal};

const HISTORY_SIZE: usize = 1000;

/// Terminal host using Reedline for interactive I/O.
pub struct TerminalHost {
    line_editor: Reedline,
    pending_input: Option<InputLine>,
    pending_signal: Option<Signal>,
    current_prompt: PromptConfig,
}

impl TerminalHost {
    pub fn new(config: &ShellConfig) -> io::Result<Self> {
        let completer = Box::new(ReplCompleter::new());
        let highlighter = Box::new(ReplHighlighter::new());
        let hinter = Box::new(
            DefaultHinter::default().with_style(Style::new().fg(Color::LightGray).dimmed()),
        );

        let completion_menu = Box::new(
            ColumnarMenu::default()
                .with_name("completion_menu")
                .with_text_style(Style::new().fg(Color::Cyan))
                .with_selected_text_style(Style::new().fg(Color::Black).on(Color::Cyan).bold()),
        );

        let use_vi = match config.edit_mode {
            Some(mode) => mode == EditMode::Vi,
            None => should_use_vi_mode(),
        };

        let edit_mode: Box<dyn LineEditMode> = if use_vi {
            let mut insert_keybindings = default_vi_insert_keybindings();
            let normal_keybindings = default_vi_normal_keybindings();

            insert_keybindings.add_binding(
                KeyModifiers::NONE,
                KeyCode::Tab,
                ReedlineEvent::UntilFound(vec![
                    ReedlineEvent::Menu("completion_menu".to_string()),
                    ReedlineEvent::MenuNext,
                ]),
            );

            Box::new(Vi::new(insert_keybindings, normal_keybindings))
        } else {
            let mut keybindings = default_emacs_keybindings();
            keybindings.add_binding(
                KeyModifiers::NONE,
                KeyCode::Tab,
                ReedlineEvent::UntilFound(vec![
                    ReedlineEvent::Menu("completion_menu".to_string()),
                    ReedlineEvent::MenuNext,
                ]),
            );
            keybindings.add_binding(
                KeyModifiers::CONTROL,
                KeyCode::Char('d'),
                ReedlineEvent::Edit(vec![EditCommand::Clear]),
            );

            Box::new(Emacs::new(keybindings))
        };

        let mut line_editor = Reedline::create()
            .with_completer(completer)
            .with_highlighter(highlighter)
            .with_hinter(hinter)
            .with_menu(ReedlineMenu::EngineCompleter(completion_menu))
            .with_edit_mode(edit_mode);

        if config.history {
            if let Some(history_path) = history_path() {
                if let Some(parent) = history_path.parent() {
                    if let Err(e) = std::fs::create_dir_all(parent) {
                        log::warn!("Cannot create {}: {}", parent.display(), e);
                    }
                }
                match reedline::FileBackedHistory::with_file(HISTORY_SIZE, history_path) {
                    Ok(history) => line_editor = line_editor.with_history(Box::new(history)),
                    Err(e) => log::warn!("History disabled: {}", e),
                }
            }
        }

        Ok(Self {
            line_editor,
            pending_input: None,
            pending_signal: None,
            current_prompt: PromptConfig::default(),
        })
    }
}

impl IoHost for TerminalHost {
    fn wait_for_input(&mut self) -> Result<(), IoError> {
        let prompt = TerminalPrompt::from_config(&self.current_prompt);

        match self.line_editor.read_line(&prompt) {
            Ok(ReedlineSignal::Success(line)) => {
                self.pending_input = Some(InputLine { line });
            }
            Ok(ReedlineSignal::CtrlC) => {
                self.pending_signal = Some(Signal::Interrupt);
            }
            Ok(ReedlineSignal::CtrlD) => {
                self.pending_signal = Some(Signal::Eof);
            }
            Err(e) => {
                return Err(IoError::Io(format!("Reedline error: {}", e)));
            }
        }

        Ok(())
    }

    fn read_input(&mut self) -> Result<Option<InputLine>, IoError> {
        Ok(self.pending_input.take())
    }

    fn read_signal(&mut self) -> Result<Option<Signal>, IoError> {
        Ok(self.pending_signal.take())
    }

    fn write_output(&mut self, output: Output) -> Result<(), IoError> {
        let styled = match output.style {
            OutputStyle::Normal => output.text,
            OutputStyle::Error => {
                format!("{} {}", Color::Red.bold().paint("Error:"), output.text)
            }
            OutputStyle::Warning => {
                format!("{} {}", Color::Yellow.bold().paint("Warning:"), output.text)
            }
            OutputStyle::Info => Color::Cyan.paint(&output.text).to_string(),
            OutputStyle::Banner => Color::Cyan.paint(&output.text).to_string(),
        };
        println!("{}", styled);
        Ok(())
    }

    fn write_prompt(&mut self, config: PromptConfig) -> Result<(), IoError> {
        self.current_prompt = config;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), IoError> {
        io::stdout().flush().map_err(|e| IoError::Io(e.to_string()))
    }
}

/// Prompt implementation for the terminal.
struct TerminalPrompt {
    handle_count: usize,
    identifier_kind: String,
}

impl TerminalPrompt {
    fn from_config(config: &PromptConfig) -> Self {
        Self {
            handle_count: config.handle_count,
            identifier_kind: config.identifier_kind.clone(),
        }
    }
}

impl Prompt for TerminalPrompt {
    fn render_prompt_left(&self) -> Cow<'_, str> {
        let handles = match self.handle_count {
            0 => Color::Yellow.paint("no files").to_string(),
            1 => Color::Blue.bold().paint("1 file").to_string(),
            n => Color::Blue.bold().paint(format!("{} files", n)).to_string(),
        };
        Cow::Owned(format!(
            "{} {}",
            handles,
            Color::DarkGray.paint(format!("[{} ids]", self.identifier_kind))
        ))
    }

    fn render_prompt_right(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, edit_mode: PromptEditMode) -> Cow<'_, str> {
        match edit_mode {
            PromptEditMode::Default | PromptEditMode::Emacs => {
                Cow::Owned(format!("{} ", Color::Green.bold().paint(">")))
            }
            PromptEditMode::Vi(vi_mode) => {
                let indicator = match vi_mode {
                    reedline::PromptViMode::Normal => Color::Blue.bold().paint("[N]>"),
                    reedline::PromptViMode::Insert => Color::Green.bold().paint("[I]>"),
                };
                Cow::Owned(format!("{} ", indicator))
            }
            PromptEditMode::Custom(s) => Cow::Owned(format!("({})> ", s)),
        }
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<'_, str> {
        Cow::Borrowed(": ")
    }

    fn render_prompt_history_search_indicator(
        &self,
        history_search: PromptHistorySearch,
    ) -> Cow<'_, str> {
        let prefix = match history_search.status {
            PromptHistorySearchStatus::Passing => "",
            PromptHistorySearchStatus::Failing => "failing ",
        };
        Cow::Owned(format!(
            "({}reverse-search: {}) ",
            prefix, history_search.term
        ))
    }
}

fn history_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|p| p.join("modefile").join("history.txt"))
}

/// Guess vi mode from `EDITOR`, `VISUAL` and `.inputrc`.
fn should_use_vi_mode() -> bool {
    ["EDITOR", "VISUAL"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .any(|editor| is_vi_editor(&editor))
        || check_inputrc_vi_mode()
}

fn is_vi_editor(editor: &str) -> bool {
    let name = editor
        .rsplit('/')
        .next()
        .unwrap_or(editor)
        .to_lowercase();
    name == "vi" || name.contains("vim")
}

/// Check .inputrc for vi mode setting.
fn check_inputrc_vi_mode() -> bool {
    let inputrc_paths = [
        std::env::var("INPUTRC").ok().map(PathBuf::from),
        dirs::home_dir().map(|p| p.join(".inputrc")),
        Some(PathBuf::from("/etc/inputrc")),
    ];

    inputrc_paths
        .into_iter()
        .flatten()
        .filter_map(|path| std::fs::read_to_string(path).ok())
        .any(|content| inputrc_selects_vi(&content))
}

fn inputrc_selects_vi(content: &str) -> bool {
    content.lines().map(str::trim).any(|line| {
        let words: Vec<&str> = line.split_whitespace().collect();
        words == ["set", "editing-mode", "vi"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_vi_editors() {
        assert!(is_vi_editor("vi"));
        assert!(is_vi_editor("/usr/bin/nvim"));
        assert!(is_vi_editor("VIM"));
        assert!(!is_vi_editor("emacs"));
        assert!(!is_vi_editor("/opt/vivaldi"));
    }

    #[test]
    fn reads_inputrc_editing_mode() {
        assert!(inputrc_selects_vi("# comment\nset editing-mode vi\n"));
        assert!(!inputrc_selects_vi("set editing-mode emacs\n"));
        assert!(!inputrc_selects_vi("# set editing-mode vi\n"));
    }

    #[test]
    fn prompt_shows_file_count() {
        let prompt = TerminalPrompt::from_config(&PromptConfig {
            handle_count: 2,
            identifier_kind: "numeric".to_string(),
        });
        let left = prompt.render_prompt_left();
        assert!(left.contains("2 files"));
        assert!(left.contains("numeric"));
    }
}
