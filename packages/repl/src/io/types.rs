//! Values exchanged between the shell core and its host.

/// A line typed by the user.
#[derive(Debug, Clone)]
pub struct InputLine {
    pub line: String,
}

/// A control signal from the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Ctrl+C.
    Interrupt,
    /// Ctrl+D, or the input ran out.
    Eof,
}

/// Text for the host to print.
#[derive(Debug, Clone)]
pub struct Output {
    pub text: String,
    pub style: OutputStyle,
}

impl Output {
    fn styled(text: impl Into<String>, style: OutputStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    pub fn normal(text: impl Into<String>) -> Self {
        Self::styled(text, OutputStyle::Normal)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::styled(text, OutputStyle::Error)
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::styled(text, OutputStyle::Warning)
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::styled(text, OutputStyle::Info)
    }

    pub fn banner(text: impl Into<String>) -> Self {
        Self::styled(text, OutputStyle::Banner)
    }
}

/// Style hint for output rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputStyle {
    /// Already formatted; printed as is.
    #[default]
    Normal,
    /// Host adds a red `Error:` prefix.
    Error,
    /// Host adds a yellow `Warning:` prefix.
    Warning,
    Info,
    Banner,
}

/// What the prompt should show.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptConfig {
    /// Number of open file handles.
    pub handle_count: usize,
    /// `"numeric"` or `"text"`.
    pub identifier_kind: String,
}

/// Why the shell loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitReason {
    /// `exit` or `quit`.
    UserExit,
    Eof,
}
