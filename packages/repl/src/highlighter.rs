use nu_ansi_term::{Color, Style};
use reedline::{Highlighter, StyledText};

use crate::commands::COMMAND_NAMES;

/// Colors the command word, the identifier and any `--flags`.
pub struct ReplHighlighter {
    commands: Vec<&'static str>,
}

impl ReplHighlighter {
    pub fn new() -> Self {
        Self {
            commands: COMMAND_NAMES.iter().map(|(name, _)| *name).collect(),
        }
    }
}

impl Default for ReplHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl Highlighter for ReplHighlighter {
    fn highlight(&self, line: &str, _cursor: usize) -> StyledText {
        let mut styled = StyledText::new();

        if line.is_empty() {
            return styled;
        }

        let (command, rest) = split_keep_space(line);

        let cmd_lower = command.trim().to_lowercase();
        let cmd_style = if self.commands.contains(&cmd_lower.as_str()) {
            Style::new().bold().fg(Color::Cyan)
        } else {
            Style::new().fg(Color::Red)
        };
        styled.push((cmd_style, command.to_string()));

        if rest.is_empty() {
            return styled;
        }

        let (identifier, rest) = split_keep_space(rest);
        styled.push((Style::new().fg(Color::Magenta), identifier.to_string()));

        match cmd_lower.as_str() {
            "write" | "w" | "writeb" | "writemany" => {
                let (payload, flag) = match rest.rfind(" --no-flush") {
                    Some(pos) if rest[pos..].trim() == "--no-flush" => rest.split_at(pos),
                    _ => (rest, ""),
                };
                styled.push((Style::new().fg(Color::Green), payload.to_string()));
                if !flag.is_empty() {
                    styled.push((Style::new().fg(Color::Yellow), flag.to_string()));
                }
            }
            _ => {
                for (i, word) in rest.split(' ').enumerate() {
                    if i > 0 {
                        styled.push((Style::new(), " ".to_string()));
                    }
                    let style = if word.starts_with("--") {
                        Style::new().fg(Color::Yellow)
                    } else {
                        Style::new()
                    };
                    styled.push((style, word.to_string()));
                }
            }
        }

        styled
    }
}

/// Split at the first word boundary, keeping the whitespace on the first part.
fn split_keep_space(line: &str) -> (&str, &str) {
    let word_end = line
        .trim_start()
        .find(char::is_whitespace)
        .map(|pos| pos + (line.len() - line.trim_start().len()));
    match word_end {
        Some(pos) => {
            let rest = &line[pos..];
            let next = pos + (rest.len() - rest.trim_start().len());
            (&line[..next], &line[next..])
        }
        None => (line, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(styled: &StyledText) -> String {
        styled.buffer.iter().map(|(_, text)| text.as_str()).collect()
    }

    #[test]
    fn knows_every_command() {
        let highlighter = ReplHighlighter::new();
        for name in ["open", "writemany", "handles", "ls", "exit"] {
            assert!(highlighter.commands.contains(&name), "missing {}", name);
        }
    }

    #[test]
    fn highlight_empty_returns_empty() {
        let highlighter = ReplHighlighter::new();
        assert!(highlighter.highlight("", 0).buffer.is_empty());
    }

    #[test]
    fn unknown_command_is_red() {
        let highlighter = ReplHighlighter::new();
        let styled = highlighter.highlight("frob", 0);
        assert_eq!(styled.buffer[0].0, Style::new().fg(Color::Red));
    }

    #[test]
    fn command_with_arguments_is_recognized() {
        let highlighter = ReplHighlighter::new();
        let styled = highlighter.highlight("read 1 --at 0", 0);
        assert_eq!(
            styled.buffer[0],
            (Style::new().bold().fg(Color::Cyan), "read ".to_string())
        );
    }

    #[test]
    fn highlighting_preserves_text() {
        let highlighter = ReplHighlighter::new();
        for line in [
            "open 1 notes.txt w+",
            "read  2 --lines --at 0",
            "write 1 hello world --no-flush",
            "writemany 1,2 a, b",
            "handles",
        ] {
            assert_eq!(plain(&highlighter.highlight(line, 0)), line);
        }
    }

    #[test]
    fn payload_and_flag_styles() {
        let highlighter = ReplHighlighter::new();
        let styled = highlighter.highlight("write 1 hi there --no-flush", 0);

        assert_eq!(styled.buffer[1], (Style::new().fg(Color::Magenta), "1 ".to_string()));
        assert_eq!(
            styled.buffer[2],
            (Style::new().fg(Color::Green), "hi there".to_string())
        );
        assert_eq!(
            styled.buffer[3],
            (Style::new().fg(Color::Yellow), " --no-flush".to_string())
        );
    }

    #[test]
    fn split_keeps_whitespace() {
        assert_eq!(split_keep_space("open  1"), ("open  ", "1"));
        assert_eq!(split_keep_space("ls"), ("ls", ""));
    }
}
