use reedline::{Completer, Span, Suggestion};

use crate::commands::COMMAND_NAMES;

/// Completes command names in the first word of the line.
pub struct ReplCompleter {
    commands: Vec<(&'static str, &'static str)>,
}

impl ReplCompleter {
    pub fn new() -> Self {
        Self {
            commands: COMMAND_NAMES.to_vec(),
        }
    }
}

impl Default for ReplCompleter {
    fn default() -> Self {
        Self::new()
    }
}

impl Completer for ReplCompleter {
    fn complete(&mut self, line: &str, pos: usize) -> Vec<Suggestion> {
        let mut suggestions = Vec::new();

        let line_to_pos = &line[..pos];
        let words: Vec<&str> = line_to_pos.split_whitespace().collect();

        if words.is_empty() || (words.len() == 1 && !line_to_pos.ends_with(' ')) {
            let prefix = words.first().copied().unwrap_or("");
            let start = line_to_pos.rfind(prefix).unwrap_or(0);

            for (cmd, description) in &self.commands {
                if cmd.starts_with(prefix) {
                    suggestions.push(Suggestion {
                        value: cmd.to_string(),
                        description: Some(description.to_string()),
                        style: None,
                        extra: None,
                        span: Span::new(start, pos),
                        append_whitespace: true,
                        match_indices: None,
                    });
                }
            }
        }

        suggestions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completes_command_prefix() {
        let mut completer = ReplCompleter::new();
        let values: Vec<String> = completer
            .complete("wri", 3)
            .into_iter()
            .map(|s| s.value)
            .collect();

        assert_eq!(values, vec!["write", "writeb", "writemany"]);
    }

    #[test]
    fn no_completion_after_command() {
        let mut completer = ReplCompleter::new();
        assert!(completer.complete("read ", 5).is_empty());
    }

    #[test]
    fn span_covers_typed_prefix() {
        let mut completer = ReplCompleter::new();
        let suggestions = completer.complete("  han", 5);

        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].span, Span::new(2, 5));
    }
}
