//! In-memory host for driving the shell from tests.

use std::collections::VecDeque;

use super::{InputLine, IoError, IoHost, Output, OutputStyle, PromptConfig, Signal};

/// Replays queued lines and records everything the shell prints.
///
/// Once the queued lines and signals run out the host reports end of
/// input, so a session always terminates.
#[derive(Debug, Default)]
pub struct TestHost {
    input_queue: VecDeque<String>,
    signal_queue: VecDeque<Signal>,
    output_buffer: Vec<Output>,
    prompts: Vec<PromptConfig>,
}

impl TestHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_inputs(lines: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let mut host = Self::new();
        host.input_queue
            .extend(lines.into_iter().map(Into::into));
        host
    }

    pub fn queue_signal(&mut self, signal: Signal) {
        self.signal_queue.push_back(signal);
    }

    pub fn output(&self) -> &[Output] {
        &self.output_buffer
    }

    /// Output of the given style, in order.
    pub fn output_with_style(&self, style: OutputStyle) -> Vec<&str> {
        self.output_buffer
            .iter()
            .filter(|o| o.style == style)
            .map(|o| o.text.as_str())
            .collect()
    }

    pub fn normal(&self) -> Vec<&str> {
        self.output_with_style(OutputStyle::Normal)
    }

    pub fn errors(&self) -> Vec<&str> {
        self.output_with_style(OutputStyle::Error)
    }

    pub fn last_prompt(&self) -> Option<&PromptConfig> {
        self.prompts.last()
    }
}

impl IoHost for TestHost {
    fn wait_for_input(&mut self) -> Result<(), IoError> {
        Ok(())
    }

    fn read_input(&mut self) -> Result<Option<InputLine>, IoError> {
        Ok(self.input_queue.pop_front().map(|line| InputLine { line }))
    }

    fn read_signal(&mut self) -> Result<Option<Signal>, IoError> {
        if let Some(signal) = self.signal_queue.pop_front() {
            return Ok(Some(signal));
        }
        if self.input_queue.is_empty() {
            return Ok(Some(Signal::Eof));
        }
        Ok(None)
    }

    fn write_output(&mut self, output: Output) -> Result<(), IoError> {
        self.output_buffer.push(output);
        Ok(())
    }

    fn write_prompt(&mut self, config: PromptConfig) -> Result<(), IoError> {
        self.prompts.push(config);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replays_lines_then_reports_eof() {
        let mut host = TestHost::with_inputs(["first", "second"]);

        assert!(host.read_signal().unwrap().is_none());
        assert_eq!(host.read_input().unwrap().unwrap().line, "first");
        assert_eq!(host.read_input().unwrap().unwrap().line, "second");
        assert!(matches!(host.read_signal().unwrap(), Some(Signal::Eof)));
    }

    #[test]
    fn queued_signals_come_first() {
        let mut host = TestHost::with_inputs(["line"]);
        host.queue_signal(Signal::Interrupt);

        assert!(matches!(
            host.read_signal().unwrap(),
            Some(Signal::Interrupt)
        ));
        assert!(host.read_signal().unwrap().is_none());
    }

    #[test]
    fn output_is_grouped_by_style() {
        let mut host = TestHost::new();
        host.write_output(Output::normal("ok")).unwrap();
        host.write_output(Output::error("bad")).unwrap();
        host.write_output(Output::info("fyi")).unwrap();

        assert_eq!(host.normal(), vec!["ok"]);
        assert_eq!(host.errors(), vec!["bad"]);
        assert_eq!(host.output().len(), 3);
    }
}
