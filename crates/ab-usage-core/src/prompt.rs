//! Console abstraction for the interactive editor and preview loop.
//!
//! All operator interaction goes through the [`Prompt`] trait so the core
//! state machines can be driven by a real terminal in the CLI and by a
//! scripted double in tests.

use std::collections::VecDeque;
use std::io;

/// A line-oriented console.
pub trait Prompt {
    /// Print a line of output.
    fn say(&mut self, text: &str);

    /// Print `question` and block for one line of input.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the input stream is closed or unreadable.
    fn ask(&mut self, question: &str) -> io::Result<String>;
}

/// Deterministic console double: replies are served from a fixed script
/// and everything printed is captured in `transcript`.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    replies: VecDeque<String>,
    /// Everything printed via [`Prompt::say`] and every question asked.
    pub transcript: Vec<String>,
}

impl ScriptedPrompt {
    /// Create a prompt that will answer with `replies` in order.
    #[must_use]
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: replies.into_iter().map(Into::into).collect(),
            transcript: Vec::new(),
        }
    }

    /// Whether every scripted reply was consumed.
    #[must_use]
    pub fn exhausted(&self) -> bool {
        self.replies.is_empty()
    }
}

impl Prompt for ScriptedPrompt {
    fn say(&mut self, text: &str) {
        self.transcript.push(text.to_string());
    }

    fn ask(&mut self, question: &str) -> io::Result<String> {
        self.transcript.push(question.to_string());
        self.replies.pop_front().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("script ran out of replies at: {question}"),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_replies_are_served_in_order() {
        let mut prompt = ScriptedPrompt::new(["a", "b"]);
        assert_eq!(prompt.ask("first? ").unwrap(), "a");
        assert_eq!(prompt.ask("second? ").unwrap(), "b");
        assert!(prompt.exhausted());
        assert!(prompt.ask("third? ").is_err());
    }

    #[test]
    fn transcript_records_output_and_questions() {
        let mut prompt = ScriptedPrompt::new(["y"]);
        prompt.say("hello");
        prompt.ask("ok? ").unwrap();
        assert_eq!(prompt.transcript, vec!["hello", "ok? "]);
    }
}
