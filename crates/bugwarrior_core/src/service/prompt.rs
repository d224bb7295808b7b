//! Operator confirmation for timid mode.

use std::io::{self, BufRead, Write};

#[cfg(any(test, feature = "test-util"))]
pub use scripted::ScriptedPrompt;

/// Operator decision for one pending mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimidChoice {
    Apply,
    Skip,
}

impl TimidChoice {
    /// Parses an operator response.
    ///
    /// `a`/`apply` applies; everything else, including unrecognized input,
    /// skips.
    pub fn parse(response: &str) -> Self {
        match response.trim().to_ascii_lowercase().as_str() {
            "a" | "apply" => Self::Apply,
            _ => Self::Skip,
        }
    }
}

/// Source of timid-mode decisions.
pub trait ConfirmPrompt {
    /// Shows `subject` and blocks until the operator answers.
    fn confirm(&self, subject: &str) -> io::Result<TimidChoice>;
}

impl<P: ConfirmPrompt + ?Sized> ConfirmPrompt for &P {
    fn confirm(&self, subject: &str) -> io::Result<TimidChoice> {
        (**self).confirm(subject)
    }
}

/// Prompts on stdout and reads one line from stdin. End of input skips.
#[derive(Debug, Default)]
pub struct StdinPrompt;

impl ConfirmPrompt for StdinPrompt {
    fn confirm(&self, subject: &str) -> io::Result<TimidChoice> {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{subject}")?;
        write!(stdout, "Apply? (a)pply, (s)kip: ")?;
        stdout.flush()?;

        let mut response = String::new();
        if io::stdin().lock().read_line(&mut response)? == 0 {
            return Ok(TimidChoice::Skip);
        }
        Ok(TimidChoice::parse(&response))
    }
}

#[cfg(any(test, feature = "test-util"))]
mod scripted {
    use super::{ConfirmPrompt, TimidChoice};
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::io;

    /// Replays canned responses in order and records what was asked.
    ///
    /// Runs out of responses as skip.
    #[derive(Debug, Default)]
    pub struct ScriptedPrompt {
        responses: RefCell<VecDeque<String>>,
        asked: RefCell<Vec<String>>,
    }

    impl ScriptedPrompt {
        pub fn new<I, S>(responses: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            Self {
                responses: RefCell::new(responses.into_iter().map(Into::into).collect()),
                asked: RefCell::new(Vec::new()),
            }
        }

        /// Subjects shown so far.
        pub fn asked(&self) -> Vec<String> {
            self.asked.borrow().clone()
        }
    }

    impl ConfirmPrompt for ScriptedPrompt {
        fn confirm(&self, subject: &str) -> io::Result<TimidChoice> {
            self.asked.borrow_mut().push(subject.to_string());
            let choice = self
                .responses
                .borrow_mut()
                .pop_front()
                .map_or(TimidChoice::Skip, |response| TimidChoice::parse(&response));
            Ok(choice)
        }
    }
}
