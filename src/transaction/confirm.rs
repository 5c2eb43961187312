//! Commit confirmation sources.

/// Question asked before committing.
pub const COMMIT_PROMPT: &str = "Do you want to commit the configuration(Y/N)? ";

/// Answers the commit question.
#[cfg_attr(test, mockall::automock)]
pub trait Confirmation: Send + Sync {
    /// Ask `question`; `true` only for an affirmative answer.
    fn confirm(&self, question: &str) -> bool;
}

/// Pre-authorized confirmation (`--noprompt`).
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeYes;

impl Confirmation for AssumeYes {
    fn confirm(&self, _question: &str) -> bool {
        true
    }
}

/// Only `y` or `Y`, surrounding whitespace ignored, affirms.
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim(), "y" | "Y")
}
