use anyhow::{bail, Result};

const MAX_TEXT_CHARS: usize = 4000;
const MAX_LABEL_CHARS: usize = 120;

/// Checks free text typed on the command line before it reaches a prompt
/// or the local store.
pub struct InputValidator;

impl InputValidator {
    pub fn new() -> Self {
        Self
    }

    /// Strips control characters (other than newlines and tabs) and trims.
    pub fn sanitize_text(&self, text: &str) -> String {
        let cleaned: String = text
            .chars()
            .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
            .collect();

        cleaned.trim().to_string()
    }

    pub fn validate_question(&self, question: &str) -> Result<String> {
        let sanitized = self.sanitize_text(question);
        if sanitized.is_empty() {
            bail!("The question is empty");
        }
        if sanitized.chars().count() > MAX_TEXT_CHARS {
            bail!("The question must be at most {MAX_TEXT_CHARS} characters");
        }
        Ok(sanitized)
    }

    pub fn validate_note(&self, text: &str) -> Result<String> {
        let sanitized = self.sanitize_text(text);
        if sanitized.is_empty() {
            bail!("The note is empty");
        }
        if sanitized.chars().count() > MAX_TEXT_CHARS {
            bail!("A note must be at most {MAX_TEXT_CHARS} characters");
        }
        Ok(sanitized)
    }

    /// Goals are short single-line labels.
    pub fn validate_goal(&self, label: &str) -> Result<String> {
        let sanitized = self.sanitize_text(label);

        if sanitized.is_empty() {
            bail!("The goal is empty");
        }
        if sanitized.contains('\n') {
            bail!("A goal must fit on one line");
        }
        if sanitized.chars().count() > MAX_LABEL_CHARS {
            bail!("A goal must be at most {MAX_LABEL_CHARS} characters");
        }

        Ok(sanitized)
    }
}

impl Default for InputValidator {
    fn default() -> Self {
        Self::new()
    }
}
