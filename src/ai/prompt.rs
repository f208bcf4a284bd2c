use serde_json::Value;

use crate::ai::formatter::PromptFormatter;
use crate::ai::types::Note;

const MACROS_INSTRUCTION: &str = r#"Please calculate the user's daily macros (calories, protein, fat, carbs) in JSON format like:
{"calories": 2500, "protein": 150, "fat": 70, "carbs": 300}"#;

pub struct PromptBuilder;

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Joins the notes' text with newlines, one line per note.
    pub fn notes_block(&self, notes: &[Note]) -> String {
        notes.iter().map(Note::text).collect::<Vec<_>>().join("\n")
    }

    pub fn build_question_prompt(&self, profile: &Value, question: &str, notes: &[Note]) -> String {
        format!(
            "\nProfile:\n{}\n\nNotes:\n{}\n\nQuestion:\n{}\n",
            PromptFormatter::render(profile),
            self.notes_block(notes),
            question
        )
    }

    pub fn build_macros_prompt(&self, profile: &Value, goals: &[String], notes: &[Note]) -> String {
        format!(
            "\nProfile:\n{}\n\nGoals:\n{}\n\nNotes:\n{}\n\n{}\n",
            PromptFormatter::render(profile),
            goals.join(", "),
            self.notes_block(notes),
            MACROS_INSTRUCTION
        )
    }
}
