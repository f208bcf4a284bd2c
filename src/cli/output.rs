use console::{style, Color};
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::ai::MacroResult;
use crate::profile::StoredNote;

pub struct OutputFormatter {
    use_colors: bool,
}

pub struct Spinner {
    running: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl Spinner {
    pub fn new(message: &str) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();
        let message = message.to_string();

        let handle = thread::spawn(move || {
            let frames = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
            let mut frame_index = 0;

            while running_clone.load(Ordering::Relaxed) {
                eprint!("\r{} {}", frames[frame_index], message);
                let _ = io::stderr().flush();
                frame_index = (frame_index + 1) % frames.len();
                thread::sleep(Duration::from_millis(100));
            }

            // Clear the spinner line
            eprint!("\r{}\r", " ".repeat(message.chars().count() + 3));
            let _ = io::stderr().flush();
        });

        Self {
            running,
            handle: Some(handle),
        }
    }

    pub fn stop(mut self) {
        self.halt();
    }

    fn halt(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

// Errors bubble out with `?` while the spinner is live; don't leave it drawing.
impl Drop for Spinner {
    fn drop(&mut self) {
        self.halt();
    }
}

impl OutputFormatter {
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    pub fn format_answer(&self, answer: &str) -> String {
        answer.to_string()
    }

    pub fn format_macros(&self, macros: &MacroResult) -> String {
        if macros.is_zero() {
            return self.format_warning(
                "The model did not return usable macros (all values are zero). Try again or use --strict to see the raw reply.",
            );
        }

        let rows = [
            ("Calories", format!("{} kcal", macros.calories)),
            ("Protein", format!("{} g", macros.protein)),
            ("Fat", format!("{} g", macros.fat)),
            ("Carbs", format!("{} g", macros.carbs)),
        ];

        rows.iter()
            .map(|(label, value)| {
                format!(
                    "{} {}",
                    self.style_text(&format!("{label:<9}"), Color::Cyan),
                    self.style_text(value, Color::Green)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn format_notes(&self, notes: &[StoredNote]) -> String {
        if notes.is_empty() {
            return self.format_info("No notes yet. Add one with: macrocoach note add <text>");
        }

        notes
            .iter()
            .map(|note| {
                format!(
                    "{} {} {}",
                    self.style_text(&note.short_id(), Color::Cyan),
                    self.style_text(
                        &note.created_at.format("%Y-%m-%d %H:%M").to_string(),
                        Color::Blue
                    ),
                    note.text
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn format_goals(&self, goals: &[String]) -> String {
        if goals.is_empty() {
            return self.format_info("No goals yet. Add one with: macrocoach goal add <label>");
        }

        goals
            .iter()
            .enumerate()
            .map(|(i, goal)| {
                let number = format!("{}. ", i + 1);
                format!("{}{}", self.style_text(&number, Color::Cyan), goal)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn format_profile(&self, rendered: &str) -> String {
        if rendered.is_empty() {
            return self
                .format_info("Profile is empty. Set a field with: macrocoach profile set <key> <value>");
        }
        rendered.to_string()
    }

    pub fn format_error(&self, message: &str) -> String {
        format!("{} {}", self.style_text("Error:", Color::Red), message)
    }

    pub fn format_success(&self, message: &str) -> String {
        format!("{} {}", self.style_text("✓", Color::Green), message)
    }

    pub fn format_warning(&self, message: &str) -> String {
        format!("{} {}", self.style_text("⚠", Color::Yellow), message)
    }

    pub fn format_info(&self, message: &str) -> String {
        format!("{} {}", self.style_text("ℹ", Color::Blue), message)
    }

    fn style_text(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            style(text).fg(color).to_string()
        } else {
            text.to_string()
        }
    }
}

impl Default for OutputFormatter {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn macros_table_without_colors() {
        let formatter = OutputFormatter::new(false);
        let table = formatter.format_macros(&MacroResult {
            calories: 2500.0,
            protein: 150.0,
            fat: 70.0,
            carbs: 300.5,
        });

        assert_eq!(
            table,
            "Calories  2500 kcal\nProtein   150 g\nFat       70 g\nCarbs     300.5 g"
        );
    }

    #[test]
    fn zero_macros_become_a_warning() {
        let formatter = OutputFormatter::new(false);
        assert!(formatter
            .format_macros(&MacroResult::zero())
            .starts_with("⚠ The model did not return usable macros"));
    }

    #[test]
    fn goals_are_numbered() {
        let formatter = OutputFormatter::new(false);
        assert_eq!(
            formatter.format_goals(&["lose 4kg".to_string(), "sleep more".to_string()]),
            "1. lose 4kg\n2. sleep more"
        );
    }
}
