use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "macrocoach")]
#[command(about = "Nutrition advice and daily macro targets from your profile, goals and notes")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize ~/.macrocoach
    Init,
    /// Ask a question about your diet or training
    Ask {
        /// The question to ask
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },
    /// Calculate daily calories, protein, fat and carbs
    Macros {
        /// Goal to use instead of the stored goals (repeatable)
        #[arg(short, long = "goal")]
        goals: Vec<String>,
        /// Fail instead of reporting zeros when the reply cannot be parsed
        #[arg(long)]
        strict: bool,
    },
    /// Show or edit your profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// Manage your goals
    Goal {
        #[command(subcommand)]
        action: GoalAction,
    },
    /// Manage your notes
    Note {
        #[command(subcommand)]
        action: NoteAction,
    },
    /// Show configuration
    Config,
    /// Run diagnostics
    Doctor,
    /// Show version information
    Version,
}

#[derive(Subcommand)]
pub enum ProfileAction {
    /// Print the profile as it is sent to the model
    Show,
    /// Set a field; dotted keys address nested fields
    Set {
        key: String,
        /// JSON value, or plain text
        value: String,
    },
    /// Remove a field
    Unset { key: String },
    /// Replace the profile with a JSON or TOML file
    Import { file: PathBuf },
}

#[derive(Subcommand)]
pub enum GoalAction {
    /// Add a goal
    Add {
        #[arg(required = true, num_args = 1..)]
        label: Vec<String>,
    },
    /// List goals
    List,
    /// Remove all goals
    Clear,
}

#[derive(Subcommand)]
pub enum NoteAction {
    /// Add a note
    Add {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// List notes, oldest first
    List,
    /// Remove a note by id or id prefix
    Remove { id: String },
    /// Remove all notes
    Clear,
}
