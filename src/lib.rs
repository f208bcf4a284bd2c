pub mod ai;
pub mod cli;
pub mod config;
pub mod profile;
pub mod utils;

pub use ai::{AdviceClient, AdviceError, CompletionService, MacroResult, Note, PromptFormatter};
pub use cli::{Cli, CommandHandler, Commands};
pub use config::Settings;
pub use profile::ProfileManager;
