pub mod args;
pub mod commands;
pub mod output;

pub use args::{Cli, Commands, GoalAction, NoteAction, ProfileAction};
pub use commands::{load_dotenv, resolve_api_key, version_info, CommandHandler};
pub use output::{OutputFormatter, Spinner};
