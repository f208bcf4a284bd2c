use anyhow::Result;
use log::{debug, info};
use std::env;
use std::path::Path;

use crate::ai::{AdviceClient, OpenAiClient, PromptFormatter};
use crate::cli::{Commands, GoalAction, NoteAction, OutputFormatter, ProfileAction, Spinner};
use crate::config::Settings;
use crate::profile::ProfileManager;
use crate::utils::InputValidator;

pub struct CommandHandler {
    profiles: ProfileManager,
    advisor: AdviceClient<OpenAiClient>,
    settings: Settings,
    formatter: OutputFormatter,
    validator: InputValidator,
}

impl CommandHandler {
    pub fn new() -> Result<Self> {
        let settings = Settings::load()?;
        let profiles = ProfileManager::new()?;

        let api_key = resolve_api_key(&settings);
        let service = OpenAiClient::new(&settings, api_key)?;
        let advisor = AdviceClient::from_settings(service, &settings);
        let formatter = OutputFormatter::new(settings.output.use_colors);

        Ok(Self {
            profiles,
            advisor,
            settings,
            formatter,
            validator: InputValidator::new(),
        })
    }

    pub async fn handle_command(&self, command: Commands) -> Result<String> {
        match command {
            Commands::Init => self.handle_init(),
            Commands::Ask { question } => self.handle_ask(&question.join(" ")).await,
            Commands::Macros { goals, strict } => self.handle_macros(goals, strict).await,
            Commands::Profile { action } => self.handle_profile(action),
            Commands::Goal { action } => self.handle_goal(action),
            Commands::Note { action } => self.handle_note(action),
            Commands::Config => self.handle_config(),
            Commands::Doctor => self.handle_doctor().await,
            Commands::Version => Ok(version_info()),
        }
    }

    fn handle_init(&self) -> Result<String> {
        self.profiles.initialize_directory()?;

        let mut output = vec![self.formatter.format_success(&format!(
            "Initialized {}",
            self.profiles.storage().app_dir().display()
        ))];

        if !self.advisor.service().has_api_key() {
            output.push(self.formatter.format_warning(&format!(
                "{} is not set. Export it or add it to a .env file before asking questions.",
                self.settings.api.api_key_env
            )));
        }

        Ok(output.join("\n"))
    }

    async fn handle_ask(&self, question: &str) -> Result<String> {
        let question = self.validator.validate_question(question)?;
        let profile = self.profiles.profile()?;
        let notes = self.profiles.prompt_notes()?;
        debug!("Asking with {} notes", notes.len());

        let spinner = Spinner::new("Thinking...");
        let answer = self
            .advisor
            .answer_question(&profile, &question, &notes)
            .await?;
        spinner.stop();

        Ok(self.formatter.format_answer(&answer))
    }

    async fn handle_macros(&self, goals: Vec<String>, strict: bool) -> Result<String> {
        let goals = if goals.is_empty() {
            self.profiles.goals()?
        } else {
            goals
                .iter()
                .map(|g| self.validator.validate_goal(g))
                .collect::<Result<Vec<_>>>()?
        };
        let profile = self.profiles.profile()?;
        let notes = self.profiles.prompt_notes()?;
        info!("Calculating macros for {} goals", goals.len());

        let spinner = Spinner::new("Calculating macros...");
        let macros = if strict {
            self.advisor
                .try_compute_macros(&profile, &goals, &notes)
                .await?
        } else {
            self.advisor.compute_macros(&profile, &goals, &notes).await?
        };
        spinner.stop();

        Ok(self.formatter.format_macros(&macros))
    }

    fn handle_profile(&self, action: ProfileAction) -> Result<String> {
        match action {
            ProfileAction::Show => {
                let profile = self.profiles.profile()?;
                Ok(self
                    .formatter
                    .format_profile(&PromptFormatter::render(&profile)))
            }
            ProfileAction::Set { key, value } => {
                self.profiles.set_field(&key, &value)?;
                Ok(self.formatter.format_success(&format!("Set {key}")))
            }
            ProfileAction::Unset { key } => {
                if self.profiles.unset_field(&key)? {
                    Ok(self.formatter.format_success(&format!("Removed {key}")))
                } else {
                    Ok(self.formatter.format_info(&format!("{key} is not set")))
                }
            }
            ProfileAction::Import { file } => {
                let profile = self.profiles.import_profile(&file)?;
                let fields = profile.as_object().map_or(0, |m| m.len());
                Ok(self.formatter.format_success(&format!(
                    "Imported {fields} fields from {}",
                    file.display()
                )))
            }
        }
    }

    fn handle_goal(&self, action: GoalAction) -> Result<String> {
        match action {
            GoalAction::Add { label } => {
                let label = self.validator.validate_goal(&label.join(" "))?;
                let goals = self.profiles.add_goal(&label)?;
                Ok(self
                    .formatter
                    .format_success(&format!("Added goal #{}: {label}", goals.len())))
            }
            GoalAction::List => Ok(self.formatter.format_goals(&self.profiles.goals()?)),
            GoalAction::Clear => {
                let cleared = self.profiles.clear_goals()?;
                Ok(self
                    .formatter
                    .format_success(&format!("Cleared {cleared} goals")))
            }
        }
    }

    fn handle_note(&self, action: NoteAction) -> Result<String> {
        match action {
            NoteAction::Add { text } => {
                let text = self.validator.validate_note(&text.join(" "))?;
                let note = self.profiles.add_note(&text)?;
                Ok(self
                    .formatter
                    .format_success(&format!("Added note {}", note.short_id())))
            }
            NoteAction::List => Ok(self.formatter.format_notes(&self.profiles.notes()?)),
            NoteAction::Remove { id } => {
                if self.profiles.remove_note(&id)? {
                    Ok(self.formatter.format_success(&format!("Removed note {id}")))
                } else {
                    Ok(self.formatter.format_info(&format!("No note matches {id}")))
                }
            }
            NoteAction::Clear => {
                let cleared = self.profiles.clear_notes()?;
                Ok(self
                    .formatter
                    .format_success(&format!("Cleared {cleared} notes")))
            }
        }
    }

    fn handle_config(&self) -> Result<String> {
        let storage = self.profiles.storage();

        Ok(format!(
            "macrocoach Configuration:\n\
            - Config file: {:?}\n\
            - Profile file: {:?}\n\
            - Goals file: {:?}\n\
            - Notes database: {:?}\n\
            - API base URL: {}\n\
            - API key variable: {} ({})\n\
            - Model: {}\n\
            - Temperature: {}\n\
            - Request timeout: {}s\n\
            - Use colors: {}",
            storage.config_path(),
            storage.profile_path(),
            storage.goals_path(),
            storage.notes_db_path(),
            self.advisor.service().base_url(),
            self.settings.api.api_key_env,
            if self.advisor.service().has_api_key() {
                "set"
            } else {
                "not set"
            },
            self.advisor.model(),
            self.advisor.temperature(),
            self.settings.api.timeout_secs,
            self.settings.output.use_colors
        ))
    }

    async fn handle_doctor(&self) -> Result<String> {
        let spinner = Spinner::new("Running diagnostics...");
        let mut diagnostics = Vec::new();
        let storage = self.profiles.storage();

        if storage.config_path().exists() {
            diagnostics.push("✓ Config file exists".to_string());
        } else {
            diagnostics.push("✗ Config file missing (run: macrocoach init)".to_string());
        }

        match self.profiles.profile() {
            Ok(profile) if profile.as_object().is_some_and(|m| !m.is_empty()) => {
                diagnostics.push("✓ Profile has data".to_string())
            }
            Ok(_) => diagnostics.push("✗ Profile is empty (run: macrocoach profile set)".to_string()),
            Err(e) => diagnostics.push(format!("✗ Profile unreadable: {e}")),
        }

        match self.profiles.note_count() {
            Ok(count) => diagnostics.push(format!("✓ Notes database ({count} notes)")),
            Err(e) => diagnostics.push(format!("✗ Notes database: {e}")),
        }

        if self.advisor.service().has_api_key() {
            diagnostics.push(format!("✓ {} is set", self.settings.api.api_key_env));
        } else {
            diagnostics.push(format!("✗ {} is not set", self.settings.api.api_key_env));
        }

        match self.advisor.service().verify_connection().await {
            Ok(_) => diagnostics.push("✓ Completion service reachable".to_string()),
            Err(e) => diagnostics.push(format!("✗ Completion service: {e}")),
        }

        spinner.stop();
        Ok(format!("macrocoach Health Check:\n{}", diagnostics.join("\n")))
    }

    pub fn format_error(&self, message: &str) -> String {
        self.formatter.format_error(message)
    }
}

/// Reads the API key from the environment variable named in the settings.
pub fn resolve_api_key(settings: &Settings) -> Option<String> {
    env::var(&settings.api.api_key_env)
        .ok()
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
}

/// Loads `.env` from the working directory, if there is one.
pub fn load_dotenv() {
    let candidate = Path::new(".env");
    if !candidate.exists() {
        debug!("No .env file found; relying on process environment");
        return;
    }

    match dotenvy::from_path(candidate) {
        Ok(_) => info!("Loaded .env"),
        Err(e) => log::warn!("Failed to load .env: {e}"),
    }
}

pub fn version_info() -> String {
    format!(
        "macrocoach {}\nRust version: {}\nPlatform: {}-{}",
        env!("CARGO_PKG_VERSION"),
        env!("MACROCOACH_RUSTC_VERSION"),
        env::consts::OS,
        env::consts::ARCH
    )
}
