pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1/";
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

pub struct DefaultConfig;

impl DefaultConfig {
    pub fn create_default_config_file() -> String {
        r#"[api]
base_url = "https://api.openai.com/v1/"
api_key_env = "OPENAI_API_KEY"
timeout_secs = 60

[model]
name = "gpt-4"
temperature = 0.7

[output]
use_colors = true
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    #[test]
    fn default_file_matches_default_settings() {
        let parsed: Settings = toml::from_str(&DefaultConfig::create_default_config_file()).unwrap();
        assert_eq!(parsed, Settings::default());
    }
}
