use anyhow::Result;
use log::{debug, info, warn};
use serde_json::Value;
use thiserror::Error;

use crate::ai::completion::CompletionService;
use crate::ai::prompt::PromptBuilder;
use crate::ai::types::{CompletionRequest, MacroResult, Note};
use crate::config::Settings;

pub const DEFAULT_MODEL: &str = "gpt-4";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Error)]
pub enum AdviceError {
    #[error(transparent)]
    Completion(#[from] anyhow::Error),
    #[error("response is not a valid macro object ({source}): {raw}")]
    UnparseableResponse {
        raw: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Asks a completion service for nutrition advice about a profile.
pub struct AdviceClient<C> {
    service: C,
    prompts: PromptBuilder,
    model: String,
    temperature: f32,
}

impl<C: CompletionService> AdviceClient<C> {
    pub fn new(service: C) -> Self {
        Self {
            service,
            prompts: PromptBuilder::new(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    /// Creates a client using the model and temperature from `settings`.
    pub fn from_settings(service: C, settings: &Settings) -> Self {
        Self::new(service)
            .with_model(settings.model.name.clone())
            .with_temperature(settings.model.temperature)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn service(&self) -> &C {
        &self.service
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    /// Answers a free-form question in the context of the profile and notes.
    pub async fn answer_question(
        &self,
        profile: &Value,
        question: &str,
        notes: &[Note],
    ) -> Result<String> {
        debug!("Answering question: {question}");

        let prompt = self.prompts.build_question_prompt(profile, question, notes);
        let answer = self.submit(prompt).await?;

        info!("Received answer of {} characters", answer.len());
        Ok(answer)
    }

    /// Computes daily macros, falling back to all zeros when the model's
    /// reply cannot be parsed.
    pub async fn compute_macros(
        &self,
        profile: &Value,
        goals: &[String],
        notes: &[Note],
    ) -> Result<MacroResult> {
        match self.try_compute_macros(profile, goals, notes).await {
            Ok(macros) => Ok(macros),
            Err(AdviceError::UnparseableResponse { raw, source }) => {
                warn!("Falling back to zero macros, unparseable response ({source}): {raw}");
                Ok(MacroResult::zero())
            }
            Err(AdviceError::Completion(e)) => Err(e),
        }
    }

    /// Computes daily macros, reporting an unparseable reply as
    /// [`AdviceError::UnparseableResponse`].
    pub async fn try_compute_macros(
        &self,
        profile: &Value,
        goals: &[String],
        notes: &[Note],
    ) -> std::result::Result<MacroResult, AdviceError> {
        debug!("Computing macros for {} goals", goals.len());

        let prompt = self.prompts.build_macros_prompt(profile, goals, notes);
        let response = self.submit(prompt).await?;
        let macros = parse_macros(&response)?;

        info!(
            "Computed macros: {} kcal, {}g protein, {}g fat, {}g carbs",
            macros.calories, macros.protein, macros.fat, macros.carbs
        );
        Ok(macros)
    }

    async fn submit(&self, prompt: String) -> Result<String> {
        let request = CompletionRequest {
            model: self.model.clone(),
            prompt,
            temperature: self.temperature,
        };

        debug!(
            "Submitting prompt to {}, length: {}",
            request.model,
            request.prompt.len()
        );

        let response = self.service.complete(&request).await?;
        Ok(response.trim().to_string())
    }
}

fn parse_macros(response: &str) -> std::result::Result<MacroResult, AdviceError> {
    serde_json::from_str::<MacroResult>(response).map_err(|source| {
        AdviceError::UnparseableResponse {
            raw: response.to_string(),
            source,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    struct ScriptedService {
        reply: std::result::Result<String, String>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedService {
        fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                reply: Err(message.to_string()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn last_request(&self) -> CompletionRequest {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl CompletionService for ScriptedService {
        async fn complete(&self, request: &CompletionRequest) -> Result<String> {
            self.requests.lock().unwrap().push(request.clone());
            self.reply.clone().map_err(anyhow::Error::msg)
        }
    }

    fn profile() -> Value {
        json!({"age": 34, "weight_kg": 82, "activity": {"runs_per_week": 3}})
    }

    #[tokio::test]
    async fn answer_is_trimmed() {
        let client = AdviceClient::new(ScriptedService::replying("\n  Drink about 3 litres.  \n"));

        let answer = client
            .answer_question(&profile(), "How much water?", &[])
            .await
            .unwrap();

        assert_eq!(answer, "Drink about 3 litres.");
    }

    #[tokio::test]
    async fn question_request_uses_defaults_and_sections() {
        let client = AdviceClient::new(ScriptedService::replying("ok"));

        client
            .answer_question(&profile(), "Is coffee fine?", &[Note::new("two cups a day")])
            .await
            .unwrap();

        let request = client.service().last_request();
        assert_eq!(request.model, "gpt-4");
        assert_eq!(request.temperature, 0.7);

        let profile_at = request.prompt.find("Profile:\n").unwrap();
        let notes_at = request.prompt.find("Notes:\ntwo cups a day").unwrap();
        let question_at = request.prompt.find("Question:\nIs coffee fine?").unwrap();
        assert!(profile_at < notes_at && notes_at < question_at);
    }

    #[tokio::test]
    async fn question_errors_propagate() {
        let client = AdviceClient::new(ScriptedService::failing("401 Unauthorized"));

        let err = client
            .answer_question(&profile(), "Anything?", &[])
            .await
            .unwrap_err();

        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn well_formed_macros_are_returned_exactly() {
        let client = AdviceClient::new(ScriptedService::replying(
            r#"{"calories": 2500, "protein": 150, "fat": 70, "carbs": 300}"#,
        ));

        let macros = client
            .compute_macros(&profile(), &["lose fat".to_string()], &[])
            .await
            .unwrap();

        assert_eq!(
            macros,
            MacroResult {
                calories: 2500.0,
                protein: 150.0,
                fat: 70.0,
                carbs: 300.0,
            }
        );
    }

    #[tokio::test]
    async fn prose_falls_back_to_zero() {
        let client = AdviceClient::new(ScriptedService::replying(
            "You should eat roughly 2500 calories a day.",
        ));

        let macros = client.compute_macros(&profile(), &[], &[]).await.unwrap();

        assert_eq!(macros, MacroResult::zero());
    }

    #[tokio::test]
    async fn missing_field_falls_back_to_zero() {
        let client = AdviceClient::new(ScriptedService::replying(r#"{"calories": 2500}"#));

        let macros = client.compute_macros(&profile(), &[], &[]).await.unwrap();

        assert!(macros.is_zero());
    }

    #[tokio::test]
    async fn strict_variant_reports_unparseable_response() {
        let client = AdviceClient::new(ScriptedService::replying("not json"));

        let err = client
            .try_compute_macros(&profile(), &[], &[])
            .await
            .unwrap_err();

        match err {
            AdviceError::UnparseableResponse { raw, .. } => assert_eq!(raw, "not json"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn macro_completion_errors_are_not_zeroed() {
        let client = AdviceClient::new(ScriptedService::failing("connection refused"));

        let result = client.compute_macros(&profile(), &[], &[]).await;

        assert!(result.is_err());
    }

    #[test]
    fn configured_model_and_temperature_are_sent() {
        let client = AdviceClient::new(ScriptedService::replying("fine"))
            .with_model("gpt-4o-mini")
            .with_temperature(0.2);

        tokio_test::block_on(client.answer_question(&json!({}), "hi", &[])).unwrap();

        let request = client.service().last_request();
        assert_eq!(request.model, "gpt-4o-mini");
        assert_eq!(request.temperature, 0.2);
        assert_eq!(request.prompt, "\nProfile:\n\n\nNotes:\n\n\nQuestion:\nhi\n");
    }
}
