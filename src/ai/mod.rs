pub mod advice;
pub mod completion;
pub mod formatter;
pub mod openai_client;
pub mod prompt;
pub mod types;

pub use advice::{AdviceClient, AdviceError};
pub use completion::CompletionService;
pub use formatter::PromptFormatter;
pub use openai_client::OpenAiClient;
pub use prompt::PromptBuilder;
pub use types::{CompletionRequest, MacroResult, Note};
