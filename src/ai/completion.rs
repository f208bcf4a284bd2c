use anyhow::Result;
use async_trait::async_trait;

use crate::ai::types::CompletionRequest;

/// Something that turns a prompt into generated text.
///
/// Implementations own transport and authentication. Errors are returned to
/// the caller as-is; no retries happen at this layer.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}
