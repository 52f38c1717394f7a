use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;

use crate::domain::schema::ResponseSchema;
use crate::domain::DomainError;

/// Trait for completion providers (OpenAI-compatible chat APIs, etc.)
#[async_trait]
pub trait CompletionProvider: Send + Sync + Debug {
    /// Answer a prompt with free text
    async fn complete(&self, prompt: &str) -> Result<String, DomainError>;

    /// Answer a prompt with a JSON value conforming to `schema`
    async fn complete_structured(
        &self,
        prompt: &str,
        schema: &ResponseSchema,
    ) -> Result<Value, DomainError>;

    /// Get the model used for completions
    fn model_id(&self) -> &str;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Debug)]
    pub struct MockCompletionProvider {
        name: &'static str,
        text: Option<String>,
        structured: Option<Value>,
        error: Option<String>,
        delay: Option<Duration>,
        calls: AtomicUsize,
    }

    impl MockCompletionProvider {
        pub fn new(name: &'static str) -> Self {
            Self {
                name,
                text: None,
                structured: None,
                error: None,
                delay: None,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn with_text(mut self, text: impl Into<String>) -> Self {
            self.text = Some(text.into());
            self
        }

        pub fn with_structured(mut self, value: Value) -> Self {
            self.structured = Some(value);
            self
        }

        pub fn with_error(mut self, error: impl Into<String>) -> Self {
            self.error = Some(error.into());
            self
        }

        /// Sleep before answering, to simulate a slow model
        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        /// Number of completion calls served
        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        async fn before_answer(&self) -> Result<(), DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            match self.error {
                Some(ref error) => Err(DomainError::provider(self.name, error)),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl CompletionProvider for MockCompletionProvider {
        async fn complete(&self, _prompt: &str) -> Result<String, DomainError> {
            self.before_answer().await?;

            self.text
                .clone()
                .ok_or_else(|| DomainError::provider(self.name, "No mock text configured"))
        }

        async fn complete_structured(
            &self,
            _prompt: &str,
            _schema: &ResponseSchema,
        ) -> Result<Value, DomainError> {
            self.before_answer().await?;

            self.structured
                .clone()
                .ok_or_else(|| DomainError::provider(self.name, "No mock structured answer configured"))
        }

        fn model_id(&self) -> &str {
            "mock-model"
        }

        fn provider_name(&self) -> &'static str {
            self.name
        }
    }
}
