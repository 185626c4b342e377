use async_trait::async_trait;
use tracing::warn;

use crate::error::Result;

/// Trait for services that can describe a routine from its source
#[async_trait]
pub trait RoutineSummarizer: Send + Sync {
    /// Describe what the routine does and what its parameters mean
    async fn summarize(&self, body: &str, name: &str) -> Result<String>;

    /// Get the provider name (e.g., "OpenAI gpt-4")
    fn provider_name(&self) -> &str;
}

/// Description for a routine, or an empty string when no summarizer is
/// configured or the call fails
pub async fn describe_routine(summarizer: Option<&dyn RoutineSummarizer>, body: &str, name: &str) -> String {
    let Some(summarizer) = summarizer else {
        return String::new();
    };

    match summarizer.summarize(body, name).await {
        Ok(description) => description,
        Err(e) => {
            warn!("⚠️ {} could not summarize {}: {}", summarizer.provider_name(), name, e);
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CatalogError;

    struct EchoSummarizer;

    #[async_trait]
    impl RoutineSummarizer for EchoSummarizer {
        async fn summarize(&self, body: &str, name: &str) -> Result<String> {
            Ok(format!("{} has {} lines", name, body.lines().count()))
        }

        fn provider_name(&self) -> &str {
            "echo"
        }
    }

    struct BrokenSummarizer;

    #[async_trait]
    impl RoutineSummarizer for BrokenSummarizer {
        async fn summarize(&self, _body: &str, _name: &str) -> Result<String> {
            Err(CatalogError::Summarizer("service unavailable".to_string()))
        }

        fn provider_name(&self) -> &str {
            "broken"
        }
    }

    #[tokio::test]
    async fn test_description_stored_verbatim() {
        let description = describe_routine(Some(&EchoSummarizer), "BEGIN\nNULL;\nEND;", "P1").await;
        assert_eq!(description, "P1 has 3 lines");
    }

    #[tokio::test]
    async fn test_failure_or_absence_gives_empty_description() {
        assert_eq!(describe_routine(Some(&BrokenSummarizer), "BEGIN NULL; END;", "P1").await, "");
        assert_eq!(describe_routine(None, "BEGIN NULL; END;", "P1").await, "");
    }
}
