use std::sync::Arc;

use crate::domain::analysis::{mock_analysis_document, template_answer, AnalysisDocument};
use crate::services::llm_gateway::{extract, Extraction, LlmGateway};

pub struct AnalysisService {
    llm: Arc<dyn LlmGateway>,
}

impl AnalysisService {
    pub fn new(llm: Arc<dyn LlmGateway>) -> Self {
        AnalysisService { llm }
    }

    // An unusable model response degrades to the canned template, never to
    // an error.
    pub async fn generate(
        &self,
        query: &str,
        web_context: &str,
        source_urls: &[String],
    ) -> AnalysisDocument {
        let raw = match self.llm.analysis_document(query, web_context).await {
            Ok(raw) => raw,
            Err(e) => {
                log::error!("Analysis generation failed, using the template: {:?}", e);
                return mock_analysis_document(query, source_urls);
            }
        };

        match extract::<AnalysisDocument>(&raw) {
            Extraction::Parsed(mut document) => {
                document.sources = source_urls.to_vec();
                document
            }
            Extraction::Fallback { reason } => {
                log::error!("Analysis output unusable, using the template: {}", reason);
                mock_analysis_document(query, source_urls)
            }
        }
    }

    pub async fn answer(&self, message: &str, web_context: &str) -> String {
        match self.llm.chat_answer(message, web_context).await {
            Ok(answer) => answer,
            Err(e) => {
                log::error!("Chat completion failed, using the template: {:?}", e);
                template_answer(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use crate::services::llm_gateway::{CandidateSummary, MockGateway};

    use super::*;

    struct FailingGateway;

    #[async_trait]
    impl LlmGateway for FailingGateway {
        async fn intent_judgement(&self, _: &str) -> anyhow::Result<String> {
            anyhow::bail!("offline")
        }
        async fn candidate_judgement(
            &self,
            _: &str,
            _: &[CandidateSummary],
        ) -> anyhow::Result<String> {
            anyhow::bail!("offline")
        }
        async fn content_judgement(&self, _: &str, _: &str) -> anyhow::Result<String> {
            anyhow::bail!("offline")
        }
        async fn analysis_document(&self, _: &str, _: &str) -> anyhow::Result<String> {
            anyhow::bail!("offline")
        }
        async fn chat_answer(&self, _: &str, _: &str) -> anyhow::Result<String> {
            anyhow::bail!("offline")
        }
    }

    struct ProseGateway;

    #[async_trait]
    impl LlmGateway for ProseGateway {
        async fn intent_judgement(&self, _: &str) -> anyhow::Result<String> {
            Ok(String::new())
        }
        async fn candidate_judgement(
            &self,
            _: &str,
            _: &[CandidateSummary],
        ) -> anyhow::Result<String> {
            Ok(String::new())
        }
        async fn content_judgement(&self, _: &str, _: &str) -> anyhow::Result<String> {
            Ok(String::new())
        }
        async fn analysis_document(&self, _: &str, _: &str) -> anyhow::Result<String> {
            Ok("Je ne peux pas produire de JSON aujourd'hui.".to_string())
        }
        async fn chat_answer(&self, _: &str, _: &str) -> anyhow::Result<String> {
            Ok("Réponse libre.".to_string())
        }
    }

    #[tokio::test]
    async fn mock_gateway_produces_a_structured_document() {
        let service = AnalysisService::new(Arc::new(MockGateway));
        let sources = vec!["https://a.example".to_string()];

        let document = service
            .generate("marché du luxe", "contexte", &sources)
            .await;

        assert_eq!(document.sections.len(), 5);
        assert_eq!(document.sources, sources);
        assert!(document.title.contains("marché du luxe"));
    }

    #[tokio::test]
    async fn gateway_failure_degrades_to_the_template() {
        let service = AnalysisService::new(Arc::new(FailingGateway));
        let sources = vec!["https://a.example".to_string()];

        let document = service
            .generate("marché du luxe", "contexte", &sources)
            .await;
        let answer = service.answer("marché du luxe", "contexte").await;

        assert_eq!(document, mock_analysis_document("marché du luxe", &sources));
        assert_eq!(answer, template_answer("marché du luxe"));
    }

    #[tokio::test]
    async fn prose_output_degrades_to_the_template() {
        let service = AnalysisService::new(Arc::new(ProseGateway));

        let document = service.generate("marché du luxe", "contexte", &[]).await;
        let answer = service.answer("marché du luxe", "contexte").await;

        assert_eq!(document, mock_analysis_document("marché du luxe", &[]));
        assert_eq!(answer, "Réponse libre.");
    }
}
