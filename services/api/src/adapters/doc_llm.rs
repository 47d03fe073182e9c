//! services/api/src/adapters/doc_llm.rs
//!
//! This module contains the adapter for the document-generation tools.
//! It implements the `DocumentDraftingService` port from the `core` crate.
//! Each tool gets its own system instruction and prompt template; the
//! judgment summarizer and scenario simulator have structured outputs, every
//! other tool uses the generic drafting template.

const SUMMARIZER_SYSTEM: &str = "You are an expert legal summarizer for Indian Case Law.";
const SUMMARIZER_TEMPLATE: &str = r#"Analyze and summarize the following Indian Court Judgment text.

Input Text:
"{details}"

Requirements:
1. Output in Markdown format.
2. Language: {language}.
3. Structure:
   - **Case Title & Citation**: (Extract if available, otherwise N/A)
   - **Court**: (Supreme Court / High Court, etc.)
   - **Facts of the Case**: Brief chronological summary.
   - **Issues Involved**: Legal questions raised.
   - **Arguments**: Petitioner vs Respondent arguments.
   - **Judgment/Held**: The final verdict and reasoning.
   - **Key Statutes Cited**: List sections/acts.
"#;

const SCENARIO_SYSTEM: &str = "You are a legal risk analyst.";
const SCENARIO_TEMPLATE: &str = r#"Analyze the following legal scenario under Indian Law:

Scenario:
"{details}"

Provide a detailed analysis including:
1. Potential Offences (IPC/Other Acts).
2. Likely Legal Consequences (Punishment/Fine).
3. Legal Risk Score (1-10) with reasoning.
4. Recommended Course of Action.
5. Relevant Case Laws.

Language: {language}.
"#;

const DRAFTER_SYSTEM: &str = "You are a professional legal drafter.";
const DRAFTER_TEMPLATE: &str = r#"Draft a professional legal {doc_type} for the Indian Legal System based on these details:
"{details}"

Format: standard legal document format.
Language: {language}.
Include placeholders like [Date], [Signature] where necessary.
Output ONLY the document content in Markdown."#;

const GENERATION_FAILED_FALLBACK: &str = "Failed to generate document.";

use async_trait::async_trait;
use nyaya_core::domain::{AppSettings, DocumentKind};
use nyaya_core::ports::{DocumentDraftingService, PortResult};

use crate::adapters::gemini::{Content, GeminiClient, GenerateContentRequest};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `DocumentDraftingService` against the Gemini API.
#[derive(Clone)]
pub struct GeminiDocAdapter {
    client: GeminiClient,
    model: String,
}

impl GeminiDocAdapter {
    /// Creates a new `GeminiDocAdapter`.
    pub fn new(client: GeminiClient, model: String) -> Self {
        Self { client, model }
    }

    fn build_prompt(kind: DocumentKind, details: &str, settings: &AppSettings) -> (String, String) {
        let language = settings.language.label();
        match kind {
            DocumentKind::JudgmentSummarizer => (
                SUMMARIZER_SYSTEM.to_string(),
                SUMMARIZER_TEMPLATE
                    .replace("{details}", details)
                    .replace("{language}", language),
            ),
            DocumentKind::ScenarioSimulator => (
                SCENARIO_SYSTEM.to_string(),
                SCENARIO_TEMPLATE
                    .replace("{details}", details)
                    .replace("{language}", language),
            ),
            DocumentKind::FirGenerator | DocumentKind::LegalNoticeDrafter => (
                DRAFTER_SYSTEM.to_string(),
                DRAFTER_TEMPLATE
                    .replace("{doc_type}", kind.name())
                    .replace("{details}", details)
                    .replace("{language}", language),
            ),
        }
    }
}

//=========================================================================================
// `DocumentDraftingService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DocumentDraftingService for GeminiDocAdapter {
    /// Generates a markdown document from the user's free-text details.
    async fn draft_document(
        &self,
        kind: DocumentKind,
        details: &str,
        settings: &AppSettings,
    ) -> PortResult<String> {
        let (system, prompt) = Self::build_prompt(kind, details, settings);

        let request = GenerateContentRequest {
            system_instruction: Some(Content::text(None, system)),
            contents: vec![Content::text(Some("user"), prompt)],
            generation_config: None,
            safety_settings: None,
        };

        let text = self.client.generate(&self.model, &request).await?;
        if text.is_empty() {
            Ok(GENERATION_FAILED_FALLBACK.to_string())
        } else {
            Ok(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nyaya_core::domain::Language;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    fn adapter(base_url: &str) -> GeminiDocAdapter {
        let client = GeminiClient::new(Some("test-api-key".into()))
            .unwrap()
            .with_base_url(base_url.to_string());
        GeminiDocAdapter::new(client, "gemini-2.5-flash".into())
    }

    fn settings() -> AppSettings {
        AppSettings {
            language: Language::English,
            complexity: nyaya_core::domain::Complexity::Simple,
        }
    }

    fn reply_body(text: &str) -> serde_json::Value {
        serde_json::json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]
        })
    }

    async fn sent_prompt(server: &MockServer) -> (String, String) {
        let requests: Vec<Request> = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        (
            body["systemInstruction"]["parts"][0]["text"]
                .as_str()
                .unwrap()
                .to_string(),
            body["contents"][0]["parts"][0]["text"]
                .as_str()
                .unwrap()
                .to_string(),
        )
    }

    #[tokio::test]
    async fn summarizer_uses_the_structured_template() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.5-flash:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply_body("# Summary")))
            .mount(&server)
            .await;

        let doc = adapter(&server.uri())
            .draft_document(DocumentKind::JudgmentSummarizer, "judgment text", &settings())
            .await
            .unwrap();
        assert_eq!(doc, "# Summary");

        let (system, prompt) = sent_prompt(&server).await;
        assert_eq!(system, SUMMARIZER_SYSTEM);
        assert!(prompt.contains("judgment text"));
        assert!(prompt.contains("**Judgment/Held**"));
        assert!(prompt.contains("Language: English."));
    }

    #[tokio::test]
    async fn scenario_simulator_asks_for_a_risk_score() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply_body("Analysis")))
            .mount(&server)
            .await;

        adapter(&server.uri())
            .draft_document(DocumentKind::ScenarioSimulator, "a dispute", &settings())
            .await
            .unwrap();

        let (system, prompt) = sent_prompt(&server).await;
        assert_eq!(system, SCENARIO_SYSTEM);
        assert!(prompt.contains("Legal Risk Score (1-10)"));
    }

    #[tokio::test]
    async fn fir_generator_falls_through_to_the_drafting_template() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply_body("# FIR")))
            .mount(&server)
            .await;

        adapter(&server.uri())
            .draft_document(DocumentKind::FirGenerator, "theft on 12 March", &settings())
            .await
            .unwrap();

        let (system, prompt) = sent_prompt(&server).await;
        assert_eq!(system, DRAFTER_SYSTEM);
        assert!(prompt.contains("legal FIR Generator"));
        assert!(prompt.contains("theft on 12 March"));
        assert!(prompt.contains("[Signature]"));
    }

    #[tokio::test]
    async fn empty_candidates_fall_back_to_the_failure_copy() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"candidates": []})),
            )
            .mount(&server)
            .await;

        let doc = adapter(&server.uri())
            .draft_document(DocumentKind::LegalNoticeDrafter, "details", &settings())
            .await
            .unwrap();
        assert_eq!(doc, GENERATION_FAILED_FALLBACK);
    }
}
