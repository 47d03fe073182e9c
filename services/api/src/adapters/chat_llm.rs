//! services/api/src/adapters/chat_llm.rs
//!
//! This module contains the adapter for the conversational legal assistant.
//! It implements the `ConversationService` port from the `core` crate.

const SYSTEM_INSTRUCTION: &str = r#"You are Nyaya Sahayak, an expert AI Legal Assistant for Indian Law.
Your goal is to assist users with the Indian Penal Code (IPC), Code of Criminal Procedure (CrPC), Civil Procedure Code (CPC), and the Constitution of India.

CRITICAL RULES:
1. DISCLAIMER: Always start advice on sensitive matters with a brief disclaimer: "I am an AI, not a lawyer. Consult a professional."
2. TONE: Professional, objective, and empathetic.
3. JURISDICTION: STRICTLY Indian Law. If asked about US/UK law, politely decline and refocus on India.
4. FORMATTING: Use Markdown. Use bold for Section numbers (e.g., **Section 302 IPC**).
5. STRUCTURE:
   - Brief Summary (Simple English/Hindi as requested).
   - Relevant Sections & Acts.
   - Punishment/Penalties (if applicable).
   - Next Legal Steps (Procedural advice).
"#;

const EMPTY_REPLY_FALLBACK: &str = "I could not generate a response. Please try rephrasing.";

use async_trait::async_trait;
use nyaya_core::domain::{AppSettings, Complexity, Message, Role};
use nyaya_core::ports::{ConversationService, PortResult};

use crate::adapters::gemini::{
    Content, GeminiClient, GenerateContentRequest, GenerationConfig, SafetySetting,
};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `ConversationService` against the Gemini API.
#[derive(Clone)]
pub struct GeminiChatAdapter {
    client: GeminiClient,
    model: String,
    premium_model: String,
}

impl GeminiChatAdapter {
    /// Creates a new `GeminiChatAdapter`.
    pub fn new(client: GeminiClient, model: String, premium_model: String) -> Self {
        Self {
            client,
            model,
            premium_model,
        }
    }

    fn system_instruction(settings: &AppSettings) -> String {
        let language_instruction = format!("Respond in {}.", settings.language.label());
        let complexity_instruction = match settings.complexity {
            Complexity::Simple => "Explain in simple layman terms without heavy jargon.",
            Complexity::Legal => {
                "Provide detailed legal reasoning, citing specific case laws and section nuances."
            }
        };
        format!("{SYSTEM_INSTRUCTION}\n{language_instruction}\n{complexity_instruction}")
    }

    fn wire_role(role: Role) -> &'static str {
        match role {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

//=========================================================================================
// `ConversationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl ConversationService for GeminiChatAdapter {
    /// Generates the assistant's reply to the latest user message.
    async fn generate_reply(
        &self,
        history: &[Message],
        message: &str,
        settings: &AppSettings,
        premium: bool,
    ) -> PortResult<String> {
        let mut contents: Vec<Content> = history
            .iter()
            .map(|m| Content::text(Some(Self::wire_role(m.role)), m.content.clone()))
            .collect();
        contents.push(Content::text(Some("user"), message));

        let request = GenerateContentRequest {
            system_instruction: Some(Content::text(None, Self::system_instruction(settings))),
            contents,
            // Low temperature for factual legal accuracy.
            generation_config: Some(GenerationConfig { temperature: 0.3 }),
            safety_settings: Some(vec![
                SafetySetting {
                    category: "HARM_CATEGORY_DANGEROUS_CONTENT",
                    threshold: "BLOCK_MEDIUM_AND_ABOVE",
                },
                SafetySetting {
                    category: "HARM_CATEGORY_HATE_SPEECH",
                    threshold: "BLOCK_LOW_AND_ABOVE",
                },
            ]),
        };

        let model = if premium {
            &self.premium_model
        } else {
            &self.model
        };

        let text = self.client.generate(model, &request).await?;
        if text.is_empty() {
            Ok(EMPTY_REPLY_FALLBACK.to_string())
        } else {
            Ok(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use nyaya_core::domain::Language;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    fn adapter(base_url: &str) -> GeminiChatAdapter {
        let client = GeminiClient::new(Some("test-api-key".into()))
            .unwrap()
            .with_base_url(base_url.to_string());
        GeminiChatAdapter::new(
            client,
            "gemini-2.5-flash".into(),
            "gemini-3-pro-preview".into(),
        )
    }

    fn settings() -> AppSettings {
        AppSettings {
            language: Language::Hindi,
            complexity: Complexity::Simple,
        }
    }

    fn reply_body(text: &str) -> serde_json::Value {
        serde_json::json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]
        })
    }

    #[tokio::test]
    async fn history_and_current_message_become_ordered_contents() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.5-flash:generateContent"))
            .and(body_partial_json(serde_json::json!({
                "contents": [
                    {"role": "user", "parts": [{"text": "What is an FIR?"}]},
                    {"role": "model", "parts": [{"text": "A First Information Report."}]},
                    {"role": "user", "parts": [{"text": "Who can file one?"}]}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply_body("Anyone.")))
            .expect(1)
            .mount(&server)
            .await;

        let now = Utc.with_ymd_and_hms(2026, 8, 31, 9, 0, 0).unwrap();
        let history = vec![
            Message::user("What is an FIR?", now),
            Message::model("A First Information Report.", now),
        ];

        let reply = adapter(&server.uri())
            .generate_reply(&history, "Who can file one?", &settings(), false)
            .await
            .unwrap();
        assert_eq!(reply, "Anyone.");
    }

    #[tokio::test]
    async fn premium_flag_selects_the_premium_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-3-pro-preview:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply_body("Deep analysis.")))
            .expect(1)
            .mount(&server)
            .await;

        let reply = adapter(&server.uri())
            .generate_reply(&[], "Analyze this case.", &settings(), true)
            .await
            .unwrap();
        assert_eq!(reply, "Deep analysis.");
    }

    #[tokio::test]
    async fn system_instruction_carries_language_and_complexity() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply_body("ok")))
            .expect(1)
            .mount(&server)
            .await;

        adapter(&server.uri())
            .generate_reply(&[], "hello", &settings(), false)
            .await
            .unwrap();

        let requests: Vec<Request> = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        let instruction = body["systemInstruction"]["parts"][0]["text"].as_str().unwrap();
        assert!(instruction.contains("Respond in Hindi."));
        assert!(instruction.contains("simple layman terms"));
    }

    #[tokio::test]
    async fn empty_candidates_fall_back_to_the_rephrase_copy() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"candidates": []})),
            )
            .mount(&server)
            .await;

        let reply = adapter(&server.uri())
            .generate_reply(&[], "hello", &settings(), false)
            .await
            .unwrap();
        assert_eq!(reply, EMPTY_REPLY_FALLBACK);
    }
}
