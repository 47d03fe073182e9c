//! crates/nyaya_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the
//! core to be independent of the concrete persistence layer and of the
//! external generative-language service.

use async_trait::async_trait;

use crate::domain::{AppSettings, ChatSession, DocumentKind, Message, UserState};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services
/// (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Missing credential: {0}")]
    MissingCredential(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The local durable key-value store holding the three persisted records.
///
/// Loads return `Ok(None)` for absent *or unparseable* records — the caller
/// falls back to documented defaults either way. Saves overwrite the record
/// wholesale; there are no partial writes and no transactions.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn load_user_state(&self) -> PortResult<Option<UserState>>;
    async fn save_user_state(&self, state: &UserState) -> PortResult<()>;

    async fn load_settings(&self) -> PortResult<Option<AppSettings>>;
    async fn save_settings(&self, settings: &AppSettings) -> PortResult<()>;

    async fn load_sessions(&self) -> PortResult<Option<Vec<ChatSession>>>;
    async fn save_sessions(&self, sessions: &[ChatSession]) -> PortResult<()>;
}

/// The conversational side of the generation gateway.
#[async_trait]
pub trait ConversationService: Send + Sync {
    /// Generates the model's reply to `message`, given the ordered history
    /// of the session and the user's generation preferences. `premium`
    /// selects the premium model variant.
    async fn generate_reply(
        &self,
        history: &[Message],
        message: &str,
        settings: &AppSettings,
        premium: bool,
    ) -> PortResult<String>;
}

/// The document-drafting side of the generation gateway.
#[async_trait]
pub trait DocumentDraftingService: Send + Sync {
    /// Generates a markdown document of the given kind from free-text
    /// details supplied by the user.
    async fn draft_document(
        &self,
        kind: DocumentKind,
        details: &str,
        settings: &AppSettings,
    ) -> PortResult<String>;
}
