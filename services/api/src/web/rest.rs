//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification. Each endpoint maps to exactly
//! one store operation of the core; the UI renders from `GET /state` after
//! every action.
//!
//! Quota exhaustion and access denial are not HTTP errors here: they are
//! typed outcome payloads that tell the UI to show an upgrade prompt.

use crate::web::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use nyaya_core::domain::{
    AppSettings, ChatSession, Complexity, DocumentKind, Message, SettingsUpdate,
    SubscriptionTier, UserState, PRICING_PLANS,
};
use nyaya_core::ports::PortError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::{OpenApi, ToSchema};

/// The user-visible copy appended to the conversation when a generation
/// fails. The turn is flagged so the UI can style it; the consumed quota
/// unit is not refunded.
const CHAT_FAILURE_COPY: &str =
    "I encountered a temporary error connecting to the legal database. Please try again.";

/// The static tool output shown when document generation fails.
const DOC_FAILURE_COPY: &str = "Error generating document. Please try again.";

/// Feature name used for the upgrade prompt when the Legal complexity mode
/// is blocked by the tier gate.
const LEGAL_MODE_FEATURE: &str = "Legal Mode";

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        snapshot_handler,
        new_session_handler,
        select_session_handler,
        send_message_handler,
        update_settings_handler,
        list_plans_handler,
        select_plan_handler,
        list_tools_handler,
        generate_document_handler,
        purchase_handler,
        reset_limits_handler,
    ),
    components(
        schemas(
            SnapshotResponse,
            UserStateDto,
            SettingsDto,
            SessionDto,
            MessageDto,
            ToolDto,
            ChatOutcome,
            SettingsOutcome,
            ToolOutcome,
        )
    ),
    tags(
        (name = "Nyaya Sahayak API", description = "Store operations behind the legal-assistant UI.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserStateDto {
    tier: String,
    daily_queries_used: u32,
    daily_query_limit: u32,
    last_query_date: String,
    documents_generated: u32,
    unlocked_features: Vec<String>,
}

impl From<&UserState> for UserStateDto {
    fn from(state: &UserState) -> Self {
        Self {
            tier: state.tier.label().to_string(),
            daily_queries_used: state.daily_queries_used,
            daily_query_limit: state.tier.limits().daily_queries,
            last_query_date: state.last_query_date.to_rfc3339(),
            documents_generated: state.documents_generated,
            unlocked_features: state.unlocked_features.iter().cloned().collect(),
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettingsDto {
    language: String,
    complexity: String,
}

impl From<&AppSettings> for SettingsDto {
    fn from(settings: &AppSettings) -> Self {
        Self {
            language: settings.language.label().to_string(),
            complexity: match settings.complexity {
                Complexity::Simple => "Simple".to_string(),
                Complexity::Legal => "Legal".to_string(),
            },
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    id: String,
    role: String,
    content: String,
    timestamp: i64,
    is_error: bool,
}

impl From<&Message> for MessageDto {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id.to_string(),
            role: match message.role {
                nyaya_core::domain::Role::User => "user".to_string(),
                nyaya_core::domain::Role::Model => "model".to_string(),
            },
            content: message.content.clone(),
            timestamp: message.timestamp.timestamp_millis(),
            is_error: message.is_error,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionDto {
    id: String,
    title: String,
    updated_at: i64,
    messages: Vec<MessageDto>,
}

impl From<&ChatSession> for SessionDto {
    fn from(session: &ChatSession) -> Self {
        Self {
            id: session.id.clone(),
            title: session.title.clone(),
            updated_at: session.updated_at.timestamp_millis(),
            messages: session.messages.iter().map(MessageDto::from).collect(),
        }
    }
}

/// The full render state for the UI.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotResponse {
    user_state: UserStateDto,
    settings: SettingsDto,
    active_session_id: String,
    sessions: Vec<SessionDto>,
}

/// One entry of the tool catalogue, with the access decision precomputed
/// for the current entitlement state.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToolDto {
    id: String,
    name: String,
    description: String,
    required_tier: String,
    one_time_price: String,
    accessible: bool,
}

/// Outcome of a send-message action.
#[derive(Debug, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ChatOutcome {
    /// The model's turn (possibly a flagged error turn) was appended.
    Reply { message: MessageDto },
    /// The daily quota is exhausted; the UI shows an upgrade prompt.
    QuotaExhausted { used: u32, limit: u32 },
    /// Another send is already in flight; this one was rejected, not queued.
    Busy,
}

/// Outcome of a settings update.
#[derive(Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum SettingsOutcome {
    Updated { settings: SettingsDto },
    UpgradeRequired { feature: String },
}

/// Outcome of a document-generation action.
#[derive(Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ToolOutcome {
    Document { content: String },
    UpgradeRequired {
        feature: String,
        required_tier: String,
        one_time_price: String,
    },
}

#[derive(Deserialize, ToSchema)]
pub struct SendMessageRequest {
    pub content: String,
}

#[derive(Deserialize, ToSchema)]
pub struct SelectPlanRequest {
    pub tier: SubscriptionTier,
}

#[derive(Deserialize, ToSchema)]
pub struct PurchaseRequest {
    pub feature: String,
}

#[derive(Deserialize, ToSchema)]
pub struct ToolRequest {
    pub tool: DocumentKind,
    pub details: String,
}

//=========================================================================================
// Helpers
//=========================================================================================

fn internal(context: &str, e: PortError) -> (StatusCode, String) {
    error!("{context}: {e:?}");
    (StatusCode::INTERNAL_SERVER_ERROR, context.to_string())
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Full application snapshot for UI rendering.
#[utoipa::path(
    get,
    path = "/state",
    responses(
        (status = 200, description = "Current stores", body = SnapshotResponse)
    )
)]
pub async fn snapshot_handler(State(app_state): State<Arc<AppState>>) -> Json<SnapshotResponse> {
    let stores = app_state.stores.lock().await;
    Json(SnapshotResponse {
        user_state: UserStateDto::from(&stores.user),
        settings: SettingsDto::from(&stores.settings),
        active_session_id: stores.sessions.active_id().to_string(),
        sessions: stores.sessions.sessions().iter().map(SessionDto::from).collect(),
    })
}

/// Create a new empty chat session and make it active.
///
/// Like every mutating handler here, the change is applied to a candidate
/// copy and persisted before the working store is updated, so a failed
/// save leaves memory and disk in agreement.
#[utoipa::path(
    post,
    path = "/sessions",
    responses(
        (status = 201, description = "Session created", body = SessionDto),
        (status = 500, description = "Failed to persist the session collection")
    )
)]
pub async fn new_session_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<SessionDto>), (StatusCode, String)> {
    let mut stores = app_state.stores.lock().await;
    let mut sessions = stores.sessions.clone();
    let session = SessionDto::from(sessions.new_session(Utc::now()));
    app_state
        .db
        .save_sessions(sessions.sessions())
        .await
        .map_err(|e| internal("Failed to persist sessions", e))?;
    stores.sessions = sessions;
    Ok((StatusCode::CREATED, Json(session)))
}

/// Switch the active session. Unknown ids leave the pointer unchanged.
#[utoipa::path(
    post,
    path = "/sessions/{id}/select",
    params(("id" = String, Path, description = "The session to activate.")),
    responses(
        (status = 200, description = "The now-active session", body = SessionDto)
    )
)]
pub async fn select_session_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Json<SessionDto> {
    let mut stores = app_state.stores.lock().await;
    stores.sessions.select(&id);
    Json(SessionDto::from(stores.sessions.active()))
}

/// Send a conversational query.
///
/// The quota gate runs before the gateway request, so a failed generation
/// still consumes its unit. The reply (or a flagged error turn) is appended
/// to the active session.
#[utoipa::path(
    post,
    path = "/chat",
    responses(
        (status = 200, description = "Send outcome", body = ChatOutcome),
        (status = 400, description = "Empty message"),
        (status = 500, description = "Failed to persist state")
    )
)]
pub async fn send_message_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<SendMessageRequest>,
) -> Result<Json<ChatOutcome>, (StatusCode, String)> {
    let content = payload.content.trim().to_string();
    if content.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Message must not be empty".to_string()));
    }

    // Reject, rather than queue, a second send while one is pending.
    let Some(_guard) = app_state.try_begin_send() else {
        return Ok(Json(ChatOutcome::Busy));
    };

    let mut stores = app_state.stores.lock().await;
    let now = Utc::now();

    let mut user = stores.user.clone();
    if !user.increment_query_count(now) {
        return Ok(Json(ChatOutcome::QuotaExhausted {
            used: user.daily_queries_used,
            limit: user.tier.limits().daily_queries,
        }));
    }
    app_state
        .db
        .save_user_state(&user)
        .await
        .map_err(|e| internal("Failed to persist user state", e))?;
    stores.user = user;

    let history = stores.sessions.active_history();
    let premium = stores.user.tier == SubscriptionTier::Premium;
    let settings = stores.settings;

    let mut sessions = stores.sessions.clone();
    sessions.add_message(Message::user(content.clone(), now), now);
    app_state
        .db
        .save_sessions(sessions.sessions())
        .await
        .map_err(|e| internal("Failed to persist sessions", e))?;
    stores.sessions = sessions;

    // The interaction suspends here until the gateway resolves or fails;
    // the lock stays held so store mutations remain serialized.
    let reply = match app_state
        .chat
        .generate_reply(&history, &content, &settings, premium)
        .await
    {
        Ok(text) => Message::model(text, Utc::now()),
        Err(e) => {
            error!("Generation failed: {e:?}");
            Message::error(CHAT_FAILURE_COPY, Utc::now())
        }
    };

    let dto = MessageDto::from(&reply);
    let mut sessions = stores.sessions.clone();
    sessions.add_message(reply, Utc::now());
    app_state
        .db
        .save_sessions(sessions.sessions())
        .await
        .map_err(|e| internal("Failed to persist sessions", e))?;
    stores.sessions = sessions;

    Ok(Json(ChatOutcome::Reply { message: dto }))
}

/// Update language and/or complexity preferences.
///
/// The Legal complexity mode is tier-gated here, at the call site: the
/// settings store itself performs no validation.
#[utoipa::path(
    put,
    path = "/settings",
    responses(
        (status = 200, description = "Update outcome", body = SettingsOutcome),
        (status = 500, description = "Failed to persist settings")
    )
)]
pub async fn update_settings_handler(
    State(app_state): State<Arc<AppState>>,
    Json(update): Json<SettingsUpdate>,
) -> Result<Json<SettingsOutcome>, (StatusCode, String)> {
    let mut stores = app_state.stores.lock().await;

    if update.complexity == Some(Complexity::Legal)
        && !stores
            .user
            .tier
            .limits()
            .allowed_complexity
            .contains(&Complexity::Legal)
    {
        return Ok(Json(SettingsOutcome::UpgradeRequired {
            feature: LEGAL_MODE_FEATURE.to_string(),
        }));
    }

    let mut settings = stores.settings;
    settings.apply(update);
    app_state
        .db
        .save_settings(&settings)
        .await
        .map_err(|e| internal("Failed to persist settings", e))?;
    stores.settings = settings;
    Ok(Json(SettingsOutcome::Updated {
        settings: SettingsDto::from(&stores.settings),
    }))
}

/// The static pricing page.
#[utoipa::path(
    get,
    path = "/plans",
    responses((status = 200, description = "The three subscription plans"))
)]
pub async fn list_plans_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!(PRICING_PLANS))
}

/// Select a pricing plan: overwrites the tier unconditionally. Payment
/// verification is a trusted external collaborator, out of scope here.
#[utoipa::path(
    post,
    path = "/plans/select",
    responses(
        (status = 200, description = "Updated entitlement state", body = UserStateDto),
        (status = 500, description = "Failed to persist user state")
    )
)]
pub async fn select_plan_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<SelectPlanRequest>,
) -> Result<Json<UserStateDto>, (StatusCode, String)> {
    let mut stores = app_state.stores.lock().await;
    let mut user = stores.user.clone();
    user.upgrade_tier(payload.tier);
    app_state
        .db
        .save_user_state(&user)
        .await
        .map_err(|e| internal("Failed to persist user state", e))?;
    stores.user = user;
    Ok(Json(UserStateDto::from(&stores.user)))
}

/// The tool catalogue with per-tool access decisions.
#[utoipa::path(
    get,
    path = "/tools",
    responses((status = 200, description = "Tool catalogue", body = [ToolDto]))
)]
pub async fn list_tools_handler(State(app_state): State<Arc<AppState>>) -> Json<Vec<ToolDto>> {
    let stores = app_state.stores.lock().await;
    let tools = DocumentKind::ALL
        .iter()
        .map(|kind| ToolDto {
            id: kind.id().to_string(),
            name: kind.name().to_string(),
            description: kind.description().to_string(),
            required_tier: kind.required_tier().label().to_string(),
            one_time_price: kind.one_time_price().to_string(),
            accessible: stores
                .user
                .check_feature_access(kind.required_tier(), Some(kind.name())),
        })
        .collect();
    Json(tools)
}

/// Generate a document with one of the gated tools.
///
/// Access is re-checked here even though the catalogue precomputes it;
/// a denied tool yields an upgrade prompt, a gateway failure yields the
/// static failure copy. Successful generations bump the tracked-only
/// `documentsGenerated` counter.
#[utoipa::path(
    post,
    path = "/tools/generate",
    responses(
        (status = 200, description = "Generation outcome", body = ToolOutcome),
        (status = 500, description = "Failed to persist user state")
    )
)]
pub async fn generate_document_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<ToolRequest>,
) -> Result<Json<ToolOutcome>, (StatusCode, String)> {
    let mut stores = app_state.stores.lock().await;
    let kind = payload.tool;

    if !stores
        .user
        .check_feature_access(kind.required_tier(), Some(kind.name()))
    {
        return Ok(Json(ToolOutcome::UpgradeRequired {
            feature: kind.name().to_string(),
            required_tier: kind.required_tier().label().to_string(),
            one_time_price: kind.one_time_price().to_string(),
        }));
    }

    let settings = stores.settings;
    let content = match app_state
        .docs
        .draft_document(kind, &payload.details, &settings)
        .await
    {
        Ok(text) => {
            let mut user = stores.user.clone();
            user.record_document_generated();
            app_state
                .db
                .save_user_state(&user)
                .await
                .map_err(|e| internal("Failed to persist user state", e))?;
            stores.user = user;
            text
        }
        Err(e) => {
            error!("Document generation failed: {e:?}");
            DOC_FAILURE_COPY.to_string()
        }
    };

    Ok(Json(ToolOutcome::Document { content }))
}

/// Record a one-time feature purchase. Idempotent.
#[utoipa::path(
    post,
    path = "/purchases",
    responses(
        (status = 200, description = "Updated entitlement state", body = UserStateDto),
        (status = 500, description = "Failed to persist user state")
    )
)]
pub async fn purchase_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<PurchaseRequest>,
) -> Result<Json<UserStateDto>, (StatusCode, String)> {
    let mut stores = app_state.stores.lock().await;
    let mut user = stores.user.clone();
    user.purchase_one_time_feature(payload.feature);
    app_state
        .db
        .save_user_state(&user)
        .await
        .map_err(|e| internal("Failed to persist user state", e))?;
    stores.user = user;
    Ok(Json(UserStateDto::from(&stores.user)))
}

/// Administrative counter reset; the rollover date is left untouched.
#[utoipa::path(
    post,
    path = "/debug/reset-limits",
    responses(
        (status = 200, description = "Updated entitlement state", body = UserStateDto),
        (status = 500, description = "Failed to persist user state")
    )
)]
pub async fn reset_limits_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<UserStateDto>, (StatusCode, String)> {
    let mut stores = app_state.stores.lock().await;
    let mut user = stores.user.clone();
    user.reset_daily_limits();
    app_state
        .db
        .save_user_state(&user)
        .await
        .map_err(|e| internal("Failed to persist user state", e))?;
    stores.user = user;
    Ok(Json(UserStateDto::from(&stores.user)))
}
