//! HTTP Endpoints
//!
//! REST API for the enrollment assistant.

use std::time::Duration;

use axum::{
    extract::{Json, Path, Query, State},
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use enrollment_agent_agent::{Content, ConversationDriver, TurnOutcome};
use enrollment_agent_core::{
    AnalyticsEvent, CallToAction, Fields, LeadRecord, Message, Step, VisitorCategory,
};

use crate::metrics::{metrics_handler, record_turn};
use crate::state::AppState;
use crate::ServerError;

const DEFAULT_ANALYTICS_LIMIT: usize = 100;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let server = &state.config.server;
    let cors_layer = build_cors_layer(&server.cors_origins, server.cors_enabled);
    let timeout = Duration::from_secs(server.timeout_seconds);

    Router::new()
        // Session endpoints
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(get_session).delete(delete_session))
        .route("/api/sessions/:id/messages", post(post_message))
        .route("/api/sessions/:id/restart", post(restart_session))
        .route("/api/sessions/:id/cta", post(call_to_action))
        // Dashboard
        .route("/api/leads", get(list_leads))
        .route("/api/analytics", get(list_analytics))
        // Health check
        .route("/health", get(health_check))
        // Prometheus metrics
        .route("/metrics", get(metrics_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(timeout))
                .layer(cors_layer),
        )
        .with_state(state)
}

/// Build CORS layer from configured origins
///
/// - If cors_enabled is false, returns a permissive layer
/// - If cors_origins is empty, defaults to localhost:3000
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::warn!("CORS is disabled - allowing all origins");
        return CorsLayer::permissive();
    }

    let parsed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("Invalid CORS origin: {}", origin);
                None
            })
        })
        .collect();

    let methods = [Method::GET, Method::POST, Method::DELETE, Method::OPTIONS];

    if parsed_origins.is_empty() {
        if !origins.is_empty() {
            tracing::error!("All configured CORS origins are invalid, falling back to localhost");
        }
        return CorsLayer::new()
            .allow_origin(HeaderValue::from_static("http://localhost:3000"))
            .allow_methods(methods)
            .allow_headers(Any);
    }

    tracing::info!("CORS configured with {} origins", parsed_origins.len());
    CorsLayer::new()
        .allow_origin(parsed_origins)
        .allow_methods(methods)
        .allow_headers(Any)
}

/// Snapshot of a conversation as the widget renders it
#[derive(Debug, Serialize)]
struct SessionView {
    session_id: String,
    step: Step,
    category: VisitorCategory,
    content: Content,
    fields: Fields,
    score: u32,
    score_max: u32,
    booking_confirmed: bool,
    completed: bool,
    reply_pending: bool,
    messages: Vec<Message>,
}

impl SessionView {
    fn new(id: &str, driver: &ConversationDriver) -> Self {
        let session = driver.session();
        Self {
            session_id: id.to_string(),
            step: session.current_step,
            category: session.visitor_category,
            content: driver.current_content(),
            fields: session.fields.clone(),
            score: session.score,
            score_max: session.score_max,
            booking_confirmed: session.booking_confirmed,
            completed: session.is_complete(),
            reply_pending: driver.is_reply_pending(),
            messages: session.message_log.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct CreateSessionRequest {
    /// Skip the classification question
    #[serde(default)]
    category: Option<VisitorCategory>,
}

/// POST /api/sessions
async fn create_session(
    State(state): State<AppState>,
    request: Option<Json<CreateSessionRequest>>,
) -> Result<(StatusCode, Json<SessionView>), ServerError> {
    let Json(request) = request.unwrap_or_default();
    let category = request.category.filter(VisitorCategory::is_known);

    let session = state.sessions.create(state.new_driver(category))?;
    let driver = session.driver.lock().await;
    Ok((StatusCode::CREATED, Json(SessionView::new(&session.id, &driver))))
}

/// GET /api/sessions/:id
async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, ServerError> {
    let session = state.sessions.get(&id).ok_or(ServerError::Session(id))?;
    let driver = session.driver.lock().await;
    Ok(Json(SessionView::new(&session.id, &driver)))
}

/// DELETE /api/sessions/:id
async fn delete_session(State(state): State<AppState>, Path(id): Path<String>) -> StatusCode {
    state.sessions.remove(&id);
    StatusCode::NO_CONTENT
}

#[derive(Debug, Deserialize)]
struct MessageRequest {
    message: String,
}

#[derive(Debug, Serialize)]
struct MessageResponse {
    step: Step,
    reply: Content,
    lead_completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    lead: Option<LeadRecord>,
}

#[derive(Debug, Serialize)]
struct RejectionResponse {
    step: Step,
    error: String,
}

/// POST /api/sessions/:id/messages
///
/// The driver lock is released while the reply is composed, so input that
/// arrives in the meantime sees the pending reply and gets 409. If this
/// request is dropped mid-delay, the reply is released by the next message
/// once it is due.
async fn post_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<MessageRequest>,
) -> Result<Response, ServerError> {
    let session = state.sessions.get(&id).ok_or(ServerError::Session(id))?;
    session.touch();

    let outcome = session.driver.lock().await.submit(&request.message).await;

    match outcome {
        TurnOutcome::Ignored => {
            record_turn("ignored");
            Err(ServerError::ReplyPending)
        }
        TurnOutcome::Rejected { step, message } => {
            record_turn("rejected");
            let body = RejectionResponse {
                step,
                error: message,
            };
            Ok((StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response())
        }
        TurnOutcome::Accepted {
            step,
            reply_delay,
            lead_completed,
        } => {
            record_turn("accepted");
            if !reply_delay.is_zero() {
                tokio::time::sleep(reply_delay).await;
            }

            let mut driver = session.driver.lock().await;
            let reply = match driver.take_reply() {
                Some(content) => content,
                None => driver.current_content(),
            };
            let lead = if lead_completed {
                driver.lead().cloned()
            } else {
                None
            };

            tracing::debug!(session_id = %session.id, %step, lead_completed, "Turn accepted");
            Ok(Json(MessageResponse {
                step,
                reply,
                lead_completed,
                lead,
            })
            .into_response())
        }
    }
}

/// POST /api/sessions/:id/restart
async fn restart_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, ServerError> {
    let session = state.sessions.get(&id).ok_or(ServerError::Session(id))?;
    session.touch();

    let mut driver = session.driver.lock().await;
    driver.restart();
    Ok(Json(SessionView::new(&session.id, &driver)))
}

#[derive(Debug, Deserialize)]
struct CallToActionRequest {
    action: CallToAction,
}

/// POST /api/sessions/:id/cta
async fn call_to_action(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<CallToActionRequest>,
) -> Result<StatusCode, ServerError> {
    let session = state.sessions.get(&id).ok_or(ServerError::Session(id))?;
    session.touch();

    let mut driver = session.driver.lock().await;
    let category = driver.session().visitor_category;
    if !CallToAction::available_for(category).contains(&request.action) {
        return Err(ServerError::InvalidRequest(format!(
            "{} is not offered to {}",
            request.action.as_str(),
            category.display_name()
        )));
    }
    driver.record_call_to_action(request.action);
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/leads
async fn list_leads(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ServerError> {
    let leads = state.leads.list().await?;
    Ok(Json(serde_json::json!({
        "count": leads.len(),
        "leads": leads,
    })))
}

#[derive(Debug, Deserialize)]
struct AnalyticsQuery {
    limit: Option<usize>,
}

/// GET /api/analytics
async fn list_analytics(
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> Json<serde_json::Value> {
    let events: Vec<AnalyticsEvent> = state
        .analytics
        .recent(query.limit.unwrap_or(DEFAULT_ANALYTICS_LIMIT));
    Json(serde_json::json!({
        "count": events.len(),
        "events": events,
    }))
}

/// GET /health
async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "sessions": state.sessions.count(),
    }))
}
