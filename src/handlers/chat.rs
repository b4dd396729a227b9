//! Chat pipeline HTTP handlers.
//!
//! The session is identified by a cookie. A request without one gets a fresh
//! session and the cookie is set on the response, so each browser keeps its
//! own conversation.

use axum::Json;
use axum::extract::{Multipart, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::media::ImageData;
use crate::pipeline::PipelineError;
use crate::response;
use crate::server::AppState;
use crate::session::{SessionStore, Turn};

const SESSION_COOKIE: &str = "promptpipe_session";

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
pub struct ChatResponse {
    response: String,
    threads_posted: bool,
    threads_message: String,
}

#[derive(Serialize)]
pub struct ClearResponse {
    status: &'static str,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/chat
///
/// Multipart form with optional `prompt` (text) and `image` (binary) fields.
pub async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    let mut prompt = String::new();
    let mut image: Option<ImageData> = None;

    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                let name = field.name().map(str::to_string);
                match name.as_deref() {
                    Some("prompt") => match field.text().await {
                        Ok(text) => prompt = text,
                        Err(e) => {
                            return response::bad_request(format!("invalid prompt field: {e}"))
                                .into_response();
                        }
                    },
                    Some("image") => match field.bytes().await {
                        Ok(bytes) if !bytes.is_empty() => image = Some(ImageData::new(bytes)),
                        Ok(_) => {}
                        Err(e) => {
                            return response::bad_request(format!("invalid image field: {e}"))
                                .into_response();
                        }
                    },
                    _ => {}
                }
            }
            Ok(None) => break,
            Err(e) => {
                return response::bad_request(format!("malformed multipart request: {e}"))
                    .into_response();
            }
        }
    }

    let (session_id, new_session) = resolve_session(&headers);

    match state.pipeline.handle_request(&session_id, &prompt, image).await {
        Ok(exchange) => {
            let body = Json(ChatResponse {
                response: exchange.response,
                threads_posted: exchange.publish.posted,
                threads_message: exchange.publish.message,
            });
            with_session_cookie((StatusCode::OK, body).into_response(), &session_id, new_session)
        }
        Err(e @ PipelineError::InvalidRequest) => {
            response::bad_request(e.to_string()).into_response()
        }
        Err(e @ PipelineError::CompletionFailed(_)) => {
            response::bad_gateway(e.to_string()).into_response()
        }
    }
}

/// POST /api/clear
pub async fn clear_conversation(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(session_id) = session_from_cookie(&headers) {
        state.pipeline.clear(&session_id).await;
    }
    // Clearing a session that was never started is a no-op, not an error.
    (StatusCode::OK, Json(ClearResponse { status: "success" })).into_response()
}

/// GET /api/conversation
pub async fn get_conversation(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let turns: Vec<Turn> = match session_from_cookie(&headers) {
        Some(session_id) => state.pipeline.conversation(&session_id).await,
        None => Vec::new(),
    };
    (StatusCode::OK, Json(turns)).into_response()
}

// ============================================================================
// Session cookie helpers
// ============================================================================

fn session_from_cookie(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE && !value.is_empty()).then(|| value.to_string())
    })
}

/// Resolve the request's session, minting a new id when no cookie is present.
/// Returns the id and whether it is new (and must be set on the response).
fn resolve_session(headers: &HeaderMap) -> (String, bool) {
    match session_from_cookie(headers) {
        Some(session_id) => (session_id, false),
        None => (SessionStore::new_session_id(), true),
    }
}

fn with_session_cookie(mut response: Response, session_id: &str, new_session: bool) -> Response {
    if new_session {
        let cookie = format!("{SESSION_COOKIE}={session_id}; Path=/; HttpOnly; SameSite=Lax");
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().insert(SET_COOKIE, value);
        }
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with_cookie(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn session_is_read_from_cookie_header() {
        let headers = headers_with_cookie("theme=dark; promptpipe_session=sess_abc; other=1");
        assert_eq!(session_from_cookie(&headers).as_deref(), Some("sess_abc"));
    }

    #[test]
    fn missing_cookie_mints_a_new_session() {
        let (session_id, new_session) = resolve_session(&HeaderMap::new());
        assert!(session_id.starts_with("sess_"));
        assert!(new_session);
    }

    #[test]
    fn empty_cookie_value_is_ignored() {
        let headers = headers_with_cookie("promptpipe_session=");
        assert!(session_from_cookie(&headers).is_none());
    }
}
