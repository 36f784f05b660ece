//! POST /api/messages: the streaming chat relay.

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use futures::TryStreamExt;
use tracing::{error, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::chat::ChatRequest;
use crate::state::AppState;

/// Relays a chat request to the upstream model and streams the raw text back.
///
/// Everything that can fail before the first fragment (bad body, auth,
/// network, upstream rejection) becomes a JSON error response. Once the 200
/// is committed, a failure makes the body stream error out: the chunked
/// response is cut without its terminating chunk and the client's read fails.
pub async fn handle_messages(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = payload?;
    request.validate()?;

    let request_id = Uuid::new_v4();
    info!(
        %request_id,
        messages = request.messages.len(),
        language = ?request.language,
        "Relaying chat request"
    );

    let fragments = state.llm.open_stream(&request).await?;

    let body = Body::from_stream(fragments.inspect_err(move |e| {
        error!(%request_id, "Relay stream aborted mid-flight: {e}");
    }));

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        body,
    )
        .into_response())
}
