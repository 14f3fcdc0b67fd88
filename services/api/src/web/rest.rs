//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::{
    protocol::{ChapterContentView, ChapterView, LastReadView, VerdictView},
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use quran_study_core::{
    filter_chapters,
    normalize::normalize,
    recitation::{match_recitation, WordOverlap},
    PortError,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::{IntoParams, OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        list_chapters_handler,
        chapter_handler,
        commentary_handler,
        check_recitation_handler,
        last_read_handler,
    ),
    components(
        schemas(
            ChapterView,
            ChapterContentView,
            CommentaryResponse,
            RecitationCheckRequest,
            RecitationCheckResponse,
            VerdictView,
            LastReadView,
        )
    ),
    tags(
        (name = "Quran Study API", description = "Chapter content, commentary and recitation checks. The interactive session runs over /ws.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ChapterQuery {
    /// Sidebar search text. Matches names, transliteration, translation or number.
    pub q: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct CommentaryResponse {
    pub chapter_id: u32,
    pub verse_number: u32,
    pub text: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct RecitationCheckRequest {
    /// The verse text the reciter aimed for.
    pub target_text: String,
    /// What the speech recognizer heard.
    pub transcript: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct RecitationCheckResponse {
    pub verdict: VerdictView,
    pub feedback: String,
    pub matched_words: usize,
    pub target_words: usize,
}

type HandlerError = (StatusCode, String);

/// Maps a port failure onto the status the REST client sees.
fn port_failure(context: &str, e: PortError) -> HandlerError {
    error!("{}: {}", context, e);
    let status = match e {
        PortError::NotFound(_) => StatusCode::NOT_FOUND,
        PortError::Http { status: 404, .. } => StatusCode::NOT_FOUND,
        PortError::Network(_) | PortError::Http { .. } | PortError::Malformed(_) => {
            StatusCode::BAD_GATEWAY
        }
        PortError::Unavailable(_) | PortError::MissingCredential(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        PortError::Parse(_) | PortError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, context.to_string())
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// List all chapters, optionally filtered by a search query.
#[utoipa::path(
    get,
    path = "/chapters",
    params(ChapterQuery),
    responses(
        (status = 200, description = "The ordered chapter list", body = [ChapterView]),
        (status = 502, description = "The content API could not be reached")
    )
)]
pub async fn list_chapters_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<ChapterQuery>,
) -> Result<Json<Vec<ChapterView>>, HandlerError> {
    let chapters = app_state
        .content
        .list_chapters()
        .await
        .map_err(|e| port_failure("Failed to load the chapter list", e))?;

    let views = filter_chapters(&chapters, query.q.as_deref().unwrap_or_default())
        .into_iter()
        .map(ChapterView::from)
        .collect();
    Ok(Json(views))
}

/// Fetch one chapter with all of its verses.
#[utoipa::path(
    get,
    path = "/chapters/{id}",
    params(("id" = u32, Path, description = "Chapter number, 1 to 114.")),
    responses(
        (status = 200, description = "The chapter and its verses", body = ChapterContentView),
        (status = 404, description = "No such chapter"),
        (status = 502, description = "The content API could not be reached")
    )
)]
pub async fn chapter_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<u32>,
) -> Result<Json<ChapterContentView>, HandlerError> {
    let content = app_state
        .content
        .chapter_content(id)
        .await
        .map_err(|e| port_failure("Failed to load the chapter", e))?;
    Ok(Json(ChapterContentView::from(&content)))
}

/// Fetch the commentary of one verse.
#[utoipa::path(
    get,
    path = "/chapters/{id}/verses/{number}/commentary",
    params(
        ("id" = u32, Path, description = "Chapter number."),
        ("number" = u32, Path, description = "Verse number within the chapter.")
    ),
    responses(
        (status = 200, description = "The commentary text", body = CommentaryResponse),
        (status = 502, description = "The content API could not be reached")
    )
)]
pub async fn commentary_handler(
    State(app_state): State<Arc<AppState>>,
    Path((id, number)): Path<(u32, u32)>,
) -> Result<Json<CommentaryResponse>, HandlerError> {
    let commentary = app_state
        .content
        .commentary(id, number)
        .await
        .map_err(|e| port_failure("Failed to load the commentary", e))?;
    Ok(Json(CommentaryResponse {
        chapter_id: id,
        verse_number: number,
        text: commentary.text,
    }))
}

/// Grade a recitation transcript against a verse text.
#[utoipa::path(
    post,
    path = "/recitation/check",
    request_body = RecitationCheckRequest,
    responses(
        (status = 200, description = "The verdict", body = RecitationCheckResponse)
    )
)]
pub async fn check_recitation_handler(
    Json(request): Json<RecitationCheckRequest>,
) -> Json<RecitationCheckResponse> {
    let verdict = match_recitation(&request.target_text, &request.transcript);
    let overlap = WordOverlap::between(
        &normalize(&request.target_text),
        &normalize(&request.transcript),
    );
    Json(RecitationCheckResponse {
        verdict: verdict.into(),
        feedback: verdict.feedback().to_string(),
        matched_words: overlap.matched,
        target_words: overlap.total,
    })
}

/// The last chapter opened on this device.
#[utoipa::path(
    get,
    path = "/last-read",
    responses(
        (status = 200, description = "The last-read marker", body = LastReadView),
        (status = 404, description = "Nothing has been read yet")
    )
)]
pub async fn last_read_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<LastReadView>, HandlerError> {
    let preferences = app_state.preferences.lock().await;
    preferences
        .last_read()
        .map(|marker| Json(LastReadView::from(marker)))
        .ok_or_else(|| (StatusCode::NOT_FOUND, "Nothing has been read yet".to_string()))
}
