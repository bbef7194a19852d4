use axum::{
    extract::{Extension, Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    AppState,
    utils::{Claims, error_codes, error_to_api_response, success_to_api_response},
};

use super::model::{CreateNoteRequest, NoteInfo, UpdateNoteRequest};

#[axum::debug_handler]
pub async fn create_note(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateNoteRequest>,
) -> impl IntoResponse {
    match NoteInfo::create(&state.pool, &state.cache, claims.uid, req).await {
        Ok(note) => (StatusCode::CREATED, success_to_api_response(note)),
        Err(e) => {
            tracing::error!("Failed to create note: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "创建笔记失败".to_string()),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn get_notes(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> impl IntoResponse {
    match NoteInfo::list(&state.pool, &state.cache, claims.uid).await {
        Ok(notes) => (StatusCode::OK, success_to_api_response(notes)),
        Err(e) => {
            tracing::error!("Failed to list notes: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "获取笔记失败".to_string()),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn get_note(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(note_id): Path<i64>,
) -> impl IntoResponse {
    match NoteInfo::find(&state.pool, claims.uid, note_id).await {
        Ok(Some(note)) => (StatusCode::OK, success_to_api_response(note)),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            error_to_api_response(error_codes::NOT_FOUND, "笔记不存在".to_string()),
        ),
        Err(e) => {
            tracing::error!("Failed to get note: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "获取笔记失败".to_string()),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn update_note(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(note_id): Path<i64>,
    Json(req): Json<UpdateNoteRequest>,
) -> impl IntoResponse {
    match NoteInfo::update(&state.pool, &state.cache, claims.uid, note_id, req).await {
        Ok(Some(note)) => (StatusCode::OK, success_to_api_response(note)),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            error_to_api_response(error_codes::NOT_FOUND, "笔记不存在".to_string()),
        ),
        Err(e) => {
            tracing::error!("Failed to update note: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "更新笔记失败".to_string()),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn delete_note(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(note_id): Path<i64>,
) -> impl IntoResponse {
    match NoteInfo::delete(&state.pool, &state.cache, claims.uid, note_id).await {
        Ok(true) => (
            StatusCode::OK,
            success_to_api_response(serde_json::json!({"detail": "笔记已删除"})),
        ),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            error_to_api_response(error_codes::NOT_FOUND, "笔记不存在".to_string()),
        ),
        Err(e) => {
            tracing::error!("Failed to delete note: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "删除笔记失败".to_string()),
            )
        }
    }
}
