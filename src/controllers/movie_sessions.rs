use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use super::{AppJson, AppPath, AppQuery};
use crate::error::{AppError, AppResult};
use crate::filters::{MovieSessionFilter, MovieSessionQuery};
use crate::middleware::{AdminUser, AuthUser};
use crate::models::movie_session::{
    MovieSession, MovieSessionDetail, MovieSessionListItem, MovieSessionPatch, NewMovieSession,
};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/movie-sessions", get(list_sessions).post(create_session))
        .route(
            "/movie-sessions/{id}",
            get(retrieve_session)
                .put(update_session)
                .patch(partial_update_session)
                .delete(delete_session),
        )
}

// GET /api/cinema/movie-sessions?date=YYYY-MM-DD&movie=1
async fn list_sessions(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    AppQuery(query): AppQuery<MovieSessionQuery>,
) -> AppResult<Json<Vec<MovieSessionListItem>>> {
    let filter = MovieSessionFilter::try_from(query)?;
    let rows = MovieSession::list(&state.db.pool, &filter).await?;
    Ok(Json(rows.into_iter().map(|row| row.into_item(&state.media)).collect()))
}

// POST /api/cinema/movie-sessions
async fn create_session(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    AppJson(new): AppJson<NewMovieSession>,
) -> AppResult<(StatusCode, Json<MovieSession>)> {
    let session = MovieSession::create(&state.db.pool, &new).await?;
    tracing::info!(session_id = session.id, admin = %admin.email, "movie session created");
    Ok((StatusCode::CREATED, Json(session)))
}

// GET /api/cinema/movie-sessions/{id}
async fn retrieve_session(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<MovieSessionDetail>> {
    let session = MovieSession::find(&state.db.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Movie session", id))?;
    Ok(Json(session.into_detail(&state.db.pool, &state.media).await?))
}

// PUT /api/cinema/movie-sessions/{id}
async fn update_session(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    AppPath(id): AppPath<i64>,
    AppJson(full): AppJson<NewMovieSession>,
) -> AppResult<Json<MovieSession>> {
    apply_patch(&state, id, full.into()).await
}

// PATCH /api/cinema/movie-sessions/{id}
async fn partial_update_session(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    AppPath(id): AppPath<i64>,
    AppJson(patch): AppJson<MovieSessionPatch>,
) -> AppResult<Json<MovieSession>> {
    apply_patch(&state, id, patch).await
}

async fn apply_patch(state: &AppState, id: i64, patch: MovieSessionPatch) -> AppResult<Json<MovieSession>> {
    let session = MovieSession::update(&state.db.pool, id, &patch)
        .await?
        .ok_or_else(|| AppError::not_found("Movie session", id))?;
    tracing::info!(session_id = id, "movie session updated");
    Ok(Json(session))
}

// DELETE /api/cinema/movie-sessions/{id}
async fn delete_session(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    AppPath(id): AppPath<i64>,
) -> AppResult<StatusCode> {
    if !MovieSession::delete(&state.db.pool, id).await? {
        return Err(AppError::not_found("Movie session", id));
    }
    tracing::info!(session_id = id, admin = %admin.email, "movie session deleted");
    Ok(StatusCode::NO_CONTENT)
}
