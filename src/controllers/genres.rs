use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use std::sync::Arc;
use validator::Validate;

use super::AppJson;
use crate::error::AppResult;
use crate::middleware::{AdminUser, AuthUser};
use crate::models::genre::{Genre, NewGenre};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/genres", get(list_genres).post(create_genre))
}

// GET /api/cinema/genres
async fn list_genres(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
) -> AppResult<Json<Vec<Genre>>> {
    Ok(Json(Genre::list(&state.db.pool).await?))
}

// POST /api/cinema/genres
async fn create_genre(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    AppJson(new): AppJson<NewGenre>,
) -> AppResult<(StatusCode, Json<Genre>)> {
    new.validate()?;
    let genre = Genre::create(&state.db.pool, &new).await?;
    tracing::info!(genre_id = genre.id, admin = %admin.email, "genre created");
    Ok((StatusCode::CREATED, Json(genre)))
}
