use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use validator::Validate;

use super::{AppJson, AppMultipart, AppPath, AppQuery};
use crate::error::{AppError, AppResult};
use crate::filters::{MovieFilter, MovieQuery};
use crate::middleware::{AdminUser, AuthUser};
use crate::models::movie::{
    Movie, MovieDetail, MovieImageResponse, MovieListItem, MovieWriteResponse, NewMovie,
};
use crate::AppState;

const IMAGE_FIELD: &str = "image";

pub fn routes(max_upload_bytes: usize) -> Router<Arc<AppState>> {
    Router::new()
        .route("/movies", get(list_movies).post(create_movie))
        .route("/movies/{id}", get(retrieve_movie))
        .route(
            "/movies/{id}/upload-image",
            post(upload_image).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
}

// GET /api/cinema/movies?title=..&genres=1,2&actors=3
async fn list_movies(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    AppQuery(query): AppQuery<MovieQuery>,
) -> AppResult<Json<Vec<MovieListItem>>> {
    let filter = MovieFilter::try_from(query)?;
    tracing::debug!(?filter, "listing movies");

    let movies = Movie::list(&state.db.pool, &filter).await?;
    let items = Movie::into_list_items(&state.db.pool, movies, &state.media).await?;
    Ok(Json(items))
}

// POST /api/cinema/movies
async fn create_movie(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    AppJson(new): AppJson<NewMovie>,
) -> AppResult<(StatusCode, Json<MovieWriteResponse>)> {
    new.validate()?;
    let movie = Movie::create(&state.db.pool, &new).await?;
    tracing::info!(movie_id = movie.id, admin = %admin.email, "movie created");
    Ok((StatusCode::CREATED, Json(movie)))
}

// GET /api/cinema/movies/{id}
async fn retrieve_movie(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<MovieDetail>> {
    let movie = Movie::find(&state.db.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Movie", id))?;
    Ok(Json(movie.into_detail(&state.db.pool, &state.media).await?))
}

// POST /api/cinema/movies/{id}/upload-image (multipart, field "image")
async fn upload_image(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    AppPath(id): AppPath<i64>,
    AppMultipart(mut multipart): AppMultipart,
) -> AppResult<Json<MovieImageResponse>> {
    let movie = Movie::find(&state.db.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Movie", id))?;

    let mut data = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(IMAGE_FIELD) {
            data = Some(field.bytes().await?);
            break;
        }
    }
    let data = data.ok_or_else(|| AppError::validation("No file was submitted in the 'image' field."))?;

    let stored = state.media.save_movie_image(&movie.title, &data).await?;
    let updated = match Movie::set_image(&state.db.pool, id, &stored).await {
        Ok(Some(updated)) => updated,
        Ok(None) => {
            // movie vanished between lookup and update
            state.media.remove(&stored).await;
            return Err(AppError::not_found("Movie", id));
        }
        Err(e) => {
            state.media.remove(&stored).await;
            return Err(e.into());
        }
    };

    if let Some(previous) = movie.image.as_deref() {
        state.media.remove(previous).await;
    }

    tracing::info!(movie_id = id, admin = %admin.email, image = %stored, "movie image uploaded");

    Ok(Json(MovieImageResponse {
        id: updated.id,
        image: state.media.url_for(updated.image.as_deref()),
    }))
}
