pub mod actors;
pub mod cinema_halls;
pub mod genres;
pub mod movie_sessions;
pub mod movies;
pub mod orders;

use axum::{
    extract::{FromRequest, FromRequestParts, Multipart, Path, Query, Request},
    Json, Router,
};
use std::sync::Arc;

use crate::error::AppError;
use crate::AppState;

// Wrappers that turn axum's plain-text rejections into AppError responses

#[derive(FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(Path), rejection(AppError))]
pub struct AppPath<T>(pub T);

/// Multipart body whose rejection renders like every other error.
pub struct AppMultipart(pub Multipart);

impl<S> FromRequest<S> for AppMultipart
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Ok(AppMultipart(Multipart::from_request(req, state).await?))
    }
}

pub fn routes(state: &AppState) -> Router<Arc<AppState>> {
    let cinema = Router::new()
        .merge(genres::routes())
        .merge(actors::routes())
        .merge(cinema_halls::routes())
        .merge(movies::routes(state.config.media.max_upload_bytes))
        .merge(movie_sessions::routes())
        .merge(orders::routes());

    Router::new().nest("/cinema", cinema)
}
