use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use std::sync::Arc;
use validator::Validate;

use super::AppJson;
use crate::error::AppResult;
use crate::middleware::{AdminUser, AuthUser};
use crate::models::cinema_hall::{CinemaHall, CinemaHallResponse, NewCinemaHall};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/cinema-halls", get(list_cinema_halls).post(create_cinema_hall))
}

// GET /api/cinema/cinema-halls
async fn list_cinema_halls(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
) -> AppResult<Json<Vec<CinemaHallResponse>>> {
    let halls = CinemaHall::list(&state.db.pool).await?;
    Ok(Json(halls.into_iter().map(CinemaHallResponse::from).collect()))
}

// POST /api/cinema/cinema-halls
async fn create_cinema_hall(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    AppJson(new): AppJson<NewCinemaHall>,
) -> AppResult<(StatusCode, Json<CinemaHallResponse>)> {
    new.validate()?;
    let hall = CinemaHall::create(&state.db.pool, &new).await?;
    tracing::info!(hall_id = hall.id, capacity = hall.capacity(), admin = %admin.email, "cinema hall created");
    Ok((StatusCode::CREATED, Json(hall.into())))
}
