use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use std::sync::Arc;
use validator::Validate;

use super::AppJson;
use crate::error::AppResult;
use crate::middleware::{AdminUser, AuthUser};
use crate::models::actor::{Actor, ActorResponse, NewActor};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/actors", get(list_actors).post(create_actor))
}

// GET /api/cinema/actors
async fn list_actors(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
) -> AppResult<Json<Vec<ActorResponse>>> {
    let actors = Actor::list(&state.db.pool).await?;
    Ok(Json(actors.into_iter().map(ActorResponse::from).collect()))
}

// POST /api/cinema/actors
async fn create_actor(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    AppJson(new): AppJson<NewActor>,
) -> AppResult<(StatusCode, Json<ActorResponse>)> {
    new.validate()?;
    let actor = Actor::create(&state.db.pool, &new).await?;
    tracing::info!(actor_id = actor.id, admin = %admin.email, "actor created");
    Ok((StatusCode::CREATED, Json(actor.into())))
}
