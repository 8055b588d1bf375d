use axum::{
    extract::{OriginalUri, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use super::{AppJson, AppQuery};
use crate::error::AppResult;
use crate::middleware::AuthUser;
use crate::models::order::{NewOrder, OrderListItem, OrderResponse};
use crate::models::Order;
use crate::pagination::{PageQuery, PageRequest, Paginated};
use crate::services::orders::place_order;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/orders", get(list_orders).post(create_order))
}

// GET /api/cinema/orders?page=1&page_size=10
async fn list_orders(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    OriginalUri(uri): OriginalUri,
    AppQuery(query): AppQuery<PageQuery>,
) -> AppResult<Json<Paginated<OrderListItem>>> {
    let pool = &state.db.pool;

    let count = Order::count_for_user(pool, user.user_id).await?;
    let page = PageRequest::from_query(&query)?.resolve(count)?;

    let orders = Order::page_for_user(pool, user.user_id, page.limit(), page.offset()).await?;
    let results = Order::into_list_items(pool, orders, &state.media).await?;

    Ok(Json(Paginated::new(uri.path(), page, count, results)))
}

// POST /api/cinema/orders
async fn create_order(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    AppJson(new): AppJson<NewOrder>,
) -> AppResult<(StatusCode, Json<OrderResponse>)> {
    let order = place_order(&state.db.pool, user.user_id, &new).await?;
    Ok((StatusCode::CREATED, Json(order)))
}
