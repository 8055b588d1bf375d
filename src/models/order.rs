use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use validator::Validate;

use super::movie_session::{MovieSession, MovieSessionListItem};
use crate::services::media::MediaStorage;

#[derive(Debug, Clone, FromRow)]
pub struct Order {
    pub id: i64,
    pub created_at: NaiveDateTime,
    pub user_id: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct Ticket {
    pub id: i64,
    pub row: i32,
    pub seat: i32,
    pub movie_session_id: i64,
    pub order_id: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewOrder {
    #[validate(length(min = 1, message = "an order needs at least one ticket"), nested)]
    pub tickets: Vec<NewTicket>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Validate)]
pub struct NewTicket {
    pub movie_session: i64,
    #[validate(range(min = 1))]
    pub row: i32,
    #[validate(range(min = 1))]
    pub seat: i32,
}

#[derive(Debug, Serialize)]
pub struct TicketResponse {
    pub id: i64,
    pub row: i32,
    pub seat: i32,
    pub movie_session: i64,
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: i64,
    pub tickets: Vec<TicketResponse>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Serialize)]
pub struct TicketListItem {
    pub id: i64,
    pub row: i32,
    pub seat: i32,
    pub movie_session: MovieSessionListItem,
}

#[derive(Debug, Serialize)]
pub struct OrderListItem {
    pub id: i64,
    pub tickets: Vec<TicketListItem>,
    pub created_at: NaiveDateTime,
}

impl From<Ticket> for TicketResponse {
    fn from(ticket: Ticket) -> Self {
        TicketResponse {
            id: ticket.id,
            row: ticket.row,
            seat: ticket.seat,
            movie_session: ticket.movie_session_id,
        }
    }
}

impl Order {
    pub async fn count_for_user(pool: &PgPool, user_id: i64) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    /// Newest first.
    pub async fn page_for_user(
        pool: &PgPool,
        user_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Order>, sqlx::Error> {
        sqlx::query_as::<_, Order>(
            "SELECT id, created_at, user_id
             FROM orders
             WHERE user_id = $1
             ORDER BY created_at DESC, id DESC
             LIMIT $2 OFFSET $3",
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    /// Builds list items with each ticket's session in list shape.
    pub async fn into_list_items(
        pool: &PgPool,
        orders: Vec<Order>,
        media: &MediaStorage,
    ) -> Result<Vec<OrderListItem>, sqlx::Error> {
        let order_ids: Vec<i64> = orders.iter().map(|o| o.id).collect();
        let tickets = sqlx::query_as::<_, Ticket>(
            "SELECT id, row, seat, movie_session_id, order_id
             FROM tickets
             WHERE order_id = ANY($1)
             ORDER BY order_id, id",
        )
        .bind(&order_ids)
        .fetch_all(pool)
        .await?;

        let mut session_ids: Vec<i64> = tickets.iter().map(|t| t.movie_session_id).collect();
        session_ids.sort_unstable();
        session_ids.dedup();

        let sessions: HashMap<i64, MovieSessionListItem> = if session_ids.is_empty() {
            HashMap::new()
        } else {
            MovieSession::list_rows_by_ids(pool, &session_ids)
                .await?
                .into_iter()
                .map(|row| (row.id, row.into_item(media)))
                .collect()
        };

        let mut tickets_by_order: HashMap<i64, Vec<TicketListItem>> = HashMap::new();
        for ticket in tickets {
            let Some(session) = sessions.get(&ticket.movie_session_id) else {
                continue;
            };
            tickets_by_order.entry(ticket.order_id).or_default().push(TicketListItem {
                id: ticket.id,
                row: ticket.row,
                seat: ticket.seat,
                movie_session: session.clone(),
            });
        }

        Ok(orders
            .into_iter()
            .map(|order| OrderListItem {
                tickets: tickets_by_order.remove(&order.id).unwrap_or_default(),
                id: order.id,
                created_at: order.created_at,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_order_is_invalid() {
        let order: NewOrder = serde_json::from_str(r#"{"tickets": []}"#).unwrap();
        assert!(order.validate().is_err());
    }

    #[test]
    fn nested_ticket_ranges_are_checked() {
        let order: NewOrder = serde_json::from_str(
            r#"{"tickets": [{"movie_session": 1, "row": 0, "seat": 4}]}"#,
        )
        .unwrap();
        assert!(order.validate().is_err());

        let order: NewOrder = serde_json::from_str(
            r#"{"tickets": [{"movie_session": 1, "row": 2, "seat": 4}]}"#,
        )
        .unwrap();
        assert!(order.validate().is_ok());
    }

    #[test]
    fn owner_cannot_be_supplied() {
        // unknown fields are ignored, the owner always comes from the token
        let order: NewOrder = serde_json::from_str(
            r#"{"user": 99, "tickets": [{"movie_session": 1, "row": 1, "seat": 1}]}"#,
        )
        .unwrap();
        assert_eq!(order.tickets.len(), 1);
    }
}
