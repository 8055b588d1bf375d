//! Order placement.
//!
//! An order and all of its tickets are written in a single transaction.
//! Seat bounds and in-payload duplicates are checked before anything is
//! inserted; seats already sold to other orders are caught by the unique
//! index on `tickets (movie_session_id, row, seat)`, so two racing orders for
//! the same seat cannot both commit.

use sqlx::PgPool;
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};
use validator::Validate;

use crate::error::{is_seat_conflict, AppError};
use crate::models::order::{NewOrder, NewTicket, OrderResponse, TicketResponse};
use crate::models::{Order, Ticket};

/// Hall dimensions of the session a ticket targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HallBounds {
    pub rows: i32,
    pub seats_in_row: i32,
}

/// Fails on the first (session, row, seat) requested twice in one payload.
pub fn check_unique_seats(tickets: &[NewTicket]) -> Result<(), AppError> {
    let mut seen = HashSet::with_capacity(tickets.len());
    for ticket in tickets {
        if !seen.insert((ticket.movie_session, ticket.row, ticket.seat)) {
            return Err(AppError::validation(format!(
                "Seat (row {}, seat {}) is requested more than once for session {}.",
                ticket.row, ticket.seat, ticket.movie_session
            )));
        }
    }
    Ok(())
}

/// Checks that the ticket sits inside its hall: 1..=rows, 1..=seats_in_row.
pub fn check_seat_bounds(ticket: &NewTicket, hall: HallBounds) -> Result<(), AppError> {
    if !(1..=hall.rows).contains(&ticket.row) {
        return Err(AppError::validation(format!(
            "row number must be in available range: (1, {}): (row, seat)",
            hall.rows
        )));
    }
    if !(1..=hall.seats_in_row).contains(&ticket.seat) {
        return Err(AppError::validation(format!(
            "seat number must be in available range: (1, {}): (row, seat)",
            hall.seats_in_row
        )));
    }
    Ok(())
}

/// Validates every ticket against the hall of its session. Unknown sessions
/// are validation errors, not 404s: the id comes from the request body.
pub fn check_tickets(tickets: &[NewTicket], halls: &HashMap<i64, HallBounds>) -> Result<(), AppError> {
    check_unique_seats(tickets)?;
    for ticket in tickets {
        let hall = halls.get(&ticket.movie_session).copied().ok_or_else(|| {
            AppError::validation(format!(
                "Invalid movie_session id {} - object does not exist.",
                ticket.movie_session
            ))
        })?;
        check_seat_bounds(ticket, hall)?;
    }
    Ok(())
}

/// Indices of `tickets` sorted by (session, row, seat).
pub fn insertion_order(tickets: &[NewTicket]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..tickets.len()).collect();
    order.sort_by_key(|&i| (tickets[i].movie_session, tickets[i].row, tickets[i].seat));
    order
}

/// Creates an order owned by `user_id` with all requested tickets, or nothing.
pub async fn place_order(pool: &PgPool, user_id: i64, new: &NewOrder) -> Result<OrderResponse, AppError> {
    new.validate()?;

    let mut session_ids: Vec<i64> = new.tickets.iter().map(|t| t.movie_session).collect();
    session_ids.sort_unstable();
    session_ids.dedup();

    let mut tx = pool.begin().await?;

    let halls: HashMap<i64, HallBounds> = sqlx::query_as::<_, (i64, i32, i32)>(
        "SELECT ms.id, ch.rows, ch.seats_in_row
         FROM movie_sessions ms
         JOIN cinema_halls ch ON ch.id = ms.cinema_hall_id
         WHERE ms.id = ANY($1)",
    )
    .bind(&session_ids)
    .fetch_all(&mut *tx)
    .await?
    .into_iter()
    .map(|(id, rows, seats_in_row)| (id, HallBounds { rows, seats_in_row }))
    .collect();

    check_tickets(&new.tickets, &halls)?;

    let order = sqlx::query_as::<_, Order>(
        "INSERT INTO orders (user_id) VALUES ($1) RETURNING id, created_at, user_id",
    )
    .bind(user_id)
    .fetch_one(&mut *tx)
    .await?;

    // Rows are locked in the same order by every transaction, so two orders
    // sharing seats wait on each other instead of deadlocking.
    let mut inserted: Vec<Option<Ticket>> = vec![None; new.tickets.len()];
    for index in insertion_order(&new.tickets) {
        let requested = &new.tickets[index];
        let ticket = sqlx::query_as::<_, Ticket>(
            "INSERT INTO tickets (movie_session_id, order_id, row, seat)
             VALUES ($1, $2, $3, $4)
             RETURNING id, row, seat, movie_session_id, order_id",
        )
        .bind(requested.movie_session)
        .bind(order.id)
        .bind(requested.row)
        .bind(requested.seat)
        .fetch_one(&mut *tx)
        .await;

        // dropping `tx` on any error rolls the order back
        match ticket {
            Ok(ticket) => inserted[index] = Some(ticket),
            Err(e) if is_seat_conflict(&e) => {
                warn!(
                    user_id,
                    session = requested.movie_session,
                    row = requested.row,
                    seat = requested.seat,
                    "seat already taken, order rejected"
                );
                return Err(AppError::validation(format!(
                    "Seat (row {}, seat {}) is already taken for session {}.",
                    requested.row, requested.seat, requested.movie_session
                )));
            }
            Err(e) => return Err(e.into()),
        }
    }
    let tickets: Vec<Ticket> = inserted.into_iter().flatten().collect();

    tx.commit().await?;

    info!(order_id = order.id, user_id, tickets = tickets.len(), "order placed");

    Ok(OrderResponse {
        id: order.id,
        tickets: tickets.into_iter().map(TicketResponse::from).collect(),
        created_at: order.created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket(movie_session: i64, row: i32, seat: i32) -> NewTicket {
        NewTicket { movie_session, row, seat }
    }

    fn halls() -> HashMap<i64, HallBounds> {
        HashMap::from([(1, HallBounds { rows: 5, seats_in_row: 10 })])
    }

    #[test]
    fn seats_inside_the_hall_pass() {
        let tickets = [ticket(1, 1, 1), ticket(1, 5, 10), ticket(1, 2, 5)];
        assert!(check_tickets(&tickets, &halls()).is_ok());
    }

    #[test]
    fn row_past_the_last_row_fails() {
        let err = check_tickets(&[ticket(1, 6, 1)], &halls()).unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains("row number")));
    }

    #[test]
    fn seat_past_the_row_end_fails() {
        let err = check_tickets(&[ticket(1, 1, 11)], &halls()).unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains("seat number")));
    }

    #[test]
    fn duplicate_seat_in_one_payload_fails() {
        let err = check_tickets(&[ticket(1, 2, 5), ticket(1, 2, 5)], &halls()).unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains("more than once")));
    }

    #[test]
    fn same_seat_in_different_sessions_is_fine() {
        let mut halls = halls();
        halls.insert(2, HallBounds { rows: 3, seats_in_row: 3 });
        assert!(check_tickets(&[ticket(1, 2, 2), ticket(2, 2, 2)], &halls).is_ok());
    }

    #[test]
    fn inserts_follow_seat_order_not_payload_order() {
        let tickets = [ticket(2, 1, 1), ticket(1, 3, 2), ticket(1, 1, 9), ticket(1, 3, 1)];
        assert_eq!(insertion_order(&tickets), vec![2, 3, 1, 0]);

        let reversed: Vec<NewTicket> = tickets.iter().rev().copied().collect();
        let seats = |t: &[NewTicket], order: Vec<usize>| -> Vec<NewTicket> {
            order.into_iter().map(|i| t[i]).collect()
        };
        assert_eq!(
            seats(&tickets, insertion_order(&tickets)),
            seats(&reversed, insertion_order(&reversed))
        );
    }

    #[test]
    fn unknown_session_is_a_validation_error() {
        let err = check_tickets(&[ticket(42, 1, 1)], &halls()).unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains("42")));
    }
}
