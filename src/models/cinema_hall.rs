use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use validator::Validate;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CinemaHall {
    pub id: i64,
    pub name: String,
    pub rows: i32,
    pub seats_in_row: i32,
}

#[derive(Debug, Serialize)]
pub struct CinemaHallResponse {
    pub id: i64,
    pub name: String,
    pub rows: i32,
    pub seats_in_row: i32,
    pub capacity: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewCinemaHall {
    #[validate(length(max = 255), custom(function = "super::not_blank"))]
    pub name: String,
    #[validate(range(min = 1))]
    pub rows: i32,
    #[validate(range(min = 1))]
    pub seats_in_row: i32,
}

/// Hall capacity, widened so large halls cannot overflow.
pub fn capacity(rows: i32, seats_in_row: i32) -> i64 {
    i64::from(rows) * i64::from(seats_in_row)
}

impl CinemaHall {
    pub fn capacity(&self) -> i64 {
        capacity(self.rows, self.seats_in_row)
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<CinemaHall>, sqlx::Error> {
        sqlx::query_as::<_, CinemaHall>(
            "SELECT id, name, rows, seats_in_row FROM cinema_halls ORDER BY id",
        )
        .fetch_all(pool)
        .await
    }

    pub async fn create(pool: &PgPool, new: &NewCinemaHall) -> Result<CinemaHall, sqlx::Error> {
        sqlx::query_as::<_, CinemaHall>(
            "INSERT INTO cinema_halls (name, rows, seats_in_row)
             VALUES ($1, $2, $3)
             RETURNING id, name, rows, seats_in_row",
        )
        .bind(new.name.trim())
        .bind(new.rows)
        .bind(new.seats_in_row)
        .fetch_one(pool)
        .await
    }
}

impl From<CinemaHall> for CinemaHallResponse {
    fn from(hall: CinemaHall) -> Self {
        CinemaHallResponse {
            capacity: hall.capacity(),
            id: hall.id,
            name: hall.name,
            rows: hall.rows,
            seats_in_row: hall.seats_in_row,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_is_rows_times_seats() {
        assert_eq!(capacity(5, 10), 50);
        assert_eq!(capacity(i32::MAX, 2), 2 * i64::from(i32::MAX));
    }

    #[test]
    fn zero_rows_fail_validation() {
        let hall = NewCinemaHall {
            name: "Blue".into(),
            rows: 0,
            seats_in_row: 12,
        };
        assert!(hall.validate().is_err());
    }
}
