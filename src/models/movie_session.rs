use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use super::cinema_hall::{capacity, CinemaHall, CinemaHallResponse};
use super::movie::{Movie, MovieListItem};
use crate::filters::MovieSessionFilter;
use crate::services::media::MediaStorage;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct MovieSession {
    pub id: i64,
    pub show_time: NaiveDateTime,
    #[sqlx(rename = "movie_id")]
    pub movie: i64,
    #[sqlx(rename = "cinema_hall_id")]
    pub cinema_hall: i64,
}

#[derive(Debug, Deserialize)]
pub struct NewMovieSession {
    pub show_time: NaiveDateTime,
    pub movie: i64,
    pub cinema_hall: i64,
}

/// PATCH body: any subset of the writable fields.
#[derive(Debug, Default, Deserialize)]
pub struct MovieSessionPatch {
    pub show_time: Option<NaiveDateTime>,
    pub movie: Option<i64>,
    pub cinema_hall: Option<i64>,
}

/// Row behind the list shape; seat counts are raw so availability is
/// derived in one place.
#[derive(Debug, Clone, FromRow)]
pub struct MovieSessionListRow {
    pub id: i64,
    pub show_time: NaiveDateTime,
    pub movie_title: String,
    pub movie_image: Option<String>,
    pub cinema_hall_name: String,
    pub rows: i32,
    pub seats_in_row: i32,
    pub tickets_sold: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MovieSessionListItem {
    pub id: i64,
    pub show_time: NaiveDateTime,
    pub movie_title: String,
    pub movie_image: Option<String>,
    pub cinema_hall_name: String,
    pub cinema_hall_capacity: i64,
    pub tickets_available: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow, Serialize)]
pub struct TakenPlace {
    pub row: i32,
    pub seat: i32,
}

#[derive(Debug, Serialize)]
pub struct MovieSessionDetail {
    pub id: i64,
    pub show_time: NaiveDateTime,
    pub movie: MovieListItem,
    pub cinema_hall: CinemaHallResponse,
    pub taken_places: Vec<TakenPlace>,
}

/// Seats still free for a session: capacity minus tickets sold.
pub fn tickets_available(rows: i32, seats_in_row: i32, tickets_sold: i64) -> i64 {
    capacity(rows, seats_in_row) - tickets_sold
}

impl MovieSessionListRow {
    pub fn into_item(self, media: &MediaStorage) -> MovieSessionListItem {
        MovieSessionListItem {
            cinema_hall_capacity: capacity(self.rows, self.seats_in_row),
            tickets_available: tickets_available(self.rows, self.seats_in_row, self.tickets_sold),
            movie_image: media.url_for(self.movie_image.as_deref()),
            id: self.id,
            show_time: self.show_time,
            movie_title: self.movie_title,
            cinema_hall_name: self.cinema_hall_name,
        }
    }
}

/// Shared SELECT for the list shape, used by session and order listings.
pub(crate) const SESSION_LIST_SELECT: &str = "
    SELECT ms.id, ms.show_time,
           m.title AS movie_title, m.image AS movie_image,
           ch.name AS cinema_hall_name, ch.rows, ch.seats_in_row,
           (SELECT COUNT(*) FROM tickets t WHERE t.movie_session_id = ms.id) AS tickets_sold
    FROM movie_sessions ms
    JOIN movies m ON m.id = ms.movie_id
    JOIN cinema_halls ch ON ch.id = ms.cinema_hall_id";

const SESSION_COLUMNS: &str = "id, show_time, movie_id, cinema_hall_id";

impl MovieSession {
    pub async fn list(pool: &PgPool, filter: &MovieSessionFilter) -> Result<Vec<MovieSessionListRow>, sqlx::Error> {
        let mut q = format!("{SESSION_LIST_SELECT} WHERE TRUE");
        filter.push_conditions(&mut q, 1);
        q.push_str(" ORDER BY ms.show_time DESC, ms.id DESC");

        let mut dbq = sqlx::query_as::<_, MovieSessionListRow>(&q);
        if let Some(date) = filter.date {
            dbq = dbq.bind(date);
        }
        if let Some(movie) = filter.movie {
            dbq = dbq.bind(movie);
        }

        dbq.fetch_all(pool).await
    }

    pub async fn list_rows_by_ids(pool: &PgPool, ids: &[i64]) -> Result<Vec<MovieSessionListRow>, sqlx::Error> {
        sqlx::query_as::<_, MovieSessionListRow>(&format!("{SESSION_LIST_SELECT} WHERE ms.id = ANY($1)"))
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    pub async fn find(pool: &PgPool, id: i64) -> Result<Option<MovieSession>, sqlx::Error> {
        sqlx::query_as::<_, MovieSession>(&format!(
            "SELECT {SESSION_COLUMNS} FROM movie_sessions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn create(pool: &PgPool, new: &NewMovieSession) -> Result<MovieSession, sqlx::Error> {
        sqlx::query_as::<_, MovieSession>(&format!(
            "INSERT INTO movie_sessions (show_time, movie_id, cinema_hall_id)
             VALUES ($1, $2, $3)
             RETURNING {SESSION_COLUMNS}"
        ))
        .bind(new.show_time)
        .bind(new.movie)
        .bind(new.cinema_hall)
        .fetch_one(pool)
        .await
    }

    /// Applies a patch; absent fields keep their stored value.
    pub async fn update(pool: &PgPool, id: i64, patch: &MovieSessionPatch) -> Result<Option<MovieSession>, sqlx::Error> {
        sqlx::query_as::<_, MovieSession>(&format!(
            "UPDATE movie_sessions
             SET show_time = COALESCE($2, show_time),
                 movie_id = COALESCE($3, movie_id),
                 cinema_hall_id = COALESCE($4, cinema_hall_id)
             WHERE id = $1
             RETURNING {SESSION_COLUMNS}"
        ))
        .bind(id)
        .bind(patch.show_time)
        .bind(patch.movie)
        .bind(patch.cinema_hall)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM movie_sessions WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn taken_places(pool: &PgPool, id: i64) -> Result<Vec<TakenPlace>, sqlx::Error> {
        sqlx::query_as::<_, TakenPlace>(
            "SELECT row, seat FROM tickets WHERE movie_session_id = $1 ORDER BY row, seat",
        )
        .bind(id)
        .fetch_all(pool)
        .await
    }

    pub async fn into_detail(self, pool: &PgPool, media: &MediaStorage) -> Result<MovieSessionDetail, sqlx::Error> {
        let hall = sqlx::query_as::<_, CinemaHall>(
            "SELECT id, name, rows, seats_in_row FROM cinema_halls WHERE id = $1",
        )
        .bind(self.cinema_hall)
        .fetch_one(pool);
        let movie = Movie::find(pool, self.movie);
        let taken = Self::taken_places(pool, self.id);

        let (hall, movie, taken_places) = futures::try_join!(hall, movie, taken)?;
        let movie = movie.ok_or(sqlx::Error::RowNotFound)?;
        let movie = Movie::into_list_items(pool, vec![movie], media)
            .await?
            .pop()
            .ok_or(sqlx::Error::RowNotFound)?;

        Ok(MovieSessionDetail {
            id: self.id,
            show_time: self.show_time,
            movie,
            cinema_hall: hall.into(),
            taken_places,
        })
    }
}

impl From<NewMovieSession> for MovieSessionPatch {
    fn from(full: NewMovieSession) -> Self {
        MovieSessionPatch {
            show_time: Some(full.show_time),
            movie: Some(full.movie),
            cinema_hall: Some(full.cinema_hall),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn available_is_capacity_minus_sold() {
        assert_eq!(tickets_available(5, 10, 3), 47);
        assert_eq!(tickets_available(5, 10, 0), 50);
        assert_eq!(tickets_available(1, 1, 1), 0);
    }

    #[test]
    fn list_row_projects_derived_fields() {
        let media = MediaStorage::new(PathBuf::from("/tmp/media"), "/media");
        let row = MovieSessionListRow {
            id: 9,
            show_time: NaiveDateTime::parse_from_str("2024-10-10 18:30:00", "%Y-%m-%d %H:%M:%S").unwrap(),
            movie_title: "Arrival".into(),
            movie_image: Some("uploads/movies/arrival.png".into()),
            cinema_hall_name: "Red".into(),
            rows: 5,
            seats_in_row: 10,
            tickets_sold: 3,
        };

        let item = row.into_item(&media);
        assert_eq!(item.cinema_hall_capacity, 50);
        assert_eq!(item.tickets_available, 47);
        assert_eq!(item.movie_image.as_deref(), Some("/media/uploads/movies/arrival.png"));
    }

    #[test]
    fn patch_accepts_partial_body() {
        let patch: MovieSessionPatch = serde_json::from_str(r#"{"movie": 3}"#).unwrap();
        assert_eq!(patch.movie, Some(3));
        assert!(patch.show_time.is_none());
    }
}
