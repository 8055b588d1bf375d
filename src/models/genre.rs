use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use validator::Validate;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewGenre {
    #[validate(length(max = 255), custom(function = "super::not_blank"))]
    pub name: String,
}

impl Genre {
    pub async fn list(pool: &PgPool) -> Result<Vec<Genre>, sqlx::Error> {
        sqlx::query_as::<_, Genre>("SELECT id, name FROM genres ORDER BY id")
            .fetch_all(pool)
            .await
    }

    pub async fn create(pool: &PgPool, new: &NewGenre) -> Result<Genre, sqlx::Error> {
        sqlx::query_as::<_, Genre>("INSERT INTO genres (name) VALUES ($1) RETURNING id, name")
            .bind(new.name.trim())
            .fetch_one(pool)
            .await
    }

    /// Genres attached to each of the given movies, as `(movie_id, genre)`.
    pub async fn for_movies(pool: &PgPool, movie_ids: &[i64]) -> Result<Vec<(i64, Genre)>, sqlx::Error> {
        let rows = sqlx::query_as::<_, (i64, i64, String)>(
            "SELECT mg.movie_id, g.id, g.name
             FROM movie_genres mg
             JOIN genres g ON g.id = mg.genre_id
             WHERE mg.movie_id = ANY($1)
             ORDER BY mg.movie_id, g.id",
        )
        .bind(movie_ids)
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(movie_id, id, name)| (movie_id, Genre { id, name }))
            .collect())
    }
}
