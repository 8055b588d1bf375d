use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use validator::Validate;

use super::{actor::{Actor, ActorResponse}, genre::Genre};
use crate::filters::{like_pattern, MovieFilter};
use crate::services::media::MediaStorage;

#[derive(Debug, Clone, FromRow)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub duration: i32,
    pub image: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewMovie {
    #[validate(length(max = 255), custom(function = "super::not_blank"))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[validate(range(min = 1))]
    pub duration: i32,
    #[serde(default)]
    pub genres: Vec<i64>,
    #[serde(default)]
    pub actors: Vec<i64>,
}

// Response shapes: list, detail, write, image upload

#[derive(Debug, Serialize)]
pub struct MovieListItem {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub duration: i32,
    pub genres: Vec<String>,
    pub actors: Vec<String>,
    pub image: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MovieDetail {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub duration: i32,
    pub genres: Vec<Genre>,
    pub actors: Vec<ActorResponse>,
    pub image: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MovieWriteResponse {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub duration: i32,
    pub genres: Vec<i64>,
    pub actors: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct MovieImageResponse {
    pub id: i64,
    pub image: Option<String>,
}

const MOVIE_COLUMNS: &str = "m.id, m.title, m.description, m.duration, m.image";

/// Drops repeated ids while keeping first-seen order.
fn dedup_ids(ids: &[i64]) -> Vec<i64> {
    let mut seen = std::collections::HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

impl Movie {
    pub async fn list(pool: &PgPool, filter: &MovieFilter) -> Result<Vec<Movie>, sqlx::Error> {
        let mut q = format!("SELECT {MOVIE_COLUMNS} FROM movies m WHERE TRUE");
        filter.push_conditions(&mut q, 1);
        q.push_str(" ORDER BY m.id");

        let mut dbq = sqlx::query_as::<_, Movie>(&q);
        if let Some(title) = &filter.title {
            dbq = dbq.bind(like_pattern(title));
        }
        if let Some(genres) = &filter.genres {
            dbq = dbq.bind(genres.clone());
        }
        if let Some(actors) = &filter.actors {
            dbq = dbq.bind(actors.clone());
        }

        dbq.fetch_all(pool).await
    }

    pub async fn find(pool: &PgPool, id: i64) -> Result<Option<Movie>, sqlx::Error> {
        sqlx::query_as::<_, Movie>(&format!("SELECT {MOVIE_COLUMNS} FROM movies m WHERE m.id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Inserts the movie and its genre/actor links in one transaction.
    pub async fn create(pool: &PgPool, new: &NewMovie) -> Result<MovieWriteResponse, sqlx::Error> {
        let genres = dedup_ids(&new.genres);
        let actors = dedup_ids(&new.actors);

        let mut tx = pool.begin().await?;

        let movie = sqlx::query_as::<_, Movie>(
            "INSERT INTO movies (title, description, duration)
             VALUES ($1, $2, $3)
             RETURNING id, title, description, duration, image",
        )
        .bind(new.title.trim())
        .bind(&new.description)
        .bind(new.duration)
        .fetch_one(&mut *tx)
        .await?;

        if !genres.is_empty() {
            sqlx::query(
                "INSERT INTO movie_genres (movie_id, genre_id)
                 SELECT $1, UNNEST($2::BIGINT[])",
            )
            .bind(movie.id)
            .bind(&genres)
            .execute(&mut *tx)
            .await?;
        }

        if !actors.is_empty() {
            sqlx::query(
                "INSERT INTO movie_actors (movie_id, actor_id)
                 SELECT $1, UNNEST($2::BIGINT[])",
            )
            .bind(movie.id)
            .bind(&actors)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(MovieWriteResponse {
            id: movie.id,
            title: movie.title,
            description: movie.description,
            duration: movie.duration,
            genres,
            actors,
        })
    }

    pub async fn set_image(pool: &PgPool, id: i64, image: &str) -> Result<Option<Movie>, sqlx::Error> {
        sqlx::query_as::<_, Movie>(
            "UPDATE movies SET image = $2 WHERE id = $1
             RETURNING id, title, description, duration, image",
        )
        .bind(id)
        .bind(image)
        .fetch_optional(pool)
        .await
    }

    /// Loads the related genres and actors for `movies` and builds list items.
    pub async fn into_list_items(
        pool: &PgPool,
        movies: Vec<Movie>,
        media: &MediaStorage,
    ) -> Result<Vec<MovieListItem>, sqlx::Error> {
        let ids: Vec<i64> = movies.iter().map(|m| m.id).collect();
        let (genres, actors) =
            futures::try_join!(Genre::for_movies(pool, &ids), Actor::for_movies(pool, &ids))?;

        let mut genres_by_movie: HashMap<i64, Vec<String>> = HashMap::new();
        for (movie_id, genre) in genres {
            genres_by_movie.entry(movie_id).or_default().push(genre.name);
        }
        let mut actors_by_movie: HashMap<i64, Vec<String>> = HashMap::new();
        for (movie_id, actor) in actors {
            actors_by_movie.entry(movie_id).or_default().push(actor.full_name());
        }

        Ok(movies
            .into_iter()
            .map(|m| MovieListItem {
                genres: genres_by_movie.remove(&m.id).unwrap_or_default(),
                actors: actors_by_movie.remove(&m.id).unwrap_or_default(),
                image: media.url_for(m.image.as_deref()),
                id: m.id,
                title: m.title,
                description: m.description,
                duration: m.duration,
            })
            .collect())
    }

    pub async fn into_detail(self, pool: &PgPool, media: &MediaStorage) -> Result<MovieDetail, sqlx::Error> {
        let ids = [self.id];
        let (genres, actors) =
            futures::try_join!(Genre::for_movies(pool, &ids), Actor::for_movies(pool, &ids))?;

        Ok(MovieDetail {
            genres: genres.into_iter().map(|(_, g)| g).collect(),
            actors: actors.into_iter().map(|(_, a)| ActorResponse::from(a)).collect(),
            image: media.url_for(self.image.as_deref()),
            id: self.id,
            title: self.title,
            description: self.description,
            duration: self.duration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_keeps_first_occurrence() {
        assert_eq!(dedup_ids(&[3, 1, 3, 2, 1]), vec![3, 1, 2]);
    }

    #[test]
    fn new_movie_defaults_relations() {
        let payload: NewMovie =
            serde_json::from_str(r#"{"title": "Inception", "duration": 148}"#).unwrap();
        assert!(payload.validate().is_ok());
        assert!(payload.genres.is_empty());
        assert!(payload.description.is_empty());
    }

    #[test]
    fn zero_duration_is_invalid() {
        let payload: NewMovie =
            serde_json::from_str(r#"{"title": "Short", "duration": 0}"#).unwrap();
        assert!(payload.validate().is_err());
    }
}
