use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use validator::Validate;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Actor {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Serialize)]
pub struct ActorResponse {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewActor {
    #[validate(length(max = 255), custom(function = "super::not_blank"))]
    pub first_name: String,
    #[validate(length(max = 255), custom(function = "super::not_blank"))]
    pub last_name: String,
}

impl Actor {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<Actor>, sqlx::Error> {
        sqlx::query_as::<_, Actor>("SELECT id, first_name, last_name FROM actors ORDER BY id")
            .fetch_all(pool)
            .await
    }

    pub async fn create(pool: &PgPool, new: &NewActor) -> Result<Actor, sqlx::Error> {
        sqlx::query_as::<_, Actor>(
            "INSERT INTO actors (first_name, last_name)
             VALUES ($1, $2)
             RETURNING id, first_name, last_name",
        )
        .bind(new.first_name.trim())
        .bind(new.last_name.trim())
        .fetch_one(pool)
        .await
    }

    /// Actors attached to each of the given movies, as `(movie_id, actor)`.
    pub async fn for_movies(pool: &PgPool, movie_ids: &[i64]) -> Result<Vec<(i64, Actor)>, sqlx::Error> {
        let rows = sqlx::query_as::<_, (i64, i64, String, String)>(
            "SELECT ma.movie_id, a.id, a.first_name, a.last_name
             FROM movie_actors ma
             JOIN actors a ON a.id = ma.actor_id
             WHERE ma.movie_id = ANY($1)
             ORDER BY ma.movie_id, a.id",
        )
        .bind(movie_ids)
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(movie_id, id, first_name, last_name)| {
                (movie_id, Actor { id, first_name, last_name })
            })
            .collect())
    }
}

impl From<Actor> for ActorResponse {
    fn from(actor: Actor) -> Self {
        let full_name = actor.full_name();
        ActorResponse {
            id: actor.id,
            first_name: actor.first_name,
            last_name: actor.last_name,
            full_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_carries_full_name() {
        let actor = Actor {
            id: 1,
            first_name: "Keanu".into(),
            last_name: "Reeves".into(),
        };
        let response = ActorResponse::from(actor);
        assert_eq!(response.full_name, "Keanu Reeves");
    }
}
