//! Query-string filters for the movie and movie session listings.
//!
//! Raw parameters arrive as optional strings; an empty value means the
//! filter is off, anything else must parse or the request fails.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::AppError;

#[derive(Debug, Default, Deserialize)]
pub struct MovieQuery {
    pub title: Option<String>,
    pub genres: Option<String>,
    pub actors: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MovieFilter {
    pub title: Option<String>,
    pub genres: Option<Vec<i64>>,
    pub actors: Option<Vec<i64>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MovieSessionQuery {
    pub date: Option<String>,
    pub movie: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MovieSessionFilter {
    pub date: Option<NaiveDate>,
    pub movie: Option<i64>,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Parses `"1,2,3"` into ids. Every piece must be an integer.
pub fn parse_ids(param: &'static str, raw: &str) -> Result<Vec<i64>, AppError> {
    raw.split(',')
        .map(|piece| {
            piece.trim().parse::<i64>().map_err(|_| {
                AppError::validation(format!(
                    "Invalid value for '{param}': expected comma-separated integer ids, got {raw:?}"
                ))
            })
        })
        .collect()
}

/// Escapes `%`, `_` and `\` so user input is matched literally by ILIKE.
pub fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

impl TryFrom<MovieQuery> for MovieFilter {
    type Error = AppError;

    fn try_from(query: MovieQuery) -> Result<Self, Self::Error> {
        Ok(MovieFilter {
            title: non_empty(query.title.as_deref()).map(str::to_string),
            genres: non_empty(query.genres.as_deref())
                .map(|raw| parse_ids("genres", raw))
                .transpose()?,
            actors: non_empty(query.actors.as_deref())
                .map(|raw| parse_ids("actors", raw))
                .transpose()?,
        })
    }
}

impl MovieFilter {
    /// Appends the AND-ed conditions to `sql`, numbering placeholders from
    /// `next_bind`. Bind order is title, genres, actors.
    pub fn push_conditions(&self, sql: &mut String, mut next_bind: usize) -> usize {
        if self.title.is_some() {
            sql.push_str(&format!(" AND m.title ILIKE ${}", next_bind));
            next_bind += 1;
        }
        // EXISTS keeps a movie once no matter how many listed ids it matches
        if self.genres.is_some() {
            sql.push_str(&format!(
                " AND EXISTS (SELECT 1 FROM movie_genres mg WHERE mg.movie_id = m.id AND mg.genre_id = ANY(${}))",
                next_bind
            ));
            next_bind += 1;
        }
        if self.actors.is_some() {
            sql.push_str(&format!(
                " AND EXISTS (SELECT 1 FROM movie_actors ma WHERE ma.movie_id = m.id AND ma.actor_id = ANY(${}))",
                next_bind
            ));
            next_bind += 1;
        }
        next_bind
    }
}

impl TryFrom<MovieSessionQuery> for MovieSessionFilter {
    type Error = AppError;

    fn try_from(query: MovieSessionQuery) -> Result<Self, Self::Error> {
        let date = non_empty(query.date.as_deref())
            .map(|raw| {
                NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
                    AppError::validation(format!(
                        "Invalid value for 'date': expected YYYY-MM-DD, got {raw:?}"
                    ))
                })
            })
            .transpose()?;

        let movie = non_empty(query.movie.as_deref())
            .map(|raw| {
                raw.trim().parse::<i64>().map_err(|_| {
                    AppError::validation(format!(
                        "Invalid value for 'movie': expected an integer id, got {raw:?}"
                    ))
                })
            })
            .transpose()?;

        Ok(MovieSessionFilter { date, movie })
    }
}

impl MovieSessionFilter {
    /// Same contract as [`MovieFilter::push_conditions`]; bind order is date, movie.
    pub fn push_conditions(&self, sql: &mut String, mut next_bind: usize) -> usize {
        if self.date.is_some() {
            sql.push_str(&format!(" AND ms.show_time::date = ${}", next_bind));
            next_bind += 1;
        }
        if self.movie.is_some() {
            sql.push_str(&format!(" AND ms.movie_id = ${}", next_bind));
            next_bind += 1;
        }
        next_bind
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn movie_filter(query: &str) -> Result<MovieFilter, AppError> {
        let query: MovieQuery = serde_urlencoded::from_str(query).unwrap();
        MovieFilter::try_from(query)
    }

    fn session_filter(query: &str) -> Result<MovieSessionFilter, AppError> {
        let query: MovieSessionQuery = serde_urlencoded::from_str(query).unwrap();
        MovieSessionFilter::try_from(query)
    }

    #[test]
    fn no_params_means_no_filters() {
        assert_eq!(movie_filter("").unwrap(), MovieFilter::default());
        assert_eq!(movie_filter("title=&genres=").unwrap(), MovieFilter::default());
    }

    #[test]
    fn genre_and_actor_lists_parse() {
        let filter = movie_filter("genres=1,2&actors=3").unwrap();
        assert_eq!(filter.genres, Some(vec![1, 2]));
        assert_eq!(filter.actors, Some(vec![3]));
        assert_eq!(movie_filter("genres=1,%202").unwrap().genres, Some(vec![1, 2]));
    }

    #[test]
    fn non_numeric_ids_are_rejected() {
        assert!(matches!(movie_filter("genres=1,drama"), Err(AppError::Validation(_))));
        assert!(matches!(movie_filter("actors=1,,2"), Err(AppError::Validation(_))));
        assert!(matches!(session_filter("movie=abc"), Err(AppError::Validation(_))));
    }

    #[test]
    fn session_date_must_be_iso() {
        let filter = session_filter("date=2024-10-10&movie=4").unwrap();
        assert_eq!(filter.date, NaiveDate::from_ymd_opt(2024, 10, 10));
        assert_eq!(filter.movie, Some(4));

        assert!(session_filter("date=10/10/2024").is_err());
        assert!(session_filter("date=2024-02-30").is_err());
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(like_pattern("incep"), "%incep%");
        assert_eq!(like_pattern("100%_off\\"), "%100\\%\\_off\\\\%");
    }

    #[test]
    fn conditions_number_placeholders_in_bind_order() {
        let filter = MovieFilter {
            title: Some("x".into()),
            genres: None,
            actors: Some(vec![1]),
        };
        let mut sql = String::from("SELECT m.id FROM movies m WHERE TRUE");
        let next = filter.push_conditions(&mut sql, 1);
        assert_eq!(next, 3);
        assert!(sql.contains("m.title ILIKE $1"));
        assert!(sql.contains("ma.actor_id = ANY($2)"));
        assert!(!sql.contains("movie_genres"));

        let mut sql = String::new();
        let next = MovieSessionFilter { date: None, movie: Some(2) }.push_conditions(&mut sql, 1);
        assert_eq!(next, 2);
        assert_eq!(sql, " AND ms.movie_id = $1");
    }

    proptest! {
        #[test]
        fn any_integer_list_parses_back(ids in proptest::collection::vec(any::<i64>(), 1..12)) {
            let raw = ids.iter().map(i64::to_string).collect::<Vec<_>>().join(",");
            prop_assert_eq!(parse_ids("genres", &raw).unwrap(), ids);
        }

        #[test]
        fn alphabetic_piece_always_fails(prefix in proptest::collection::vec(1i64..1000, 0..4), word in "[a-zA-Z]{1,8}") {
            let mut pieces: Vec<String> = prefix.iter().map(i64::to_string).collect();
            pieces.push(word);
            prop_assert!(parse_ids("actors", &pieces.join(",")).is_err());
        }
    }
}
