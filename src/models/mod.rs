pub mod actor;
pub mod cinema_hall;
pub mod genre;
pub mod movie;
pub mod movie_session;
pub mod order;

pub use actor::Actor;
pub use cinema_hall::CinemaHall;
pub use genre::Genre;
pub use movie::Movie;
pub use movie_session::MovieSession;
pub use order::{Order, Ticket};

use validator::ValidationError;

/// Rejects strings that are empty once surrounding whitespace is removed.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("This field may not be blank.".into()));
    }
    Ok(())
}
