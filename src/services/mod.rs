pub mod media;
pub mod orders;
