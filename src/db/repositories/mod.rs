pub mod media;
pub mod rating;
pub mod user;
