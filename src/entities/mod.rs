pub mod prelude;

pub mod media;
pub mod ratings;
pub mod users;
