pub use super::media::Entity as Media;
pub use super::ratings::Entity as Ratings;
pub use super::users::Entity as Users;
