pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{
    AuthError, AuthService, AuthSession, AuthUser, PublicUser, Registration, UserProfile,
};
pub use auth_service_impl::SeaOrmAuthService;

pub mod media_service;
pub mod media_service_impl;
pub use media_service::{MediaError, MediaResolver};
pub use media_service_impl::SeaOrmMediaResolver;

pub mod rating_service;
pub mod rating_service_impl;
pub use rating_service::{
    MediaRatingStats, RatingError, RatingRequest, RatingService, RatingView,
};
pub use rating_service_impl::SeaOrmRatingService;

pub mod token;
pub use token::{Claims, TokenSigner};
