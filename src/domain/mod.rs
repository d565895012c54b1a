//! Domain primitives for media, ratings and users.
//!
//! Scores are kept as half-point integers internally so that validation,
//! bucketing and averaging never depend on floating point rounding.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub mod stats;

pub use stats::{Distribution, RatingSummary, summarize};

/// Lowest accepted score.
pub const MIN_SCORE: f64 = 0.5;

/// Highest accepted score.
pub const MAX_SCORE: f64 = 10.0;

/// Maximum review length, counted in characters.
pub const MAX_REVIEW_CHARS: usize = 2000;

/// Violations of domain rules. Every variant reads as a user-facing reason.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Invalid media type: {0}")]
    InvalidKind(String),

    #[error("Rating must be between 0.5 and 10.0")]
    ScoreOutOfRange,

    #[error("Rating must be in increments of 0.5")]
    ScoreGranularity,

    #[error("Review cannot exceed 2000 characters")]
    ReviewTooLong,

    #[error("{0}")]
    InvalidUsername(&'static str),

    #[error("{0}")]
    InvalidEmail(&'static str),
}

/// Discriminates the two catalog namespaces.
///
/// Stored as `"movie"` / `"tv"`, which is also how the API renders it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum MediaKind {
    #[sea_orm(string_value = "movie")]
    #[serde(rename = "movie")]
    Film,

    #[sea_orm(string_value = "tv")]
    #[serde(rename = "tv")]
    Series,
}

impl MediaKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Film => "movie",
            Self::Series => "tv",
        }
    }

    /// Title stored when the catalog does not supply one.
    #[must_use]
    pub const fn placeholder_title(self) -> &'static str {
        match self {
            Self::Film => "Unknown Title",
            Self::Series => "Unknown Series",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "movie" | "film" => Ok(Self::Film),
            "tv" | "series" | "show" => Ok(Self::Series),
            _ => Err(DomainError::InvalidKind(s.to_string())),
        }
    }
}

/// A validated score in `[0.5, 10.0]` with 0.5 granularity.
///
/// ```rust
/// use cinelog::domain::Score;
///
/// let score = Score::new(7.5).unwrap();
/// assert_eq!(score.half_points(), 15);
/// assert!(Score::new(7.3).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Score(u8);

impl Score {
    pub fn new(value: f64) -> Result<Self, DomainError> {
        if !(MIN_SCORE..=MAX_SCORE).contains(&value) {
            return Err(DomainError::ScoreOutOfRange);
        }

        let doubled = value * 2.0;
        if doubled.fract() != 0.0 {
            return Err(DomainError::ScoreGranularity);
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Ok(Self(doubled as u8))
    }

    /// Rebuilds a score from a stored value, snapping to the nearest half point.
    #[must_use]
    pub fn from_stored(value: f64) -> Self {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let halves = (value * 2.0).round().clamp(1.0, 20.0) as u8;
        Self(halves)
    }

    #[must_use]
    pub const fn half_points(self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn value(self) -> f64 {
        f64::from(self.0) / 2.0
    }

    /// Five-glyph star rendering: one full star per two whole points,
    /// padded with hollow stars.
    #[must_use]
    pub fn stars(self) -> String {
        let full = usize::from(self.0 / 4);
        let mut out = "★".repeat(full);
        out.push_str(&"☆".repeat(5 - full));
        out
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.value())
    }
}

/// Trims a review, maps blank text to `None` and enforces the length cap.
pub fn normalize_review(review: Option<&str>) -> Result<Option<String>, DomainError> {
    let Some(text) = review.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };

    if text.chars().count() > MAX_REVIEW_CHARS {
        return Err(DomainError::ReviewTooLong);
    }

    Ok(Some(text.to_string()))
}

pub fn validate_username(username: &str) -> Result<&str, DomainError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(DomainError::InvalidUsername("Username is required"));
    }

    let len = username.chars().count();
    if !(3..=50).contains(&len) {
        return Err(DomainError::InvalidUsername(
            "Username must be between 3 and 50 characters",
        ));
    }

    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
    {
        return Err(DomainError::InvalidUsername(
            "Username can only contain letters, numbers, underscores, and hyphens",
        ));
    }

    Ok(username)
}

/// Returns the trimmed, lowercased address.
pub fn normalize_email(email: &str) -> Result<String, DomainError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(DomainError::InvalidEmail("Email is required"));
    }

    if !email.contains('@') || email.len() > 255 {
        return Err(DomainError::InvalidEmail("Invalid email format"));
    }

    Ok(email.to_lowercase())
}
