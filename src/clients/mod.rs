pub mod catalog;
pub mod tmdb;

pub use catalog::{Catalog, CatalogError, Country, Genre, KindDetails, MediaDetails};
pub use tmdb::TmdbClient;
