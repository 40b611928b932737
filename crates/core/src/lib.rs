pub mod catalog;
pub mod config;
pub mod dates;
pub mod error;
pub mod models;
pub mod normalize;
pub mod resolver;

pub use catalog::LocationCatalog;
pub use config::ResolverConfig;
pub use dates::{extract_date, parse_explicit_date};
pub use error::{CatalogError, ConfigError};
pub use models::*;
pub use normalize::{detect_locale, fold_text, normalize_text};
pub use resolver::{parse_flight_search_query, QueryResolver};
