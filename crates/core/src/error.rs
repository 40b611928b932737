use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("location catalog is empty")]
    Empty,

    #[error("location `{city}` has a blank code")]
    BlankCode { city: String },

    #[error("duplicate location code `{0}`")]
    DuplicateCode(String),

    #[error("failed reading location catalog at {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid location catalog json")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} is not a number: {value}")]
    InvalidNumber { key: &'static str, value: String },

    #[error("min_confidence must be within [0, 1], got {0}")]
    ThresholdOutOfRange(f64),

    #[error("{0} must be a non-negative finite weight")]
    InvalidWeight(&'static str),

    #[error("at least one confidence weight must be positive")]
    ZeroWeights,
}
