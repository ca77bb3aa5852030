use thiserror::Error;

#[derive(Error, Debug)]
pub enum SalesError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Header alias '{alias}' is claimed by both '{first}' and '{second}'")]
    AliasConflict {
        alias: String,
        first: String,
        second: String,
    },

    #[error("Unsupported source format: {0}")]
    UnsupportedFormat(String),
}

impl From<calamine::Error> for SalesError {
    fn from(e: calamine::Error) -> Self {
        SalesError::Spreadsheet(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SalesError>;
