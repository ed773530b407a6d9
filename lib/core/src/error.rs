use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Missing required field `{field}` in {table} table")]
    InputValidation { table: String, field: String },

    #[error("Invalid numeric value {value:?} for `{field}` of item {item}")]
    NumericParse {
        item: String,
        field: &'static str,
        value: String,
    },

    #[error("Duplicate item id: {0}")]
    DuplicateItem(String),

    #[error("Unknown item: {0}")]
    UnknownItem(String),

    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("Cannot build from an empty corpus")]
    EmptyCorpus,

    #[error("Empty vocabulary: every token is a stop word or too short")]
    EmptyVocabulary,

    #[error("Vectorizer used before fit")]
    NotFitted,

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Unknown embedding model: {0}")]
    UnknownModel(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    pub fn missing_field(table: &str, field: &str) -> Self {
        Error::InputValidation {
            table: table.to_string(),
            field: field.to_string(),
        }
    }

    /// Query-time failures that leave the service usable.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::UnknownItem(_) | Error::InvalidDimension { .. })
    }
}
