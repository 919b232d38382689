use thiserror::Error;

/// Errors raised by the document store.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("duplicate value for unique field `{field}` in `{collection}`")]
    Duplicate { collection: String, field: String },

    #[error("documents in `{collection}` must serialize to JSON objects")]
    NotAnObject { collection: String },

    #[error("field `{field}` in `{collection}` is not an array")]
    NotAnArray { collection: String, field: String },

    #[error("document (de)serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
