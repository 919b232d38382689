use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthzError {
    #[error("token missing or invalid")]
    InvalidToken(#[source] jsonwebtoken::errors::Error),

    #[error("failed to issue token: {0}")]
    TokenIssue(#[source] jsonwebtoken::errors::Error),

    #[error("only the owner may modify this resource")]
    NotOwner,

    #[error("password hashing failed: {0}")]
    Hash(String),
}
