//! Authentication and authorization primitives for Quill.
//!
//! - [`password`]: Argon2id hashing of user passwords
//! - [`token`]: HS256 bearer tokens identifying a user
//! - [`guard`]: ownership checks on user-owned resources

pub mod guard;
pub mod password;
pub mod token;

mod error;

pub use error::AuthzError;
pub use guard::ensure_owner;
pub use token::{Claims, TokenService};

pub type Result<T> = std::result::Result<T, AuthzError>;
