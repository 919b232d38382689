use serde::{Deserialize, Serialize};

/// Collection holding user documents.
pub const USERS: &str = "users";

/// User document as stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    pub name: String,
    pub password_hash: String,
    /// Ids of blogs created by this user, oldest first
    #[serde(default)]
    pub blogs: Vec<String>,
}

/// Fields written when a user is first saved.
#[derive(Debug, Serialize)]
pub(crate) struct NewUserRecord<'a> {
    pub username: &'a str,
    pub name: &'a str,
    pub password_hash: &'a str,
    pub blogs: Vec<String>,
}

/// Request model for registering a user. Fields are validated by the handler.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateUser {
    pub username: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
}

/// Public representation of a user; never carries the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub name: String,
    pub blogs: Vec<BlogSummary>,
}

/// Blog fields shown inside a user listing.
#[derive(Debug, Clone, Serialize)]
pub struct BlogSummary {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub url: String,
    pub likes: u64,
}

impl User {
    pub fn from_record(record: UserRecord, blogs: Vec<BlogSummary>) -> Self {
        Self {
            id: record.id,
            username: record.username,
            name: record.name,
            blogs,
        }
    }
}
