use serde::{Deserialize, Serialize};

use crate::modules::users::models::{BlogSummary, UserRecord};
use crate::utils::likes::PostRecord;

/// Collection holding blog documents.
pub const BLOGS: &str = "blogs";

/// Blog document as stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    pub url: String,
    #[serde(default)]
    pub likes: u64,
    /// Id of the user who created the blog
    #[serde(default)]
    pub user: Option<String>,
}

impl BlogRecord {
    pub fn summary(&self) -> BlogSummary {
        BlogSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            author: self.author.clone(),
            url: self.url.clone(),
            likes: self.likes,
        }
    }
}

impl From<&BlogRecord> for PostRecord {
    fn from(blog: &BlogRecord) -> Self {
        PostRecord::new(blog.title.clone(), blog.author.as_deref(), blog.likes)
    }
}

/// Fields written when a blog is first saved.
#[derive(Debug, Serialize)]
pub(crate) struct NewBlogRecord<'a> {
    pub title: &'a str,
    pub author: Option<&'a str>,
    pub url: &'a str,
    pub likes: u64,
    pub user: &'a str,
}

/// Request model for creating a blog.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateBlog {
    pub title: Option<String>,
    pub author: Option<String>,
    pub url: Option<String>,
    pub likes: Option<u64>,
}

/// Request model for updating a blog. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateBlog {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub likes: Option<u64>,
}

impl UpdateBlog {
    /// True when the update changes nothing but the like count.
    pub fn only_likes(&self) -> bool {
        self.title.is_none() && self.author.is_none() && self.url.is_none()
    }
}

/// Public representation of a blog with its owner populated.
#[derive(Debug, Clone, Serialize)]
pub struct Blog {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub url: String,
    pub likes: u64,
    pub user: Option<Owner>,
}

impl Blog {
    pub fn from_record(record: BlogRecord, owner: Option<Owner>) -> Self {
        Self {
            id: record.id,
            title: record.title,
            author: record.author,
            url: record.url,
            likes: record.likes,
            user: owner,
        }
    }
}

/// Owner fields shown inside a blog.
#[derive(Debug, Clone, Serialize)]
pub struct Owner {
    pub id: String,
    pub username: String,
    pub name: String,
}

impl From<&UserRecord> for Owner {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            name: user.name.clone(),
        }
    }
}

/// Like summary across every stored blog.
#[derive(Debug, Clone, Serialize)]
pub struct BlogStats {
    pub total_likes: u64,
    pub favorite: Option<PostRecord>,
}
