use chrono::{DateTime, Utc};
use serde::Serialize;

/// A post's owning user, embedded in serialized posts the way clients
/// expect it (`_id` + display name).
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Creator {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub content: String,
    pub image_url: String,
    pub creator: Creator,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    pub name: String,
    pub status: String,
    /// Owned post ids in creation order. Kept consistent with
    /// posts.creator_id on create and delete (best-effort, two writes).
    pub posts: Vec<String>,
    #[serde(skip)]
    pub password_hash: String,
}
