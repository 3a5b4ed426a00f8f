use async_graphql::*;
use chrono::{DateTime, Utc};

use crate::db::models;

/// A post's creator as exposed to clients.
#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "Creator")]
pub struct CreatorType {
    #[graphql(name = "_id")]
    pub id: ID,

    pub name: String,
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "Post")]
pub struct PostType {
    #[graphql(name = "_id")]
    pub id: ID,

    pub title: String,

    pub content: String,

    /// Public path of the stored image (`images/<filename>`)
    pub image_url: String,

    pub creator: CreatorType,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "User")]
pub struct UserType {
    #[graphql(name = "_id")]
    pub id: ID,

    pub email: String,

    pub name: String,

    /// Free-text status line, defaults to "I am new!"
    pub status: String,

    /// Posts owned by this user, in creation order
    pub posts: Vec<PostType>,
}

/// Result of a successful login
#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "AuthData")]
pub struct AuthData {
    pub token: String,
    pub user_id: ID,
}

/// One page of the post feed
#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "PostData")]
pub struct PostData {
    pub posts: Vec<PostType>,
    pub total_items: i64,
}

/// Input for creating a new account
#[derive(InputObject)]
pub struct UserInput {
    pub email: String,
    pub name: String,
    pub password: String,
}

/// Input for creating or updating a post. An absent image URL on update
/// retains the post's current image.
#[derive(InputObject)]
pub struct PostInput {
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
}

impl From<models::Creator> for CreatorType {
    fn from(creator: models::Creator) -> Self {
        Self {
            id: ID(creator.id),
            name: creator.name,
        }
    }
}

impl From<models::Post> for PostType {
    fn from(post: models::Post) -> Self {
        Self {
            id: ID(post.id),
            title: post.title,
            content: post.content,
            image_url: post.image_url,
            creator: post.creator.into(),
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

impl UserType {
    pub fn from_user(user: models::User, posts: Vec<models::Post>) -> Self {
        Self {
            id: ID(user.id),
            email: user.email,
            name: user.name,
            status: user.status,
            posts: posts.into_iter().map(PostType::from).collect(),
        }
    }
}
