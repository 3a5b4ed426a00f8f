use std::sync::Arc;

use async_graphql::*;

use crate::accounts;
use crate::auth::{AuthContext, Credentials};
use crate::config::FeedConfig;
use crate::feed;
use crate::graphql::to_gql_error;
use crate::graphql::types::{AuthData, PostData, PostType, UserType};
use crate::state::DbPool;

/// GraphQL Query root
pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Log in with email and password, returning a one-hour bearer token
    async fn login(&self, ctx: &Context<'_>, email: String, password: String) -> Result<AuthData> {
        let pool = ctx.data::<DbPool>()?;
        let credentials = ctx.data::<Arc<Credentials>>()?;
        let conn = pool.get().map_err(|e| to_gql_error(e.into()))?;

        let (token, user_id) =
            accounts::login(&conn, credentials, &email, &password).map_err(to_gql_error)?;

        Ok(AuthData {
            token,
            user_id: ID(user_id),
        })
    }

    /// One page of the feed, newest first
    async fn posts(&self, ctx: &Context<'_>, page: Option<u32>) -> Result<PostData> {
        let auth = ctx.data::<AuthContext>()?;
        auth.require().map_err(to_gql_error)?;

        let pool = ctx.data::<DbPool>()?;
        let feed_config = ctx.data::<FeedConfig>()?;
        let conn = pool.get().map_err(|e| to_gql_error(e.into()))?;

        let page = feed::list_posts(&conn, page.unwrap_or(1), feed_config.page_size)
            .map_err(to_gql_error)?;

        Ok(PostData {
            posts: page.posts.into_iter().map(PostType::from).collect(),
            total_items: page.total_items,
        })
    }

    /// A single post by id
    async fn post(&self, ctx: &Context<'_>, id: ID) -> Result<PostType> {
        let auth = ctx.data::<AuthContext>()?;
        auth.require().map_err(to_gql_error)?;

        let pool = ctx.data::<DbPool>()?;
        let conn = pool.get().map_err(|e| to_gql_error(e.into()))?;

        let post = feed::get_post(&conn, &id).map_err(to_gql_error)?;
        Ok(post.into())
    }

    /// The currently authenticated user
    async fn user(&self, ctx: &Context<'_>) -> Result<UserType> {
        let auth = ctx.data::<AuthContext>()?;
        let user_id = auth.require().map_err(to_gql_error)?;

        let pool = ctx.data::<DbPool>()?;
        let conn = pool.get().map_err(|e| to_gql_error(e.into()))?;

        let user = accounts::load_user(&conn, user_id).map_err(to_gql_error)?;
        let posts = feed::posts_by_creator(&conn, user_id).map_err(to_gql_error)?;

        Ok(UserType::from_user(user, posts))
    }
}
