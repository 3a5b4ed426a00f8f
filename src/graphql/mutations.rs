use std::sync::Arc;

use async_graphql::*;

use crate::accounts::{self, SignupInput};
use crate::auth::{AuthContext, Credentials};
use crate::feed::{self, NewPost, PostUpdate};
use crate::graphql::types::{PostInput, PostType, UserInput, UserType};
use crate::graphql::{to_gql_error, ImagesDir};
use crate::notify::EventHub;
use crate::state::DbPool;

/// GraphQL Mutation root
pub struct MutationRoot;

#[Object]
impl MutationRoot {
    /// Sign up a new account
    async fn create_user(&self, ctx: &Context<'_>, user_input: UserInput) -> Result<UserType> {
        let pool = ctx.data::<DbPool>()?;
        let credentials = ctx.data::<Arc<Credentials>>()?;
        let conn = pool.get().map_err(|e| to_gql_error(e.into()))?;

        let user_id = accounts::signup(
            &conn,
            credentials,
            &SignupInput {
                email: user_input.email,
                name: user_input.name,
                password: user_input.password,
            },
        )
        .map_err(to_gql_error)?;

        let user = accounts::load_user(&conn, &user_id).map_err(to_gql_error)?;
        Ok(UserType::from_user(user, Vec::new()))
    }

    /// Create a post owned by the caller
    async fn create_post(&self, ctx: &Context<'_>, post_input: PostInput) -> Result<PostType> {
        let auth = ctx.data::<AuthContext>()?;
        let pool = ctx.data::<DbPool>()?;
        let hub = ctx.data::<EventHub>()?;
        let conn = pool.get().map_err(|e| to_gql_error(e.into()))?;

        let input = NewPost {
            title: post_input.title,
            content: post_input.content,
            image_url: post_input.image_url.unwrap_or_default(),
        };

        let post = feed::create_post(&conn, auth, &input, hub).map_err(to_gql_error)?;
        Ok(post.into())
    }

    /// Edit a post; only its creator may do so
    async fn update_post(
        &self,
        ctx: &Context<'_>,
        id: ID,
        post_input: PostInput,
    ) -> Result<PostType> {
        let auth = ctx.data::<AuthContext>()?;
        let pool = ctx.data::<DbPool>()?;
        let hub = ctx.data::<EventHub>()?;
        let images_dir = ctx.data::<ImagesDir>()?;
        let conn = pool.get().map_err(|e| to_gql_error(e.into()))?;

        let input = PostUpdate {
            title: post_input.title,
            content: post_input.content,
            image_url: post_input.image_url,
        };

        let post = feed::update_post(&conn, auth, &id, &input, &images_dir.0, hub)
            .map_err(to_gql_error)?;
        Ok(post.into())
    }

    /// Delete a post and its stored image; only its creator may do so
    async fn delete_post(&self, ctx: &Context<'_>, id: ID) -> Result<bool> {
        let auth = ctx.data::<AuthContext>()?;
        let pool = ctx.data::<DbPool>()?;
        let hub = ctx.data::<EventHub>()?;
        let images_dir = ctx.data::<ImagesDir>()?;
        let conn = pool.get().map_err(|e| to_gql_error(e.into()))?;

        feed::delete_post(&conn, auth, &id, &images_dir.0, hub).map_err(to_gql_error)?;
        Ok(true)
    }

    /// Update the caller's status line
    async fn update_status(&self, ctx: &Context<'_>, status: String) -> Result<UserType> {
        let auth = ctx.data::<AuthContext>()?;
        let user_id = auth.require().map_err(to_gql_error)?;

        let pool = ctx.data::<DbPool>()?;
        let conn = pool.get().map_err(|e| to_gql_error(e.into()))?;

        accounts::set_status(&conn, user_id, &status).map_err(to_gql_error)?;

        let user = accounts::load_user(&conn, user_id).map_err(to_gql_error)?;
        let posts = feed::posts_by_creator(&conn, user_id).map_err(to_gql_error)?;
        Ok(UserType::from_user(user, posts))
    }
}
