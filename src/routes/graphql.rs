use async_graphql::http::{playground_source, GraphQLPlaygroundConfig};
use axum::extract::State;
use axum::response::{Html, IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;

use crate::auth::AuthContext;
use crate::graphql::ImagesDir;
use crate::state::AppState;

/// GraphQL endpoint handler. The request's `AuthContext` is derived by the
/// same gate as the REST surface and handed to resolvers as request data.
async fn graphql_handler(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(req): Json<async_graphql::Request>,
) -> Json<async_graphql::Response> {
    let request = req
        .data(state.db.clone())
        .data(state.credentials.clone())
        .data(state.events.clone())
        .data(state.config.feed.clone())
        .data(ImagesDir(state.config.images_path().clone()))
        .data(ctx);

    let response = state.graphql_schema.execute(request).await;
    Json(response)
}

/// GraphQL Playground UI (development tool)
async fn graphql_playground() -> impl IntoResponse {
    Html(playground_source(GraphQLPlaygroundConfig::new("/graphql")))
}

/// GraphQL router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/graphql", post(graphql_handler))
        .route("/graphql/playground", get(graphql_playground))
}
