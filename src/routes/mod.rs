pub mod auth;
pub mod events;
pub mod feed;
pub mod graphql;
pub mod images;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;

/// The full application router: REST, GraphQL, image serving, events.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(feed::router())
        .merge(graphql::router())
        .merge(events::router())
        .route("/images/{file}", get(images::serve))
}
