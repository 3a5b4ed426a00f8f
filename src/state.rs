use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::auth::Credentials;
use crate::config::Config;
use crate::graphql::BlogSchema;
use crate::notify::EventHub;

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
    pub credentials: Arc<Credentials>,
    pub events: EventHub,
    pub graphql_schema: BlogSchema,
}
