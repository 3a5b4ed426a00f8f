pub mod mutations;
pub mod queries;
pub mod schema;
pub mod types;

use std::path::PathBuf;

use async_graphql::{Error as GqlError, ErrorExtensions, Value};

use crate::error::AppError;

pub use schema::{build_schema, BlogSchema};

/// Images directory handed to GraphQL resolvers through request data.
#[derive(Clone)]
pub struct ImagesDir(pub PathBuf);

/// Translate an operation failure into the GraphQL error envelope:
/// a human message plus a numeric `code` extension, and the full violation
/// list for validation failures.
pub(crate) fn to_gql_error(err: AppError) -> GqlError {
    let code = err.status_code().as_u16() as i32;

    let message = match &err {
        AppError::Database(e) => {
            tracing::error!("Database error: {}", e);
            "Internal server error".to_string()
        }
        AppError::Pool(e) => {
            tracing::error!("Pool error: {}", e);
            "Internal server error".to_string()
        }
        AppError::Internal(msg) => {
            tracing::error!("Internal error: {}", msg);
            "Internal server error".to_string()
        }
        other => other.to_string(),
    };

    let data = match &err {
        AppError::Validation(violations) => Some(Value::List(
            violations
                .iter()
                .map(|v| Value::String(format!("{}: {}", v.field, v.message)))
                .collect(),
        )),
        _ => None,
    };

    GqlError::new(message).extend_with(|_, ext| {
        ext.set("code", code);
        if let Some(data) = data.clone() {
            ext.set("data", data);
        }
    })
}
