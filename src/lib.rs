// Library exports for Quill
// This allows integration tests and external code to use Quill modules

pub mod accounts;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod feed;
pub mod graphql;
pub mod notify;
pub mod routes;
pub mod state;
pub mod storage;
