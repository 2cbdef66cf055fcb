pub mod app_error;
pub mod app_state;
pub mod auth;
pub mod config;
pub mod db;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod schema;
pub mod workflow;
