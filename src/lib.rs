pub mod auth;
pub mod config;
pub mod context;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod policy;
pub mod routes;
pub mod services;
pub mod state;

pub mod cli;

pub use routes::app;
pub use state::AppState;
