pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod feed;
pub mod forecast;
pub mod state;
