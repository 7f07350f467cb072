pub mod api;
pub mod config;
pub mod extractors;
pub mod models;
pub mod resolver;
pub mod utils;
