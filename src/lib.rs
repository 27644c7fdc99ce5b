pub mod api;
pub mod config;
pub mod error;
pub mod features;
pub mod logging;
pub mod models;
pub mod state;
