pub mod actors;
pub mod config;
pub mod error;
pub mod logger;
pub mod models;

pub use error::DashboardError;
