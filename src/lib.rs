// Korean stock fair-value aggregation and screening engine.

pub mod analysis;
pub mod api;
pub mod config;
pub mod database;
pub mod models;
