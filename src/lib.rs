pub mod api;
pub mod config;
pub mod hosts;
pub mod humanize;
pub mod ingest;
pub mod observability;
pub mod store;
pub mod upload;
