pub mod api;
pub mod clients;
pub mod config;
pub mod data;
pub mod error;
pub mod types;

pub use error::{AppError, Result};
