pub mod adapter;
pub mod browser;
pub mod compare;
pub mod config;
pub mod models;
pub mod orchestrator;
pub mod utils;

// Re-export commonly used types
pub use utils::error::AppError;

pub type Result<T> = std::result::Result<T, AppError>;
