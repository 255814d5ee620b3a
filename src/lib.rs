pub mod config;
pub mod constants;
pub mod error;
pub mod fetch;
pub mod loader;
pub mod services;

pub use error::ErrorInfo;
