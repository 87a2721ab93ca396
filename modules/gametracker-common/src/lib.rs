pub mod types;
pub mod mode;
pub mod config;
pub mod error;

pub use types::*;
pub use mode::*;
pub use config::{Config, LogFormat};
pub use error::GameTrackerError;
