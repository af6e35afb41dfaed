pub mod config;
pub mod error;
pub mod keys;
pub mod period;

pub use config::Config;
pub use error::*;
pub use keys::*;
pub use period::*;
