pub mod config;
pub mod error;
pub mod exchange;
pub mod sanitize;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use exchange::{CompletionClient, MarketDataSource};
pub use sanitize::sanitize_ascii;
pub use types::*;
