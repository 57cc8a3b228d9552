pub mod bitget;
pub mod fetcher;
pub mod lifecycle;

pub use bitget::BitgetClient;
pub use fetcher::MarketDataFetcher;
pub use lifecycle::{Engine, EngineHandle};
