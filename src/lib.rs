pub mod cache;
pub mod config;
pub mod extract;
pub mod fetcher;
pub mod models;
pub mod scheduler;
pub mod utils;
pub mod web;

// Re-export commonly used types
pub use cache::SnapshotCache;
pub use config::AppConfig;
pub use extract::{ExtractPipeline, Extraction, SourceDocument};
pub use fetcher::{HttpFetcher, StockFetcher};
pub use models::{CacheRecord, Category, Item, StockSnapshot, WeatherState};
pub use scheduler::{RefreshOutcome, RefreshScheduler, RefreshStatus};
pub use utils::error::AppError;

pub type Result<T> = std::result::Result<T, AppError>;
