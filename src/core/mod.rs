//! Core business logic abstractions

pub mod error;
pub mod log;
pub mod model;
pub mod price;

// Re-export main types for cleaner imports
pub use error::AppError;
pub use model::{Holding, PerformanceRow, PortfolioValuation, PriceQuote};
pub use price::{FetchError, PriceValidator, QuoteProvider, SourcePrice};
