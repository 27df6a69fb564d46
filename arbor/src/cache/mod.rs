pub mod outcome;
pub mod service;

pub use outcome::CacheOutcome;
pub use service::CacheService;
