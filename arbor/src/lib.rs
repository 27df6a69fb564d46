pub mod cache;
pub mod errors;
pub mod ports;
pub mod users;

pub use cache::{CacheOutcome, CacheService};
pub use errors::{classify, AppError, AppResult, ClassifiedError, ErrorKind};
pub use ports::{KeyValueStore, RepositoryError};
