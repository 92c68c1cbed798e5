pub mod allocation;
pub mod claims;
pub mod config;
pub mod directory;
pub mod error;
pub mod index;
pub mod loader;
mod mutation;
pub mod record;
pub mod segment;

#[cfg(feature = "test-helpers")]
pub mod test_helpers;

pub use config::DirectoryConfig;
pub use directory::{Directory, DirectoryStats};
pub use error::{DirectoryError, LoadError};
pub use record::UserRecord;
pub use segment::AgeBucket;
