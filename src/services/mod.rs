// Service exports
pub mod coordinator;
pub mod provider;
pub mod sources;

pub use coordinator::SearchCoordinator;
pub use provider::{ProviderRegistry, SourceError, SourceProvider};
pub use sources::{sample_records, sample_source, JsonFileSource, StaticSource};
