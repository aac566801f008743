pub mod hasher;
pub mod indexer;

pub use hasher::SecretHasher;
pub use indexer::DeterministicIndexer;
