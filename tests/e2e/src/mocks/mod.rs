mod fixtures;

pub use fixtures::{ingest, HashingEmbeddingProvider, TestDataFactory};
