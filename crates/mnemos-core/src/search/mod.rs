//! Search: the Vector Index and the pure keyword-overlap scorer that feed
//! the retrieval engine's strategies.

mod keyword;
mod vector;

pub use keyword::keyword_overlap_score;
#[cfg(feature = "vector-search")]
pub use vector::HnswIndex;
pub use vector::{LinearIndex, Result, VectorIndex, VectorSearchError};
