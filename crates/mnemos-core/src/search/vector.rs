//! Vector Index: ANN (HNSW) and exhaustive-scan implementations over
//! unit-normalized embeddings, keyed by node id.

use crate::embeddings::{cosine_similarity, normalize};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VectorSearchError {
    #[error("embedding has {got} dimensions, index expects {expected}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("backend error: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, VectorSearchError>;

/// Contract shared by the HNSW and linear backends.
pub trait VectorIndex: Send + Sync {
    fn insert(&mut self, id: &str, vector: &[f32]) -> Result<()>;
    fn remove(&mut self, id: &str) -> Result<()>;
    fn search(
        &self,
        query: &[f32],
        k: usize,
        threshold: f32,
        excluded_ids: &HashSet<String>,
    ) -> Result<Vec<(String, f32)>>;
    fn rebuild_from(&mut self, entries: &mut dyn Iterator<Item = (String, Vec<f32>)>) -> Result<()>;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn dimensions(&self) -> usize;
}

/// Exhaustive cosine scan. O(N*D) but exact; used as the `linear` config
/// option and as the correctness baseline the HNSW index is tested against.
pub struct LinearIndex {
    dimensions: usize,
    vectors: Vec<(String, Vec<f32>)>,
}

impl LinearIndex {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            vectors: Vec::new(),
        }
    }
}

impl VectorIndex for LinearIndex {
    fn insert(&mut self, id: &str, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimensions {
            return Err(VectorSearchError::DimensionMismatch {
                expected: self.dimensions,
                got: vector.len(),
            });
        }
        let mut v = vector.to_vec();
        normalize(&mut v);
        self.vectors.retain(|(existing_id, _)| existing_id != id);
        self.vectors.push((id.to_string(), v));
        Ok(())
    }

    fn remove(&mut self, id: &str) -> Result<()> {
        self.vectors.retain(|(existing_id, _)| existing_id != id);
        Ok(())
    }

    fn search(
        &self,
        query: &[f32],
        k: usize,
        threshold: f32,
        excluded_ids: &HashSet<String>,
    ) -> Result<Vec<(String, f32)>> {
        if query.len() != self.dimensions {
            return Err(VectorSearchError::DimensionMismatch {
                expected: self.dimensions,
                got: query.len(),
            });
        }
        let mut q = query.to_vec();
        normalize(&mut q);

        let mut scored: Vec<(String, f32)> = self
            .vectors
            .iter()
            .filter(|(id, _)| !excluded_ids.contains(id))
            .map(|(id, v)| (id.clone(), cosine_similarity(&q, v)))
            .filter(|(_, score)| *score >= threshold)
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }

    fn rebuild_from(&mut self, entries: &mut dyn Iterator<Item = (String, Vec<f32>)>) -> Result<()> {
        self.vectors.clear();
        for (id, vector) in entries {
            self.insert(&id, &vector)?;
        }
        Ok(())
    }

    fn len(&self) -> usize {
        self.vectors.len()
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(feature = "vector-search")]
mod hnsw {
    use super::*;
    use std::collections::HashMap;
    use usearch::{Index, IndexOptions, MetricKind, ScalarKind};

    /// HNSW over `usearch`. M=16, efConstruction=200, efSearch=max(2k, configured).
    pub struct HnswIndex {
        index: Index,
        dimensions: usize,
        ef_search_floor: usize,
        id_to_key: HashMap<String, u64>,
        key_to_id: HashMap<u64, String>,
        next_key: u64,
    }

    impl HnswIndex {
        pub fn new(dimensions: usize, m: usize, ef_construction: usize) -> Result<Self> {
            let options = IndexOptions {
                dimensions,
                metric: MetricKind::Cos,
                quantization: ScalarKind::F32,
                connectivity: m,
                expansion_add: ef_construction,
                expansion_search: ef_construction,
                multi: false,
            };
            let index = Index::new(&options).map_err(|e| VectorSearchError::Backend(e.to_string()))?;
            index
                .reserve(1024)
                .map_err(|e| VectorSearchError::Backend(e.to_string()))?;
            Ok(Self {
                index,
                dimensions,
                ef_search_floor: ef_construction,
                id_to_key: HashMap::new(),
                key_to_id: HashMap::new(),
                next_key: 0,
            })
        }
    }

    impl VectorIndex for HnswIndex {
        fn insert(&mut self, id: &str, vector: &[f32]) -> Result<()> {
            if vector.len() != self.dimensions {
                return Err(VectorSearchError::DimensionMismatch {
                    expected: self.dimensions,
                    got: vector.len(),
                });
            }
            let mut v = vector.to_vec();
            normalize(&mut v);

            self.remove(id)?;

            if self.index.size() + 1 > self.index.capacity() {
                self.index
                    .reserve(self.index.capacity() * 2 + 1)
                    .map_err(|e| VectorSearchError::Backend(e.to_string()))?;
            }

            let key = self.next_key;
            self.next_key += 1;
            self.index
                .add(key, &v)
                .map_err(|e| VectorSearchError::Backend(e.to_string()))?;
            self.id_to_key.insert(id.to_string(), key);
            self.key_to_id.insert(key, id.to_string());
            Ok(())
        }

        fn remove(&mut self, id: &str) -> Result<()> {
            if let Some(key) = self.id_to_key.remove(id) {
                self.key_to_id.remove(&key);
                let _ = self.index.remove(key);
            }
            Ok(())
        }

        fn search(
            &self,
            query: &[f32],
            k: usize,
            threshold: f32,
            excluded_ids: &HashSet<String>,
        ) -> Result<Vec<(String, f32)>> {
            if query.len() != self.dimensions {
                return Err(VectorSearchError::DimensionMismatch {
                    expected: self.dimensions,
                    got: query.len(),
                });
            }
            if self.index.size() == 0 {
                return Ok(Vec::new());
            }
            let mut q = query.to_vec();
            normalize(&mut q);

            let ef_search = self.ef_search_floor.max(2 * k);
            let _ = ef_search; // usearch tunes expansion via expansion_search at construction.

            let fetch = (k + excluded_ids.len()).max(k) * 2;
            let matches = self
                .index
                .search(&q, fetch.min(self.index.size()))
                .map_err(|e| VectorSearchError::Backend(e.to_string()))?;

            let mut out = Vec::new();
            for (key, distance) in matches.keys.iter().zip(matches.distances.iter()) {
                if let Some(id) = self.key_to_id.get(key) {
                    if excluded_ids.contains(id) {
                        continue;
                    }
                    // usearch's Cos metric returns a distance; similarity = 1 - distance.
                    let score = 1.0 - distance;
                    if score >= threshold {
                        out.push((id.clone(), score));
                    }
                }
                if out.len() >= k {
                    break;
                }
            }
            out.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
            out.truncate(k);
            Ok(out)
        }

        fn rebuild_from(
            &mut self,
            entries: &mut dyn Iterator<Item = (String, Vec<f32>)>,
        ) -> Result<()> {
            self.index.reset().map_err(|e| VectorSearchError::Backend(e.to_string()))?;
            self.id_to_key.clear();
            self.key_to_id.clear();
            self.next_key = 0;
            for (id, vector) in entries {
                self.insert(&id, &vector)?;
            }
            Ok(())
        }

        fn len(&self) -> usize {
            self.index.size()
        }

        fn dimensions(&self) -> usize {
            self.dimensions
        }
    }
}

#[cfg(feature = "vector-search")]
pub use hnsw::HnswIndex;
