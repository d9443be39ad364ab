//! Deterministic entity corpora for index compliance scenarios (§8).
//!
//! Each [`CorpusKind`] reproduces one of the distribution shapes the
//! concrete end-to-end scenarios exercise: entities spread enough to force
//! subdivision, entities colocated tightly enough to suppress it, and large
//! uniform corpora for range-query parity against a linear-scan baseline.

use luciferase_types::{EntityId, Vec3f};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Shape of a generated entity corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorpusKind {
    /// Positions drawn uniformly at random within `bounds`.
    UniformRandom,
    /// All positions identical, to exercise the single-child-bucket abort.
    Colocated,
    /// Positions clustered tightly around a handful of centers.
    Clustered { cluster_count: usize },
}

/// One axis-aligned region entities are generated within.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorpusBounds {
    pub min: Vec3f,
    pub max: Vec3f,
}

/// A deterministically generated `(id, position)` corpus.
#[derive(Debug, Clone)]
pub struct EntityCorpus {
    pub entries: Vec<(EntityId, Vec3f)>,
}

impl EntityCorpus {
    #[must_use]
    pub fn generate(kind: CorpusKind, bounds: CorpusBounds, count: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let entries = match kind {
            CorpusKind::UniformRandom => (0..count)
                .map(|i| (EntityId::new(i as u64), random_point(&mut rng, bounds)))
                .collect(),
            CorpusKind::Colocated => {
                let point = random_point(&mut rng, bounds);
                (0..count).map(|i| (EntityId::new(i as u64), point)).collect()
            }
            CorpusKind::Clustered { cluster_count } => {
                let cluster_count = cluster_count.max(1);
                let centers: Vec<Vec3f> = (0..cluster_count).map(|_| random_point(&mut rng, bounds)).collect();
                let spread = (bounds.max.x - bounds.min.x).abs() * 0.02;
                (0..count)
                    .map(|i| {
                        let center = centers[i % centers.len()];
                        let jitter = Vec3f::new(
                            rng.gen_range(-spread..=spread),
                            rng.gen_range(-spread..=spread),
                            rng.gen_range(-spread..=spread),
                        );
                        (EntityId::new(i as u64), clamp_to_bounds(center + jitter, bounds))
                    })
                    .collect()
            }
        };
        Self { entries }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn random_point(rng: &mut StdRng, bounds: CorpusBounds) -> Vec3f {
    Vec3f::new(
        rng.gen_range(bounds.min.x..=bounds.max.x),
        rng.gen_range(bounds.min.y..=bounds.max.y),
        rng.gen_range(bounds.min.z..=bounds.max.z),
    )
}

fn clamp_to_bounds(p: Vec3f, bounds: CorpusBounds) -> Vec3f {
    Vec3f::new(
        p.x.clamp(bounds.min.x, bounds.max.x),
        p.y.clamp(bounds.min.y, bounds.max.y),
        p.z.clamp(bounds.min.z, bounds.max.z),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> CorpusBounds {
        CorpusBounds {
            min: Vec3f::new(0.0, 0.0, 0.0),
            max: Vec3f::new(1024.0, 1024.0, 1024.0),
        }
    }

    #[test]
    fn same_seed_reproduces_same_corpus() {
        let a = EntityCorpus::generate(CorpusKind::UniformRandom, bounds(), 100, 7);
        let b = EntityCorpus::generate(CorpusKind::UniformRandom, bounds(), 100, 7);
        assert_eq!(
            a.entries.iter().map(|(_, p)| *p).collect::<Vec<_>>(),
            b.entries.iter().map(|(_, p)| *p).collect::<Vec<_>>()
        );
    }

    #[test]
    fn colocated_corpus_has_one_distinct_position() {
        let corpus = EntityCorpus::generate(CorpusKind::Colocated, bounds(), 5, 1);
        let first = corpus.entries[0].1;
        assert!(corpus.entries.iter().all(|(_, p)| *p == first));
    }

    #[test]
    fn uniform_corpus_stays_within_bounds() {
        let b = bounds();
        let corpus = EntityCorpus::generate(CorpusKind::UniformRandom, b, 200, 42);
        assert!(corpus.entries.iter().all(|(_, p)| {
            p.x >= b.min.x && p.x <= b.max.x && p.y >= b.min.y && p.y <= b.max.y && p.z >= b.min.z && p.z <= b.max.z
        }));
    }
}
