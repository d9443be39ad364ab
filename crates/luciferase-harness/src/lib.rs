//! Test support: deterministic seed derivation, entity corpora, a
//! linear-scan reference index, and soak test profiles, shared across the
//! workspace's unit, property and end-to-end tests.

pub mod entity_corpus;
pub mod reference_index;
pub mod seed_taxonomy;
pub mod soak_profiles;

pub use entity_corpus::{CorpusBounds, CorpusKind, EntityCorpus};
pub use reference_index::{same_entity_set, ReferenceIndex};
pub use seed_taxonomy::SeedTaxonomy;
pub use soak_profiles::{nightly_profile, smoke_profile, SoakProfile};
