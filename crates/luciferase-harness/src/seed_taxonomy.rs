//! Seed taxonomy for deterministic property and soak testing.
//!
//! Derives distinct purpose-specific seeds from a single root seed using
//! `H(root || purpose_tag || scope_id)` where `H` is xxh3_64, so that two
//! tests sharing a root seed but different scopes never draw from the same
//! stream, while a single test re-run with the same root and scope always
//! reproduces identical derived seeds.

use xxhash_rust::xxh3::xxh3_64;

const TAG_POSITIONS: &[u8] = b"positions";
const TAG_FAULT_INJECTION: &[u8] = b"fault-injection";
const TAG_BUTTERFLY_RANKS: &[u8] = b"butterfly-ranks";
const TAG_FUZZ: &[u8] = b"fuzz";

/// A set of deterministically derived seeds from a single root test seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedTaxonomy {
    pub root: u64,
    /// Seeds entity position generation (uniform, clustered, colocated).
    pub positions: u64,
    /// Seeds which partitions/timing a fault-injection harness picks.
    pub fault_injection: u64,
    /// Seeds which rank an unavailable-peer simulation picks in butterfly tests.
    pub butterfly_ranks: u64,
    /// Seeds arbitrary fuzz input generation.
    pub fuzz: u64,
}

impl SeedTaxonomy {
    #[must_use]
    pub fn derive(root_seed: u64, scope_id: &str) -> Self {
        Self {
            root: root_seed,
            positions: derive_seed(root_seed, TAG_POSITIONS, scope_id),
            fault_injection: derive_seed(root_seed, TAG_FAULT_INJECTION, scope_id),
            butterfly_ranks: derive_seed(root_seed, TAG_BUTTERFLY_RANKS, scope_id),
            fuzz: derive_seed(root_seed, TAG_FUZZ, scope_id),
        }
    }
}

fn derive_seed(root_seed: u64, purpose_tag: &[u8], scope_id: &str) -> u64 {
    let mut buf = Vec::with_capacity(8 + purpose_tag.len() + scope_id.len());
    buf.extend_from_slice(&root_seed.to_le_bytes());
    buf.extend_from_slice(purpose_tag);
    buf.extend_from_slice(scope_id.as_bytes());
    xxh3_64(&buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivation_is_deterministic() {
        let a = SeedTaxonomy::derive(0xDEAD_BEEF, "subdivision_scenario");
        let b = SeedTaxonomy::derive(0xDEAD_BEEF, "subdivision_scenario");
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_scopes_diverge() {
        let a = SeedTaxonomy::derive(0xDEAD_BEEF, "scope_a");
        let b = SeedTaxonomy::derive(0xDEAD_BEEF, "scope_b");
        assert_ne!(a.positions, b.positions);
    }

    #[test]
    fn purposes_within_one_scope_are_distinct() {
        let t = SeedTaxonomy::derive(0xCAFE_BABE, "scope");
        let seeds = [t.root, t.positions, t.fault_injection, t.butterfly_ranks, t.fuzz];
        for i in 0..seeds.len() {
            for j in (i + 1)..seeds.len() {
                assert_ne!(seeds[i], seeds[j]);
            }
        }
    }
}
