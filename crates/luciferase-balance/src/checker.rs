//! Local 2:1 refinement-level violation detection (§4.6).

use luciferase_geometry::SFCKey;

/// A local cell whose level differs from an adjacent ghost cell's level by
/// more than one, violating the 2:1 balance invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceViolation {
    pub local_key: SFCKey,
    pub ghost_key: SFCKey,
    pub local_level: u8,
    pub ghost_level: u8,
    pub source_rank: u32,
}

impl BalanceViolation {
    /// How many levels the ghost side must refine to restore balance.
    #[must_use]
    pub fn levels(&self) -> u8 {
        self.ghost_level.abs_diff(self.local_level).saturating_sub(1)
    }
}

/// Compares a partition's local boundary cells against the ghost cells
/// abutting them, producing one [`BalanceViolation`] per pair whose levels
/// differ by more than one (§4.6 Invariant).
#[derive(Debug, Default, Clone, Copy)]
pub struct TwoOneBalanceChecker;

impl TwoOneBalanceChecker {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// `boundary` pairs a local leaf key with the rank-tagged ghost key
    /// abutting it. Only pairs whose level difference exceeds one are
    /// reported; a difference of zero or one is within tolerance.
    #[must_use]
    pub fn check(&self, boundary: &[(SFCKey, SFCKey, u32)]) -> Vec<BalanceViolation> {
        boundary
            .iter()
            .filter_map(|(local_key, ghost_key, source_rank)| {
                let local_level = local_key.level();
                let ghost_level = ghost_key.level();
                (local_level.abs_diff(ghost_level) > 1).then(|| BalanceViolation {
                    local_key: *local_key,
                    ghost_key: *ghost_key,
                    local_level,
                    ghost_level,
                    source_rank: *source_rank,
                })
            })
            .collect()
    }
}
