//! The space-filling-curve key: a root-anchored, fixed-width, zero-padded
//! path through either an octree (`Morton`) or a tetree (`Tetree`)
//! refinement hierarchy.
//!
//! Zero-padding unused deeper levels means a plain numeric comparison of
//! the packed value (MSB-first) already yields the correct total SFC
//! order across keys of differing depth: an ancestor's packed value is
//! always numerically smaller than any of its descendants', since they
//! share the ancestor's prefix and the descendant has additional nonzero
//! bits in the suffix.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use luciferase_error::{LuciferaseError, Result};
use serde::{Deserialize, Serialize};

use crate::bey_tables::child_cube_and_type;
use crate::morton;
use crate::perm::{type_for_ordering, NUM_TYPES};
use crate::tet::{Tet, MAX_LEVEL};

/// Which refinement hierarchy a key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyKind {
    Morton,
    Tetree,
}

/// A single key in either SFC variant. Both carry enough information
/// (level plus packed path) to compute `parent`/`child`/total ordering
/// without consulting a node store.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum SFCKey {
    Morton { bits: u64, level: u8 },
    Tetree { low: u64, high: u64, level: u8 },
}

impl SFCKey {
    /// The level-0 root key for the requested variant.
    #[must_use]
    pub const fn root(kind: KeyKind) -> Self {
        match kind {
            KeyKind::Morton => Self::Morton { bits: 0, level: 0 },
            KeyKind::Tetree => Self::Tetree {
                low: 0,
                high: 0,
                level: 0,
            },
        }
    }

    #[must_use]
    pub const fn kind(&self) -> KeyKind {
        match self {
            Self::Morton { .. } => KeyKind::Morton,
            Self::Tetree { .. } => KeyKind::Tetree,
        }
    }

    #[must_use]
    pub const fn level(&self) -> u8 {
        match self {
            Self::Morton { level, .. } | Self::Tetree { level, .. } => *level,
        }
    }

    fn tetree_packed(low: u64, high: u64) -> u128 {
        (u128::from(high) << 64) | u128::from(low)
    }

    fn from_tetree_packed(packed: u128, level: u8) -> Self {
        Self::Tetree {
            low: packed as u64,
            high: (packed >> 64) as u64,
            level,
        }
    }

    /// Number of bits a single level's token occupies: 3 for Morton octant
    /// bits, 6 for Tetree's (cube_id, type) pair.
    fn token_bits(&self) -> u32 {
        match self {
            Self::Morton { .. } => 3,
            Self::Tetree { .. } => 6,
        }
    }

    /// Extract the token at 1-indexed `at_level` (0 for the implicit root
    /// token, which a Tetree key treats as type 0, cube_id 0).
    fn token_at(&self, at_level: u8) -> u64 {
        if at_level == 0 {
            return 0;
        }
        match self {
            Self::Morton { bits, .. } => u64::from(morton::token_at_level(*bits, at_level)),
            Self::Tetree { low, high, .. } => {
                let packed = Self::tetree_packed(*low, *high);
                let shift = (u32::from(MAX_LEVEL) - u32::from(at_level)) * 6;
                ((packed >> shift) & 0x3F) as u64
            }
        }
    }

    /// The tetree type encoded by the deepest token (0, the root type, if
    /// `level == 0`).
    fn current_tetree_type(&self) -> u8 {
        (self.token_at(self.level()) & 0b111) as u8
    }

    /// The child key reached by descending one level via child index `i`.
    ///
    /// For `Morton`, `i` is the 0..8 octant index directly. For `Tetree`,
    /// `i` is the 0..8 Bey child index, resolved against the current
    /// tetrahedron type via the same refinement table
    /// [`crate::tet::Tet::child`] uses.
    ///
    /// # Errors
    /// Returns an error if `i >= 8` or the key is already at
    /// [`MAX_LEVEL`].
    pub fn child(&self, i: u8) -> Result<Self> {
        match self {
            Self::Tetree { .. } => self.child_of_type(i, self.current_tetree_type()),
            Self::Morton { .. } => self.child_of_type(i, 0),
        }
    }

    /// Like [`Self::child`], but for `Tetree` keys the parent's type is
    /// given explicitly rather than read off `self` via
    /// [`Self::current_tetree_type`]. [`Self::child`] is `child_of_type(i,
    /// self.current_tetree_type())`; [`Self::locate`] uses this directly so
    /// its first descent step can seed a root type other than 0 without
    /// [`Self::current_tetree_type`]'s implicit-root-is-type-0 assumption.
    fn child_of_type(&self, i: u8, parent_type: u8) -> Result<Self> {
        if i >= 8 {
            return Err(LuciferaseError::invalid_coordinate(format!(
                "child index {i} out of range 0..8"
            )));
        }
        if self.level() >= MAX_LEVEL {
            return Err(LuciferaseError::invalid_coordinate(
                "cannot refine past max_level",
            ));
        }
        match self {
            Self::Morton { bits, level } => {
                let new_level = level + 1;
                let shift = (u32::from(MAX_LEVEL) - u32::from(new_level)) * 3;
                let new_bits = bits | (u64::from(i) << shift);
                Ok(Self::Morton {
                    bits: new_bits,
                    level: new_level,
                })
            }
            Self::Tetree { low, high, level } => {
                let (cube_id, child_type) = child_cube_and_type(parent_type, i);
                let token = (u64::from(cube_id) << 3) | u64::from(child_type);
                let new_level = level + 1;
                let shift = (u32::from(MAX_LEVEL) - u32::from(new_level)) * 6;
                let packed = Self::tetree_packed(*low, *high) | (u128::from(token) << shift);
                Ok(Self::from_tetree_packed(packed, new_level))
            }
        }
    }

    /// The keys this key splits into when subdivided.
    ///
    /// For `Morton`, or any non-root `Tetree` key, these are the eight
    /// Bey/octant children from [`Self::child`]. The `Tetree` root is a
    /// special case: it has no type of its own (every point locates to the
    /// same zero-bit root key regardless of which of the six Kuhn simplices
    /// it falls in), so its children are the Bey children of all six types
    /// at once — 48 keys, one for each `(type, bey_index)` pair — rather
    /// than a single type's eight, which would tile only a sixth of the
    /// domain (per [`crate::bey_tables`]).
    ///
    /// # Errors
    /// Returns an error if this key is already at [`MAX_LEVEL`].
    pub fn subdivision_children(&self) -> Result<Vec<Self>> {
        if self.level() >= MAX_LEVEL {
            return Err(LuciferaseError::invalid_coordinate(
                "cannot refine past max_level",
            ));
        }
        match self {
            Self::Tetree { level, .. } if *level == 0 => {
                let mut out = Vec::with_capacity(8 * NUM_TYPES as usize);
                for t in 0..NUM_TYPES {
                    for bey_index in 0..8u8 {
                        out.push(self.child_of_type(bey_index, t)?);
                    }
                }
                Ok(out)
            }
            _ => (0..8u8).map(|i| self.child(i)).collect(),
        }
    }

    /// The parent key, with the deepest token zeroed out.
    ///
    /// # Errors
    /// Returns an error if this is already a root key.
    pub fn parent(&self) -> Result<Self> {
        if self.level() == 0 {
            return Err(LuciferaseError::invalid_coordinate(
                "root key has no parent",
            ));
        }
        match self {
            Self::Morton { bits, level } => {
                let shift = (u32::from(MAX_LEVEL) - u32::from(*level)) * 3;
                let mask = !(0x7u64 << shift);
                Ok(Self::Morton {
                    bits: bits & mask,
                    level: level - 1,
                })
            }
            Self::Tetree { low, high, level } => {
                let shift = (u32::from(MAX_LEVEL) - u32::from(*level)) * 6;
                let mask = !(0x3Fu128 << shift);
                let packed = Self::tetree_packed(*low, *high) & mask;
                Ok(Self::from_tetree_packed(packed, level - 1))
            }
        }
    }

    /// Ancestor of this key at `ancestor_level` (`<= self.level()`).
    pub fn ancestor_at(&self, ancestor_level: u8) -> Result<Self> {
        if ancestor_level > self.level() {
            return Err(LuciferaseError::invalid_coordinate(
                "ancestor_level must not exceed self.level()",
            ));
        }
        let token_bits = self.token_bits();
        match self {
            Self::Morton { bits, .. } => {
                let zero_bits = (u32::from(MAX_LEVEL) - u32::from(ancestor_level)) * token_bits;
                Ok(Self::Morton {
                    bits: (bits >> zero_bits) << zero_bits,
                    level: ancestor_level,
                })
            }
            Self::Tetree { low, high, .. } => {
                let zero_bits = (u32::from(MAX_LEVEL) - u32::from(ancestor_level)) * token_bits;
                let packed = (Self::tetree_packed(*low, *high) >> zero_bits) << zero_bits;
                Ok(Self::from_tetree_packed(packed, ancestor_level))
            }
        }
    }

    /// True if `other` is an ancestor of (or equal to) `self`.
    #[must_use]
    pub fn is_descendant_of(&self, other: &Self) -> bool {
        if self.kind() != other.kind() || other.level() > self.level() {
            return false;
        }
        matches!(self.ancestor_at(other.level()), Ok(a) if a == *other)
    }

    /// Find the key at `level` containing integer point `p`.
    ///
    /// For `Morton` this is a direct truncated bit-interleave. For
    /// `Tetree` it mirrors [`Tet::locate`]'s descent, carrying the key
    /// path alongside the geometry so the two never disagree.
    ///
    /// # Errors
    /// Returns an error if `p` lies outside the root domain or `level`
    /// exceeds [`MAX_LEVEL`].
    pub fn locate(kind: KeyKind, p: (i64, i64, i64), level: u8) -> Result<Self> {
        match kind {
            KeyKind::Morton => {
                if level > MAX_LEVEL {
                    return Err(LuciferaseError::invalid_coordinate(format!(
                        "refinement level {level} exceeds max {MAX_LEVEL}"
                    )));
                }
                let (px, py, pz) = p;
                let max = 1i64 << MAX_LEVEL;
                if px < 0 || py < 0 || pz < 0 || px >= max || py >= max || pz >= max {
                    return Err(LuciferaseError::invalid_coordinate(format!(
                        "point {p:?} outside root domain [0, {max})"
                    )));
                }
                let code = morton::encode(px as u32, py as u32, pz as u32);
                Ok(Self::Morton {
                    bits: morton::truncate_to_level(code, level),
                    level,
                })
            }
            KeyKind::Tetree => {
                let (px, py, pz) = p;
                let root_type = type_for_ordering([px, py, pz]);
                let mut key = Self::root(KeyKind::Tetree);
                let mut tet = Tet::root_of_type(root_type)?;
                let mut parent_type = root_type;
                for _ in 0..level {
                    let mut found = None;
                    for bey_index in 0..8u8 {
                        let child_tet = tet.child(bey_index)?;
                        if child_tet.contains(p) {
                            found = Some((key.child_of_type(bey_index, parent_type)?, child_tet));
                            break;
                        }
                    }
                    let (next_key, next_tet) = found.ok_or_else(|| {
                        LuciferaseError::invalid_coordinate(format!(
                            "point {p:?} not contained by any child of {tet:?}"
                        ))
                    })?;
                    key = next_key;
                    parent_type = next_tet.type_;
                    tet = next_tet;
                }
                Ok(key)
            }
        }
    }

    /// Lower corner of this key's cell in the integer coordinate domain.
    /// Uses only the cube-id component of each level's token, so it is
    /// identical in shape for both variants: the tetree's type bits refine
    /// which simplex of the cube a key denotes, not which cube.
    #[must_use]
    pub fn cell_anchor(&self) -> (i64, i64, i64) {
        let mut x = 0i64;
        let mut y = 0i64;
        let mut z = 0i64;
        for lvl in 1..=self.level() {
            let token = self.token_at(lvl);
            let cube_id = match self.kind() {
                KeyKind::Morton => token,
                KeyKind::Tetree => token >> 3,
            };
            let size = Tet::cell_size(lvl);
            if cube_id & 0b001 != 0 {
                x += size;
            }
            if cube_id & 0b010 != 0 {
                y += size;
            }
            if cube_id & 0b100 != 0 {
                z += size;
            }
        }
        (x, y, z)
    }

    /// Side length of this key's cell.
    #[must_use]
    pub fn cell_size(&self) -> i64 {
        Tet::cell_size(self.level())
    }

    fn sort_key(&self) -> (u128, u8) {
        match self {
            Self::Morton { bits, level } => (u128::from(*bits), *level),
            Self::Tetree { low, high, level } => (Self::tetree_packed(*low, *high), *level),
        }
    }
}

impl PartialEq for SFCKey {
    fn eq(&self, other: &Self) -> bool {
        self.kind() == other.kind() && self.sort_key() == other.sort_key()
    }
}

impl Eq for SFCKey {}

impl Hash for SFCKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind().hash(state);
        self.sort_key().hash(state);
    }
}

impl PartialOrd for SFCKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SFCKey {
    /// Packed value first (root-anchored zero padding makes this the
    /// correct total SFC order across levels), level as a tiebreaker for
    /// the degenerate case of equal packed values, which cannot occur for
    /// distinct valid keys but keeps the derivation total.
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl fmt::Display for SFCKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Morton { bits, level } => write!(f, "M{level}:{bits:016x}"),
            Self::Tetree { low, high, level } => write!(f, "T{level}:{high:016x}{low:016x}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn morton_child_parent_round_trips() {
        let root = SFCKey::root(KeyKind::Morton);
        for i in 0..8u8 {
            let child = root.child(i).unwrap();
            assert_eq!(child.parent().unwrap(), root);
            assert_eq!(child.level(), 1);
        }
    }

    #[test]
    fn tetree_child_parent_round_trips() {
        let root = SFCKey::root(KeyKind::Tetree);
        for i in 0..8u8 {
            let child = root.child(i).unwrap();
            assert_eq!(child.parent().unwrap(), root);
        }
        // Descend a second level from a non-root-type child too.
        let child = root.child(3).unwrap();
        for i in 0..8u8 {
            let grandchild = child.child(i).unwrap();
            assert_eq!(grandchild.parent().unwrap(), child);
        }
    }

    #[test]
    fn ancestor_always_sorts_before_descendant() {
        let root = SFCKey::root(KeyKind::Tetree);
        let child = root.child(4).unwrap();
        let grandchild = child.child(2).unwrap();
        assert!(root < child);
        assert!(child < grandchild);
        assert!(root < grandchild);
    }

    #[test]
    fn distinct_siblings_compare_consistently_with_token_order() {
        let root = SFCKey::root(KeyKind::Morton);
        let mut children: Vec<_> = (0..8u8).map(|i| root.child(i).unwrap()).collect();
        let sorted = {
            let mut c = children.clone();
            c.sort();
            c
        };
        children.sort_by_key(|k| match k {
            SFCKey::Morton { bits, .. } => *bits,
            SFCKey::Tetree { .. } => unreachable!(),
        });
        assert_eq!(children, sorted);
    }

    #[test]
    fn is_descendant_of_respects_level_and_kind() {
        let root = SFCKey::root(KeyKind::Tetree);
        let child = root.child(1).unwrap();
        assert!(child.is_descendant_of(&root));
        assert!(!root.is_descendant_of(&child));
        let morton_root = SFCKey::root(KeyKind::Morton);
        assert!(!child.is_descendant_of(&morton_root));
    }

    #[test]
    fn locate_agrees_between_morton_and_tetree_at_level_zero() {
        let p = (12345, 6789, 1);
        assert_eq!(SFCKey::locate(KeyKind::Morton, p, 0).unwrap(), SFCKey::root(KeyKind::Morton));
        assert_eq!(SFCKey::locate(KeyKind::Tetree, p, 0).unwrap(), SFCKey::root(KeyKind::Tetree));
    }

    #[test]
    fn locate_deeper_level_is_descendant_of_shallower() {
        let p = (500_000, 1_234_567, 42);
        let shallow = SFCKey::locate(KeyKind::Tetree, p, 3).unwrap();
        let deep = SFCKey::locate(KeyKind::Tetree, p, 10).unwrap();
        assert!(deep.is_descendant_of(&shallow));
    }

    #[test]
    fn cell_anchor_matches_located_tet() {
        let p = (3_000_000, 1_500_000, 42);
        for level in 1..=6u8 {
            let key = SFCKey::locate(KeyKind::Tetree, p, level).unwrap();
            let tet = Tet::locate(p, level).unwrap();
            assert_eq!(key.cell_anchor(), (tet.x, tet.y, tet.z));
            assert_eq!(key.cell_size(), Tet::cell_size(level));
        }
    }

    #[test]
    fn hash_matches_eq() {
        use std::collections::HashSet;
        let root = SFCKey::root(KeyKind::Tetree);
        let mut set = HashSet::new();
        set.insert(root);
        assert!(set.contains(&SFCKey::root(KeyKind::Tetree)));
    }

}
