//! Integer tetrahedron geometry: the six Kuhn tetrahedra per cube, Bey
//! refinement into eight children, point location and containment.
//!
//! Coordinates live in a fixed integer domain `[0, 2^MAX_LEVEL)` per axis,
//! the same convention `Morton`-keyed octrees use, so the two SFC variants
//! in [`crate::key`] can share a coordinate system. World-space floating
//! point positions are mapped into this domain by the index crate.

use luciferase_error::{LuciferaseError, Result};
use luciferase_types::Vec3f;

use crate::bey_tables::{child_cube_and_type, parent_type_and_index};
use crate::perm::{axis_bit, type_for_ordering, AXIS_PERMS, NUM_TYPES};

/// Deepest level the index will refine to; matches `IndexConfig::max_refinement_level`'s
/// ceiling and the 21-level budget of a 126-bit Tetree key (6 bits/level).
pub const MAX_LEVEL: u8 = 21;

/// Side length of the level-0 root cube, in integer coordinate units.
pub const ROOT_EXTENT: i64 = 1 << MAX_LEVEL;

/// One of the six axis-order tetrahedron types occupying a cube.
pub type TetType = u8;

/// An integer-coordinate tetrahedron: one of the six Kuhn simplices of the
/// axis-aligned cube `[x, x+h) x [y, y+h) x [z, z+h)` at `level`, where
/// `h = cell_size(level)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tet {
    pub x: i64,
    pub y: i64,
    pub z: i64,
    pub level: u8,
    pub type_: TetType,
}

impl Tet {
    /// The level-0 tetrahedron of type 0. Only one of the six root Kuhn
    /// simplices of the root cube; callers locating an arbitrary point must
    /// pick the matching one with [`Tet::root_of_type`] instead.
    #[must_use]
    pub const fn root() -> Self {
        Self {
            x: 0,
            y: 0,
            z: 0,
            level: 0,
            type_: 0,
        }
    }

    /// The level-0 tetrahedron of the given type: one of the six Kuhn
    /// simplices that partition the root cube.
    ///
    /// # Errors
    /// Returns an error if `type_ >= 6`.
    pub fn root_of_type(type_: TetType) -> Result<Self> {
        Self::new(0, 0, 0, 0, type_)
    }

    /// Side length of the cube this tetrahedron is cut from.
    #[must_use]
    pub fn cell_size(level: u8) -> i64 {
        ROOT_EXTENT >> level
    }

    fn new(x: i64, y: i64, z: i64, level: u8, type_: TetType) -> Result<Self> {
        if type_ >= NUM_TYPES {
            return Err(LuciferaseError::invalid_coordinate(format!(
                "tetrahedron type {type_} out of range 0..6"
            )));
        }
        if level > MAX_LEVEL {
            return Err(LuciferaseError::invalid_coordinate(format!(
                "refinement level {level} exceeds max {MAX_LEVEL}"
            )));
        }
        Ok(Self { x, y, z, level, type_ })
    }

    /// The four vertices of this tetrahedron, in the integer coordinate
    /// domain. `v3` is always the anchor plus `(h, h, h)`.
    #[must_use]
    pub fn vertices(&self) -> [(i64, i64, i64); 4] {
        let h = Self::cell_size(self.level);
        let [a, b, c] = AXIS_PERMS[self.type_ as usize];
        let anchor = [self.x, self.y, self.z];
        let mut v1 = anchor;
        v1[a as usize] += h;
        let mut v2 = v1;
        v2[b as usize] += h;
        let v3 = [self.x + h, self.y + h, self.z + h];
        let _ = c; // c only shapes the ordering predicate, not v3 (always anchor + (h,h,h))
        [
            (anchor[0], anchor[1], anchor[2]),
            (v1[0], v1[1], v1[2]),
            (v2[0], v2[1], v2[2]),
            (v3[0], v3[1], v3[2]),
        ]
    }

    /// Integer point-in-tetrahedron test: `p` lies in this tetrahedron's
    /// half-open cube and satisfies the local ordering predicate
    /// `local_a >= local_b >= local_c`.
    #[must_use]
    pub fn contains(&self, p: (i64, i64, i64)) -> bool {
        let h = Self::cell_size(self.level);
        let (px, py, pz) = p;
        if px < self.x || px >= self.x + h {
            return false;
        }
        if py < self.y || py >= self.y + h {
            return false;
        }
        if pz < self.z || pz >= self.z + h {
            return false;
        }
        let local = [px - self.x, py - self.y, pz - self.z];
        let [a, b, c] = AXIS_PERMS[self.type_ as usize];
        local[a as usize] >= local[b as usize] && local[b as usize] >= local[c as usize]
    }

    /// World-space containment, for callers working in float coordinates
    /// already mapped into the integer domain by the caller.
    #[must_use]
    pub fn contains_world(&self, p: Vec3f, to_int: impl Fn(Vec3f) -> (i64, i64, i64)) -> bool {
        self.contains(to_int(p))
    }

    /// Bey child `bey_index` (0..8) of this tetrahedron.
    ///
    /// # Errors
    /// Returns an error if `bey_index >= 8` or refining would exceed
    /// [`MAX_LEVEL`].
    pub fn child(&self, bey_index: u8) -> Result<Self> {
        if bey_index >= 8 {
            return Err(LuciferaseError::invalid_coordinate(format!(
                "bey child index {bey_index} out of range 0..8"
            )));
        }
        if self.level >= MAX_LEVEL {
            return Err(LuciferaseError::invalid_coordinate(
                "cannot refine past max_level",
            ));
        }
        let half = Self::cell_size(self.level + 1);
        let (cube_id, child_type) = child_cube_and_type(self.type_, bey_index);
        let dx = if cube_id & axis_bit(0) != 0 { half } else { 0 };
        let dy = if cube_id & axis_bit(1) != 0 { half } else { 0 };
        let dz = if cube_id & axis_bit(2) != 0 { half } else { 0 };
        Self::new(self.x + dx, self.y + dy, self.z + dz, self.level + 1, child_type)
    }

    /// All eight Bey children, in index order.
    pub fn children(&self) -> Result<[Self; 8]> {
        let mut out = [Self::root(); 8];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.child(i as u8)?;
        }
        Ok(out)
    }

    /// The parent tetrahedron, recovered by searching the Bey table for the
    /// `(cube_id, type)` pair this tetrahedron occupies within its parent
    /// cube.
    pub fn parent(&self) -> Result<Self> {
        if self.level == 0 {
            return Err(LuciferaseError::invalid_coordinate(
                "root tetrahedron has no parent",
            ));
        }
        let half = Self::cell_size(self.level);
        // cube_id bit for each axis: whether this tet's anchor is in the
        // upper half of its parent's cube along that axis.
        let px = self.x & !(half * 2 - 1);
        let py = self.y & !(half * 2 - 1);
        let pz = self.z & !(half * 2 - 1);
        let cube_id = (if self.x - px != 0 { axis_bit(0) } else { 0 })
            | (if self.y - py != 0 { axis_bit(1) } else { 0 })
            | (if self.z - pz != 0 { axis_bit(2) } else { 0 });
        let (parent_type, _bey_index) = parent_type_and_index(cube_id, self.type_)
            .ok_or_else(|| LuciferaseError::invalid_coordinate("no parent for (cube_id, type)"))?;
        Self::new(px, py, pz, self.level - 1, parent_type)
    }

    /// Locate the leaf tetrahedron at `level` containing integer point `p`.
    ///
    /// The root cube is one of six Kuhn simplices depending on `p`'s own
    /// coordinate ordering ([`type_for_ordering`]); descent then picks, at
    /// each step, the Bey child whose own geometry actually contains the
    /// point (ties broken by the smaller Bey index), so
    /// `locate(p, L).contains(p)` holds by construction for every point in
    /// the root domain, not just the `x >= y >= z` octant.
    pub fn locate(p: (i64, i64, i64), level: u8) -> Result<Self> {
        if level > MAX_LEVEL {
            return Err(LuciferaseError::invalid_coordinate(format!(
                "refinement level {level} exceeds max {MAX_LEVEL}"
            )));
        }
        let (px, py, pz) = p;
        if px < 0 || py < 0 || pz < 0 || px >= ROOT_EXTENT || py >= ROOT_EXTENT || pz >= ROOT_EXTENT {
            return Err(LuciferaseError::invalid_coordinate(format!(
                "point {p:?} outside root domain [0, {ROOT_EXTENT})"
            )));
        }
        let mut current = Self::root_of_type(type_for_ordering([px, py, pz]))?;
        for _ in 0..level {
            let mut found = None;
            for bey_index in 0..8u8 {
                let child = current.child(bey_index)?;
                if child.contains(p) {
                    found = Some(child);
                    break;
                }
            }
            current = found.ok_or_else(|| {
                LuciferaseError::invalid_coordinate(format!(
                    "point {p:?} not contained by any child of {current:?}"
                ))
            })?;
        }
        Ok(current)
    }

    /// Ancestor of this tetrahedron at `ancestor_level` (which must be `<=
    /// self.level`).
    pub fn ancestor_at(&self, ancestor_level: u8) -> Result<Self> {
        if ancestor_level > self.level {
            return Err(LuciferaseError::invalid_coordinate(
                "ancestor_level must not exceed self.level",
            ));
        }
        let mut current = *self;
        while current.level > ancestor_level {
            current = current.parent()?;
        }
        Ok(current)
    }

    /// True if `other` is an ancestor of (or equal to) `self`.
    #[must_use]
    pub fn is_descendant_of(&self, other: &Self) -> bool {
        if other.level > self.level {
            return false;
        }
        matches!(self.ancestor_at(other.level), Ok(a) if a == *other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn children_of_root_cover_root_volume() {
        let root = Tet::root();
        let children = root.children().unwrap();
        // Each child has volume h'^3 / 6 where h' = cell_size(1); eight of
        // them sum to cell_size(1)^3 * 8 / 6 = cell_size(0)^3 / 6, the
        // parent's own volume (cell_size halves per level, volume by 8).
        let h1 = Tet::cell_size(1);
        let child_vol = (h1 * h1 * h1) as f64 / 6.0;
        let total: f64 = children.iter().map(|_| child_vol).sum();
        let h0 = Tet::cell_size(0);
        let parent_vol = (h0 * h0 * h0) as f64 / 6.0;
        assert!((total - parent_vol).abs() < 1e-6);
    }

    #[test]
    fn child_parent_round_trips() {
        let root = Tet::root();
        for bey_index in 0..8u8 {
            let child = root.child(bey_index).unwrap();
            let parent = child.parent().unwrap();
            assert_eq!(parent, root, "bey_index {bey_index}");
        }
    }

    #[test]
    fn locate_result_contains_the_point() {
        let p = (12345, 543210, 999);
        for level in 0..=8u8 {
            let tet = Tet::locate(p, level).unwrap();
            assert!(tet.contains(p), "level {level}");
            assert_eq!(tet.level, level);
        }
    }

    #[test]
    fn deeper_locate_result_descends_from_shallower() {
        let p = (777_777, 2048, 4_000_000);
        let shallow = Tet::locate(p, 3).unwrap();
        let deep = Tet::locate(p, 9).unwrap();
        assert!(deep.is_descendant_of(&shallow));
    }

    #[test]
    fn vertices_far_corner_is_anchor_plus_cell_size() {
        let tet = Tet::root().child(5).unwrap();
        let h = Tet::cell_size(tet.level);
        let (_, _, _, v3) = tet.vertices();
        assert_eq!(v3, (tet.x + h, tet.y + h, tet.z + h));
    }
}
