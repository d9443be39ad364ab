//! Bey refinement: the combinatorial part of splitting one tetrahedron into
//! eight children.
//!
//! Each tetrahedron type `t` (a permutation `(a, b, c)` of the axes, see
//! [`crate::perm`]) occupies four of its cube's eight octants: the two
//! "corner" octants `0` and `7`, plus two "prism" octants (`axis_bit(a)` and
//! `axis_bit(a) | axis_bit(b)`) which are not themselves Kuhn tetrahedra but
//! triangular prisms, each splitting into three further Kuhn tetrahedra of
//! differing type. That yields the eight Bey children.
//!
//! `CHILD_TABLE[parent_type][bey_index]` gives each child's `(cube_id,
//! child_type)`. `parent_type_of` inverts it by direct search: with only
//! 6 types x 8 indices to scan, a maintained inverse table is not worth the
//! risk of it drifting out of sync with the forward one.

use crate::perm::{axis_bit, rotate_left, rotate_right, swap_ab, swap_bc, AXIS_PERMS};

/// `(cube_id, child_type)` for each of the 8 Bey children of a tetrahedron.
pub type ChildRow = [(u8, u8); 8];

fn child_row(parent_type: u8) -> ChildRow {
    let [a, b, _c] = AXIS_PERMS[parent_type as usize];
    let cube_a = axis_bit(a);
    let cube_ab = axis_bit(a) | axis_bit(b);
    [
        (0, parent_type),
        (cube_a, rotate_left(parent_type)),
        (cube_a, swap_ab(parent_type)),
        (cube_a, parent_type),
        (cube_ab, parent_type),
        (cube_ab, swap_bc(parent_type)),
        (cube_ab, rotate_right(parent_type)),
        (7, parent_type),
    ]
}

/// The forward table, one row per parent type.
#[must_use]
pub fn child_table() -> [ChildRow; 6] {
    std::array::from_fn(|t| child_row(t as u8))
}

/// Look up the `(cube_id, type)` of Bey child `bey_index` (0..8) of a
/// tetrahedron of type `parent_type`.
///
/// # Panics
/// Panics if `bey_index >= 8` or `parent_type >= 6`.
#[must_use]
pub fn child_cube_and_type(parent_type: u8, bey_index: u8) -> (u8, u8) {
    child_row(parent_type)[bey_index as usize]
}

/// Recover `(parent_type, bey_index)` for a child occupying `cube_id` with
/// type `child_type`. Returns `None` if the pair cannot arise from any
/// parent, which would indicate a corrupted key rather than a valid one.
#[must_use]
pub fn parent_type_and_index(cube_id: u8, child_type: u8) -> Option<(u8, u8)> {
    for parent_type in 0..6u8 {
        let row = child_row(parent_type);
        if let Some(bey_index) = row.iter().position(|&(c, t)| c == cube_id && t == child_type) {
            return Some((parent_type, bey_index as u8));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_cube_id_type_pair_has_a_unique_parent() {
        for parent_type in 0..6u8 {
            for bey_index in 0..8u8 {
                let (cube_id, child_type) = child_cube_and_type(parent_type, bey_index);
                let found = parent_type_and_index(cube_id, child_type);
                assert_eq!(found, Some((parent_type, bey_index)));
            }
        }
    }

    #[test]
    fn corner_children_keep_parent_type() {
        for parent_type in 0..6u8 {
            let (cube0, type0) = child_cube_and_type(parent_type, 0);
            let (cube7, type7) = child_cube_and_type(parent_type, 7);
            assert_eq!(cube0, 0);
            assert_eq!(cube7, 7);
            assert_eq!(type0, parent_type);
            assert_eq!(type7, parent_type);
        }
    }

    #[test]
    fn children_cover_only_four_distinct_cube_ids() {
        for parent_type in 0..6u8 {
            let row = child_row(parent_type);
            let mut ids: Vec<u8> = row.iter().map(|&(c, _)| c).collect();
            ids.sort_unstable();
            ids.dedup();
            assert_eq!(ids.len(), 4, "type {parent_type} touches {ids:?}");
        }
    }
}
