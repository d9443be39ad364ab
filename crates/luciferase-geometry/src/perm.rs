//! The six tetrahedron types as permutations of the three coordinate axes
//! (the classic Kuhn/Freudenthal triangulation of a cube into six
//! tetrahedra sharing the main diagonal), plus the permutation operations
//! Bey refinement needs.
//!
//! A type `t` is the permutation `(a, b, c)` of `{x=0, y=1, z=2}` such that
//! the tetrahedron's vertices, in a cube of side `h` anchored at `anchor`,
//! are:
//!
//! ```text
//! v0 = anchor
//! v1 = v0 + h * e_a
//! v2 = v1 + h * e_b
//! v3 = v0 + (h, h, h)   // always, regardless of permutation
//! ```
//!
//! Containment is the ordering predicate `local_a >= local_b >= local_c`
//! where `local = (p - anchor) / h` (see [`crate::tet::Tet::contains`]).

/// Number of tetrahedron types per cube.
pub const NUM_TYPES: u8 = 6;

/// `AXIS_PERMS[t]` is the `(a, b, c)` axis order for type `t`.
pub const AXIS_PERMS: [[u8; 3]; 6] = [
    [0, 1, 2], // type 0: x, y, z
    [0, 2, 1], // type 1: x, z, y
    [1, 0, 2], // type 2: y, x, z
    [1, 2, 0], // type 3: y, z, x
    [2, 0, 1], // type 4: z, x, y
    [2, 1, 0], // type 5: z, y, x
];

/// Inverse of [`AXIS_PERMS`]: given an axis order, the type that produces
/// it. Built once and reused rather than hand-duplicated, so the two tables
/// can never drift apart.
#[must_use]
pub fn type_of_perm(perm: [u8; 3]) -> u8 {
    AXIS_PERMS
        .iter()
        .position(|p| *p == perm)
        .expect("perm must be a permutation of {0,1,2}") as u8
}

/// Swap the first two axes of a type's permutation: `(a,b,c) -> (b,a,c)`.
#[must_use]
pub fn swap_ab(t: u8) -> u8 {
    let [a, b, c] = AXIS_PERMS[t as usize];
    type_of_perm([b, a, c])
}

/// Swap the last two axes of a type's permutation: `(a,b,c) -> (a,c,b)`.
#[must_use]
pub fn swap_bc(t: u8) -> u8 {
    let [a, b, c] = AXIS_PERMS[t as usize];
    type_of_perm([a, c, b])
}

/// Rotate left: `(a,b,c) -> (b,c,a)`.
#[must_use]
pub fn rotate_left(t: u8) -> u8 {
    let [a, b, c] = AXIS_PERMS[t as usize];
    type_of_perm([b, c, a])
}

/// Rotate right: `(a,b,c) -> (c,a,b)`.
#[must_use]
pub fn rotate_right(t: u8) -> u8 {
    let [a, b, c] = AXIS_PERMS[t as usize];
    type_of_perm([c, a, b])
}

/// Bit weight of an axis index (`x=1, y=2, z=4`), matching the cube-id
/// convention used by the SFC key token layout.
#[must_use]
pub const fn axis_bit(axis: u8) -> u8 {
    1 << axis
}

/// The type whose ordering predicate `local_a >= local_b >= local_c` holds
/// for `local`, i.e. the one of the six Kuhn simplices of the cube that
/// contains a point at `local` relative to the cube's anchor.
///
/// The six orderings of three (possibly tied) values always admit at least
/// one satisfying permutation; ties are broken by returning the smallest
/// matching type, so points exactly on a dividing plane are assigned
/// consistently rather than arbitrarily.
#[must_use]
pub fn type_for_ordering(local: [i64; 3]) -> u8 {
    for t in 0..NUM_TYPES {
        let [a, b, c] = AXIS_PERMS[t as usize];
        if local[a as usize] >= local[b as usize] && local[b as usize] >= local[c as usize] {
            return t;
        }
    }
    unreachable!("some permutation of three values is always sorted descending")
}
