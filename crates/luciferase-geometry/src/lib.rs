//! SFC keys and integer tetrahedron/octree geometry.
//!
//! [`SFCKey`] is the opaque, totally-ordered path used by the node store
//! and the wire protocols; [`Tet`] is the concrete integer geometry behind
//! the Tetree variant, including Bey refinement (see [`bey_tables`]) and
//! point location. They live in one crate because `SFCKey::child` for the
//! Tetree variant needs the same refinement table `Tet::child` does.

pub mod bey_tables;
pub mod family;
pub mod key;
pub mod morton;
pub mod perm;
pub mod tet;

pub use family::TetreeFamily;
pub use key::{KeyKind, SFCKey};
pub use tet::{Tet, MAX_LEVEL, ROOT_EXTENT};
