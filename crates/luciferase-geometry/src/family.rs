//! Sibling-group checks used by node-merge (coarsening) logic: a node can
//! be collapsed back into its parent only once all eight of its Bey
//! siblings are present and otherwise empty.

use luciferase_error::Result;

use crate::key::SFCKey;

/// Sibling-group queries over [`SFCKey`], named after the tetree
/// terminology even though it applies identically to the Morton variant
/// (a "family" is just the eight children of one parent).
pub struct TetreeFamily;

impl TetreeFamily {
    /// True if `keys` is exactly the eight distinct children of a common
    /// parent, in any order.
    #[must_use]
    pub fn is_family(keys: &[SFCKey]) -> bool {
        if keys.len() != 8 {
            return false;
        }
        let Some(first) = keys.first() else {
            return false;
        };
        let Ok(parent) = first.parent() else {
            return false;
        };
        let mut seen = [false; 8];
        for key in keys {
            if key.level() != first.level() {
                return false;
            }
            let Ok(key_parent) = key.parent() else {
                return false;
            };
            if key_parent != parent {
                return false;
            }
            let Some(index) = (0..8u8).find(|&i| parent.child(i).ok().as_ref() == Some(key)) else {
                return false;
            };
            if seen[index as usize] {
                return false;
            }
            seen[index as usize] = true;
        }
        seen.iter().all(|&s| s)
    }

    /// All eight children of `key`'s parent, including `key` itself.
    ///
    /// # Errors
    /// Returns an error if `key` is a root key.
    pub fn get_siblings(key: &SFCKey) -> Result<[SFCKey; 8]> {
        let parent = key.parent()?;
        let mut out = [parent; 8];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = parent.child(i as u8)?;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KeyKind;

    #[test]
    fn full_sibling_set_is_a_family() {
        let root = SFCKey::root(KeyKind::Tetree);
        let siblings = TetreeFamily::get_siblings(&root.child(0).unwrap()).unwrap();
        assert!(TetreeFamily::is_family(&siblings));
    }

    #[test]
    fn missing_sibling_is_not_a_family() {
        let root = SFCKey::root(KeyKind::Tetree);
        let mut siblings = TetreeFamily::get_siblings(&root.child(0).unwrap())
            .unwrap()
            .to_vec();
        siblings.pop();
        // Duplicate one to keep the length at 8 but break distinctness.
        let dup = siblings[0];
        siblings.push(dup);
        assert!(!TetreeFamily::is_family(&siblings));
    }

    #[test]
    fn siblings_from_different_parents_are_not_a_family() {
        let root = SFCKey::root(KeyKind::Tetree);
        let mut siblings = TetreeFamily::get_siblings(&root.child(0).unwrap())
            .unwrap()
            .to_vec();
        let other_parent_child = root.child(1).unwrap().child(0).unwrap();
        siblings[7] = other_parent_child;
        assert!(!TetreeFamily::is_family(&siblings));
    }
}
