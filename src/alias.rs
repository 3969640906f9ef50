//! Alias map: union-find over variable ids with asymmetric merge.
//!
//! Each variable points at a parent it is known to equal; a variable that
//! points at itself is the representative of its class. Unlike a textbook
//! union-find, [`AliasMap::union`] never ranks classes: the first
//! established representative wins, and a child that already belongs to a
//! class pulls the *other* class under its own representative instead of
//! being re-pointed. Chains are kept short by memoizing every resolution.
//!
//! # Usage
//!
//! ```
//! use finsat::alias::AliasMap;
//!
//! let mut aliases = AliasMap::new();
//! let x = aliases.push();
//! let y = aliases.push();
//! let z = aliases.push();
//!
//! // x = y: x was unaliased, so it now points at y
//! assert_eq!(aliases.union(x, y).unwrap(), y);
//! // x = z: x is already in y's class, so z's class is redirected to y
//! assert_eq!(aliases.union(x, z).unwrap(), y);
//! assert_eq!(aliases.resolve(z).unwrap(), y);
//! ```

use tracing::trace;

use crate::error::SolverError;
use crate::id::{MAX_ALIAS_DEPTH, VarId};

#[derive(Clone, Debug, Default)]
pub struct AliasMap {
    /// `parent[v] == v` iff `v` is a representative
    parent: Vec<VarId>,
    /// Number of merges performed (for statistics)
    merge_count: usize,
}

impl AliasMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fresh, unaliased variable and return its id.
    pub fn push(&mut self) -> VarId {
        let id = self.parent.len();
        self.parent.push(id);
        id
    }

    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    pub fn merge_count(&self) -> usize {
        self.merge_count
    }

    pub fn is_representative(&self, var: VarId) -> bool {
        self.parent[var] == var
    }

    /// Direct alias links `(child, parent)` for every non-representative.
    pub fn links(&self) -> impl Iterator<Item = (VarId, VarId)> + '_ {
        self.parent
            .iter()
            .enumerate()
            .filter(|(child, parent)| child != *parent)
            .map(|(child, parent)| (child, *parent))
    }

    /// Find the representative without touching the links.
    pub fn find(&self, var: VarId) -> Result<VarId, SolverError> {
        let mut current = var;
        for _ in 0..=MAX_ALIAS_DEPTH {
            let next = self.parent[current];
            if next == current {
                return Ok(current);
            }
            current = next;
        }
        Err(SolverError::CycleDetected {
            var,
            depth: MAX_ALIAS_DEPTH,
        })
    }

    /// Find the representative and rewrite every link on the path to point
    /// straight at it.
    pub fn resolve(&mut self, var: VarId) -> Result<VarId, SolverError> {
        let root = self.find(var)?;
        let mut current = var;
        while current != root {
            let next = self.parent[current];
            self.parent[current] = root;
            current = next;
        }
        Ok(root)
    }

    /// Record `child = parent` and return the shared representative.
    ///
    /// If `child` is its own representative it is pointed at `parent`'s
    /// representative. Otherwise `child` already belongs to a class, and
    /// `parent`'s representative is redirected under it. Merging two
    /// members of one class is a no-op.
    pub fn union(&mut self, child: VarId, parent: VarId) -> Result<VarId, SolverError> {
        let y = self.resolve(parent)?;
        let z = self.resolve(child)?;
        if y == z {
            return Ok(z);
        }

        self.merge_count += 1;
        if z == child {
            trace!(child, rep = y, "alias: link child to parent class");
            self.parent[child] = y;
            Ok(y)
        } else {
            trace!(from = y, rep = z, "alias: redirect parent class under child class");
            self.parent[y] = z;
            Ok(z)
        }
    }

    /// Point `var` at `target` without any checks. Only used to build
    /// malformed maps in tests.
    #[cfg(test)]
    pub(crate) fn set_parent_unchecked(&mut self, var: VarId, target: VarId) {
        self.parent[var] = target;
    }
}
