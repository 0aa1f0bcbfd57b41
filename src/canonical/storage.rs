//! Workspace for repeated canonical labelling calls.
use custom_debug_derive::Debug;

use super::partition::RefinementScratch;
use crate::{bitset::VertexSet, debug::opt_fmt, disjoint::DisjointSet, permutation::Permutation};

/// Options for a single call of
/// [`canonical_isomorph_allocated`](super::canonical_isomorph_allocated).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CanonicalOptions {
    /// Give up early, returning `None`, if the first refinement puts one of
    /// these vertices into an earlier cell than the last vertex `n - 1`.
    /// Consumed by the call it is passed to.
    #[debug(with = "opt_fmt")]
    pub check_viability: Option<VertexSet>,
}

/// Buffers owned by the caller and overwritten by every call.
/// Sized for graphs with up to `n` vertices and `m` edges but
/// grows when given larger graphs.
#[derive(Debug, Clone)]
pub struct CanonicalStorage {
    pub(super) path: Vec<usize>,
    pub(super) choices: Vec<usize>,
    #[debug(skip)]
    pub(super) generators: Vec<Permutation>,

    pub(super) current_best: Vec<usize>,
    pub(super) current_best_path: Vec<usize>,
    pub(super) current_best_perm: Vec<usize>,
    #[debug(skip)]
    pub(super) current_best_perm_inv: Vec<usize>,
    #[debug(skip)]
    pub(super) current_best_orbits: DisjointSet,

    pub(super) first_leaf: Vec<usize>,
    pub(super) first_leaf_path: Vec<usize>,
    #[debug(skip)]
    pub(super) first_leaf_perm_inv: Vec<usize>,
    #[debug(skip)]
    pub(super) first_leaf_orbits: DisjointSet,

    #[debug(skip)]
    pub(super) buffer: Vec<usize>,
    #[debug(skip)]
    pub(super) image: Vec<usize>,
    #[debug(skip)]
    pub(super) refinement: RefinementScratch,
}

impl CanonicalStorage {
    pub fn new(n: usize, m: usize) -> Self {
        CanonicalStorage {
            path: Vec::with_capacity(n),
            choices: Vec::with_capacity(n),
            generators: Vec::with_capacity(n.saturating_sub(1)),
            current_best: Vec::with_capacity(m),
            current_best_path: Vec::with_capacity(n),
            current_best_perm: Vec::with_capacity(n),
            current_best_perm_inv: vec![0; n],
            current_best_orbits: DisjointSet::new(n),
            first_leaf: Vec::with_capacity(m),
            first_leaf_path: Vec::with_capacity(n),
            first_leaf_perm_inv: vec![0; n],
            first_leaf_orbits: DisjointSet::new(n),
            buffer: Vec::with_capacity(n),
            image: Vec::with_capacity(n),
            refinement: RefinementScratch::new(n),
        }
    }

    /// Clears everything a previous call left behind.
    pub(super) fn prepare(&mut self, n: usize) {
        self.path.clear();
        self.choices.clear();
        self.generators.clear();
        self.current_best.clear();
        self.current_best_path.clear();
        self.current_best_perm.clear();
        self.current_best_perm_inv.clear();
        self.current_best_perm_inv.resize(n, 0);
        self.current_best_orbits.reset(n);
        self.first_leaf.clear();
        self.first_leaf_path.clear();
        self.first_leaf_perm_inv.clear();
        self.first_leaf_perm_inv.resize(n, 0);
        self.first_leaf_orbits.reset(n);
    }
}
