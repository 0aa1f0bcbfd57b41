//! Small vertex sets packed into a single machine word.
//! Used for augmentation neighbourhoods and viability masks,
//! so every vertex involved must be below [`VertexSet::CAPACITY`].
use serde::{Deserialize, Serialize};
use std::{fmt, iter::FromIterator};

#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VertexSet(u64);

impl VertexSet {
    pub const CAPACITY: usize = u64::BITS as usize;

    pub fn empty() -> Self {
        VertexSet(0)
    }

    pub fn singleton(vertex: usize) -> Self {
        let mut set = Self::empty();
        set.insert(vertex);
        set
    }

    /// Panics if a vertex does not fit.
    pub fn from_vertices(vertices: &[usize]) -> Self {
        vertices.iter().copied().collect()
    }

    pub fn insert(&mut self, vertex: usize) {
        assert!(
            vertex < Self::CAPACITY,
            "vertex {} does not fit into a set of capacity {}",
            vertex,
            Self::CAPACITY
        );
        self.0 |= 1 << vertex;
    }

    pub fn remove(&mut self, vertex: usize) {
        if vertex < Self::CAPACITY {
            self.0 &= !(1 << vertex);
        }
    }

    pub fn contains(self, vertex: usize) -> bool {
        vertex < Self::CAPACITY && (self.0 >> vertex) & 1 == 1
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Members in ascending order.
    pub fn iter(self) -> Members {
        Members(self.0)
    }
}

pub struct Members(u64);

impl Iterator for Members {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.0 == 0 {
            return None;
        }
        let vertex = self.0.trailing_zeros() as usize;
        // Clear the lowest set bit.
        self.0 &= self.0 - 1;
        Some(vertex)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.0.count_ones() as usize;
        (len, Some(len))
    }
}

impl FromIterator<usize> for VertexSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut set = VertexSet::empty();
        for vertex in iter {
            set.insert(vertex);
        }
        set
    }
}

impl fmt::Debug for VertexSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
