//! Vertex permutations as image vectors, used for
//! automorphism group generators.
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::{
    collections::{HashSet, VecDeque},
    fmt,
};

/// `image[v]` is where `v` is sent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permutation {
    image: Vec<usize>,
}

impl Permutation {
    /// Panics if `image` is not a permutation of `0..image.len()`.
    pub fn new(image: Vec<usize>) -> Self {
        let mut seen = vec![false; image.len()];
        for &target in image.iter() {
            assert!(
                target < image.len() && !seen[target],
                "{:?} is not a permutation",
                image
            );
            seen[target] = true;
        }
        Permutation { image }
    }

    pub fn identity(n: usize) -> Self {
        Permutation {
            image: (0..n).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.image.len()
    }

    pub fn is_empty(&self) -> bool {
        self.image.is_empty()
    }

    pub fn apply(&self, vertex: usize) -> usize {
        self.image[vertex]
    }

    pub fn image(&self) -> &[usize] {
        &self.image
    }

    pub fn inverse(&self) -> Self {
        let mut inverse = vec![0; self.len()];
        for (vertex, &target) in self.image.iter().enumerate() {
            inverse[target] = vertex;
        }
        Permutation { image: inverse }
    }

    /// First `self`, then `other`.
    pub fn compose(&self, other: &Permutation) -> Self {
        assert_eq!(self.len(), other.len(), "permutations of different size");
        Permutation {
            image: self.image.iter().map(|&v| other.image[v]).collect(),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.image.iter().enumerate().all(|(v, &t)| v == t)
    }

    /// Non-trivial cycles, each starting at its smallest point,
    /// ordered by that point.
    pub fn cycles(&self) -> Vec<Vec<usize>> {
        let mut visited = vec![false; self.len()];
        let mut cycles = Vec::new();

        for start in 0..self.len() {
            if visited[start] {
                continue;
            }
            let mut cycle = vec![start];
            visited[start] = true;
            let mut current = self.image[start];
            while current != start {
                visited[current] = true;
                cycle.push(current);
                current = self.image[current];
            }
            if cycle.len() > 1 {
                cycles.push(cycle);
            }
        }

        cycles
    }
}

impl fmt::Display for Permutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cycles = self.cycles();
        if cycles.is_empty() {
            return write!(f, "()");
        }
        for cycle in cycles {
            write!(f, "({})", cycle.iter().join(" "))?;
        }
        Ok(())
    }
}

/// Order of the group generated by `generators` on `n` points,
/// found by closing the generators under multiplication.
/// Gives up with `None` once more than `limit` elements are found.
pub fn group_order(n: usize, generators: &[Permutation], limit: usize) -> Option<usize> {
    let identity = Permutation::identity(n);
    let mut elements = HashSet::new();
    let mut queue = VecDeque::new();
    elements.insert(identity.clone());
    queue.push_back(identity);

    while let Some(element) = queue.pop_front() {
        for generator in generators {
            let product = element.compose(generator);
            if elements.insert(product.clone()) {
                if elements.len() > limit {
                    return None;
                }
                queue.push_back(product);
            }
        }
    }

    Some(elements.len())
}
