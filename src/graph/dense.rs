use custom_debug_derive::Debug;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{EditableGraph, Graph, GraphError};

/// Position of edge `{i, j}` with `i < j` in the lower triangle.
#[inline]
fn edge_index(i: usize, j: usize) -> usize {
    j * (j - 1) / 2 + i
}

#[allow(clippy::ptr_arg)]
fn bits_fmt(edges: &Vec<bool>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{{")?;
    for &edge in edges {
        write!(f, "{}", edge as u8)?;
    }
    write!(f, "}}")
}

/// Adjacency stored as the lower triangle of the matrix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DenseGraph {
    n: usize,
    m: usize,
    #[debug(skip)]
    degrees: Vec<usize>,
    #[debug(with = "bits_fmt")]
    edges: Vec<bool>,
}

impl DenseGraph {
    /// Edgeless graph on `n` vertices.
    pub fn new(n: usize) -> Self {
        DenseGraph {
            n,
            m: 0,
            degrees: vec![0; n],
            edges: vec![false; n * n.saturating_sub(1) / 2],
        }
    }

    /// From the lower triangle in `j(j-1)/2 + i` layout.
    /// Panics if `edges` has the wrong length.
    pub fn from_edges(n: usize, edges: Vec<bool>) -> Self {
        assert_eq!(
            n * n.saturating_sub(1) / 2,
            edges.len(),
            "edge bits do not match {} vertices",
            n
        );
        let mut degrees = vec![0; n];
        let mut m = 0;
        for j in 1..n {
            for i in 0..j {
                if edges[edge_index(i, j)] {
                    degrees[i] += 1;
                    degrees[j] += 1;
                    m += 1;
                }
            }
        }
        DenseGraph {
            n,
            m,
            degrees,
            edges,
        }
    }

    /// Graph from user supplied pairs. Duplicates are ignored.
    pub fn from_edge_list(n: usize, pairs: &[(usize, usize)]) -> Result<Self, GraphError> {
        let mut graph = DenseGraph::new(n);
        for &(i, j) in pairs {
            graph.try_add_edge(i, j)?;
        }
        Ok(graph)
    }

    pub fn complete(n: usize) -> Self {
        DenseGraph::from_edges(n, vec![true; n * n.saturating_sub(1) / 2])
    }

    pub fn cycle(n: usize) -> Self {
        let mut graph = DenseGraph::new(n);
        for v in 0..n {
            graph.add_edge(v, (v + 1) % n);
        }
        graph
    }

    pub fn try_add_edge(&mut self, i: usize, j: usize) -> Result<(), GraphError> {
        self.check_pair(i, j)?;
        self.add_edge(i, j);
        Ok(())
    }

    fn check_pair(&self, i: usize, j: usize) -> Result<(), GraphError> {
        for &vertex in [i, j].iter() {
            if vertex >= self.n {
                return Err(GraphError::MissingVertex { vertex, n: self.n });
            }
        }
        if i == j {
            return Err(GraphError::SelfLoop(i));
        }
        Ok(())
    }

    /// Edges `(i, j)` with `i < j`, ordered by `j` then `i`.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (1..self.n)
            .flat_map(move |j| (0..j).map(move |i| (i, j)))
            .filter(move |&(i, j)| self.edges[edge_index(i, j)])
    }

    pub fn edge_bits(&self) -> &[bool] {
        &self.edges
    }

    /// Drops the last vertex without re-indexing anything.
    pub fn remove_last_vertex(&mut self) {
        assert!(self.n > 0, "cannot remove a vertex from the empty graph");
        let last = self.n - 1;
        for i in 0..last {
            if self.edges[edge_index(i, last)] {
                self.degrees[i] -= 1;
            }
        }
        self.m -= self.degrees[last];
        self.degrees.pop();
        self.edges.truncate(last * last.saturating_sub(1) / 2);
        self.n = last;
    }
}

impl Graph for DenseGraph {
    fn n(&self) -> usize {
        self.n
    }

    fn m(&self) -> usize {
        self.m
    }

    fn is_edge(&self, i: usize, j: usize) -> bool {
        if i >= self.n || j >= self.n || i == j {
            return false;
        }
        let (i, j) = if i < j { (i, j) } else { (j, i) };
        self.edges[edge_index(i, j)]
    }

    fn neighbours(&self, v: usize) -> Vec<usize> {
        (0..self.n).filter(|&u| self.is_edge(u, v)).collect()
    }

    fn degree(&self, v: usize) -> usize {
        self.degrees[v]
    }

    fn degrees(&self) -> Vec<usize> {
        self.degrees.clone()
    }

    fn min_degree(&self) -> usize {
        self.degrees.iter().copied().min().unwrap_or(0)
    }
}

impl EditableGraph for DenseGraph {
    fn add_vertex(&mut self, neighbours: &[usize]) {
        let new = self.n;
        self.edges.resize(self.edges.len() + new, false);
        self.degrees.push(0);
        self.n += 1;
        for &u in neighbours {
            assert!(u < new, "neighbour {} of the new vertex {} does not exist", u, new);
            self.add_edge(u, new);
        }
    }

    fn remove_vertex(&mut self, i: usize) {
        assert!(i < self.n, "vertex {} does not exist", i);
        if i == self.n - 1 {
            self.remove_last_vertex();
            return;
        }
        let remaining = (0..self.n).filter(|&v| v != i).collect::<Vec<usize>>();
        *self = self.induced_subgraph(&remaining);
    }

    fn add_edge(&mut self, i: usize, j: usize) {
        if i == j || self.is_edge(i, j) {
            return;
        }
        assert!(i < self.n && j < self.n, "edge {}-{} leaves the graph", i, j);
        let (i, j) = if i < j { (i, j) } else { (j, i) };
        self.edges[edge_index(i, j)] = true;
        self.degrees[i] += 1;
        self.degrees[j] += 1;
        self.m += 1;
    }

    fn remove_edge(&mut self, i: usize, j: usize) {
        if !self.is_edge(i, j) {
            return;
        }
        let (i, j) = if i < j { (i, j) } else { (j, i) };
        self.edges[edge_index(i, j)] = false;
        self.degrees[i] -= 1;
        self.degrees[j] -= 1;
        self.m -= 1;
    }

    fn induced_subgraph(&self, vertices: &[usize]) -> Self {
        let k = vertices.len();
        let mut edges = vec![false; k * k.saturating_sub(1) / 2];
        for q in 1..k {
            for p in 0..q {
                edges[edge_index(p, q)] = self.is_edge(vertices[p], vertices[q]);
            }
        }
        DenseGraph::from_edges(k, edges)
    }
}

/// Edges as `i-j` separated by spaces, `-` for no edges.
impl fmt::Display for DenseGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.m == 0 {
            return write!(f, "-");
        }
        write!(
            f,
            "{}",
            self.edges().map(|(i, j)| format!("{}-{}", i, j)).join(" ")
        )
    }
}
