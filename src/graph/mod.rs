//! Simple undirected graphs as consumed by the
//! canonical labelling and grown by the generation.

mod dense;
pub use dense::DenseGraph;

#[derive(thiserror::Error, Debug, PartialEq, Eq, Clone, Copy)]
pub enum GraphError {
    #[error("vertex {vertex} does not exist in a graph with {n} vertices")]
    MissingVertex { vertex: usize, n: usize },
    #[error("self loop at vertex {0}")]
    SelfLoop(usize),
}

/// Read access the canonical search needs.
pub trait Graph {
    fn n(&self) -> usize;

    fn m(&self) -> usize;

    /// False for `i == j` and out of range vertices.
    fn is_edge(&self, i: usize, j: usize) -> bool;

    /// Neighbours of `v` in ascending order.
    fn neighbours(&self, v: usize) -> Vec<usize>;

    fn degree(&self, v: usize) -> usize;

    fn degrees(&self) -> Vec<usize> {
        (0..self.n()).map(|v| self.degree(v)).collect()
    }

    /// All neighbour lists at once.
    fn adjacency(&self) -> Vec<Vec<usize>> {
        (0..self.n()).map(|v| self.neighbours(v)).collect()
    }

    fn min_degree(&self) -> usize {
        (0..self.n()).map(|v| self.degree(v)).min().unwrap_or(0)
    }
}

/// Mutation primitives used while growing graphs.
pub trait EditableGraph: Graph + Clone {
    /// Adds vertex `n` adjacent to every vertex in `neighbours`.
    fn add_vertex(&mut self, neighbours: &[usize]);

    /// Removes `i`, vertices above it move one index down.
    fn remove_vertex(&mut self, i: usize);

    fn add_edge(&mut self, i: usize, j: usize);

    fn remove_edge(&mut self, i: usize, j: usize);

    /// Vertex `p` of the result is `vertices[p]` of `self`.
    fn induced_subgraph(&self, vertices: &[usize]) -> Self;

    fn copy(&self) -> Self {
        self.clone()
    }
}
