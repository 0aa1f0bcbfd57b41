//! The graph grown by the generation, with everything needed to
//! propose augmentations and to decide whether an augmentation is
//! the canonical way of reaching the augmented graph.
use custom_debug_derive::Debug;

use crate::{
    bitset::VertexSet,
    canonical::{
        canonical_isomorph_allocated, Canonical, CanonicalOptions, CanonicalStorage,
        OrderedPartition,
    },
    comb::{coeff, rank, CombinationsColex},
    disjoint::DisjointSet,
    graph::{DenseGraph, EditableGraph, Graph},
    statistics::{GenerationStatistics, Rejection},
};

/// Outcome of [`SearchGraph::is_canonical`] for the last vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Canonical,
    /// Some vertex beats the new one on degree or neighbour degrees.
    DegreeRejected,
    /// The first refinement already separates a viable vertex
    /// in front of the new one.
    NotViable,
    NotCanonical,
}

impl Verdict {
    pub fn rejection(self) -> Option<Rejection> {
        match self {
            Verdict::Canonical => None,
            Verdict::DegreeRejected => Some(Rejection::Degree),
            Verdict::NotViable => Some(Rejection::NotViable),
            Verdict::NotCanonical => Some(Rejection::NotCanonical),
        }
    }
}

#[derive(Debug)]
pub struct SearchGraph {
    graph: DenseGraph,
    #[debug(skip)]
    neighbours: Vec<Vec<usize>>,
    #[debug(skip)]
    neighbours_valid: bool,
    /// Automorphisms of the current graph, dropped on every change.
    #[debug(skip)]
    automorphisms: Option<Canonical>,
    #[debug(skip)]
    partition: OrderedPartition,
    #[debug(skip)]
    storage: CanonicalStorage,
    #[debug(skip)]
    subset_orbits: DisjointSet,
    #[debug(skip)]
    image: Vec<usize>,
    #[debug(skip)]
    buffer: Vec<usize>,
}

impl SearchGraph {
    /// Wraps `graph`, which may grow up to `max_n` vertices.
    pub fn new(graph: DenseGraph, max_n: usize) -> Self {
        assert!(
            graph.n() <= max_n,
            "graph with {} vertices exceeds the limit of {}",
            graph.n(),
            max_n
        );
        let max_m = max_n * max_n.saturating_sub(1) / 2;
        SearchGraph {
            graph,
            neighbours: Vec::with_capacity(max_n),
            neighbours_valid: false,
            automorphisms: None,
            partition: OrderedPartition::new(max_n, max_m, None),
            storage: CanonicalStorage::new(max_n, max_m),
            subset_orbits: DisjointSet::new(0),
            image: Vec::with_capacity(max_n),
            buffer: Vec::with_capacity(max_n),
        }
    }

    pub fn graph(&self) -> &DenseGraph {
        &self.graph
    }

    pub fn n(&self) -> usize {
        self.graph.n()
    }

    /// Adds vertex `n` adjacent to exactly `neighbours`.
    pub fn add_vertex(&mut self, neighbours: VertexSet) {
        self.graph
            .add_vertex(&neighbours.iter().collect::<Vec<usize>>());
        self.clear_cache();
    }

    pub fn remove_last_vertex(&mut self) {
        self.graph.remove_last_vertex();
        self.clear_cache();
    }

    fn clear_cache(&mut self) {
        self.neighbours_valid = false;
        self.automorphisms = None;
    }

    fn refresh_neighbours(&mut self) {
        if !self.neighbours_valid {
            self.neighbours = self.graph.adjacency();
            self.neighbours_valid = true;
        }
    }

    fn canonical(
        &mut self,
        viability: Option<VertexSet>,
        statistics: Option<&mut GenerationStatistics>,
    ) -> Option<Canonical> {
        self.refresh_neighbours();
        let (n, m) = (self.graph.n(), self.graph.m());
        self.partition.reset(n, m, None);
        let mut options = CanonicalOptions {
            check_viability: viability,
        };

        crate::time!(
            duration,
            canonical,
            canonical_isomorph_allocated(
                n,
                m,
                &self.neighbours,
                &mut self.partition,
                &mut self.storage,
                &mut options,
            )
        );
        if let Some(statistics) = statistics {
            statistics.log_canonical(duration);
        }
        canonical
    }

    /// Neighbourhoods for a new vertex, one per orbit of the
    /// automorphism group on vertex subsets. Subsets larger than the
    /// minimum degree plus one are left out since the new vertex
    /// could not have the smallest degree afterwards.
    pub fn augmentations(&mut self, statistics: Option<&mut GenerationStatistics>) -> Vec<VertexSet> {
        let n = self.graph.n();
        let mut augmentations = vec![VertexSet::empty()];

        if self.automorphisms.is_none() {
            self.automorphisms = self.canonical(None, statistics);
        }
        let automorphisms = match &self.automorphisms {
            Some(automorphisms) => automorphisms,
            None => unreachable!("the search without viability check always finishes"),
        };

        augmentations.extend(
            automorphisms
                .orbits
                .roots()
                .into_iter()
                .map(VertexSet::singleton),
        );

        let largest = (self.graph.min_degree() + 1).min(n);
        for k in 2..=largest {
            self.subset_orbits.reset(coeff(n, k));

            let mut subsets = CombinationsColex::new(n, k);
            let mut index = 0;
            while let Some(subset) = subsets.advance() {
                for generator in automorphisms.generators.iter() {
                    self.image.clear();
                    self.image
                        .extend(subset.iter().map(|&vertex| generator.apply(vertex)));
                    self.image.sort_unstable();
                    self.subset_orbits
                        .union_buffered(index, rank(&self.image), &mut self.buffer);
                }
                index += 1;
            }

            let mut subsets = CombinationsColex::new(n, k);
            let mut index = 0;
            while let Some(subset) = subsets.advance() {
                if self.subset_orbits.is_root(index) {
                    augmentations.push(VertexSet::from_vertices(subset));
                }
                index += 1;
            }
        }

        augmentations
    }

    fn neighbour_degrees(&self, vertex: usize) -> (usize, usize) {
        self.neighbours[vertex]
            .iter()
            .map(|&u| self.graph.degree(u))
            .fold((0, 0), |(sum, squares), degree| {
                (sum + degree, squares + degree * degree)
            })
    }

    /// Decides whether the last vertex is the one a canonical deletion
    /// would remove. It must have the smallest degree, then the largest
    /// sum and sum of squares of its neighbours' degrees, and finally
    /// come first among the remaining candidates in the canonical labelling,
    /// up to automorphisms.
    pub fn is_canonical(&mut self, statistics: Option<&mut GenerationStatistics>) -> Verdict {
        let n = self.graph.n();
        assert!(n > 0, "the empty graph has no last vertex");
        let last = n - 1;
        let degree = self.graph.degree(last);

        let mut viable = VertexSet::empty();
        for vertex in 0..last {
            let other = self.graph.degree(vertex);
            if other < degree {
                return Verdict::DegreeRejected;
            }
            if other == degree {
                viable.insert(vertex);
            }
        }
        if viable.is_empty() {
            return Verdict::Canonical;
        }

        self.refresh_neighbours();
        let own = self.neighbour_degrees(last);
        for vertex in viable.iter() {
            let other = self.neighbour_degrees(vertex);
            if other > own {
                return Verdict::DegreeRejected;
            }
            if other < own {
                viable.remove(vertex);
            }
        }
        if viable.is_empty() {
            return Verdict::Canonical;
        }

        let mut canonical = match self.canonical(Some(viable), statistics) {
            Some(canonical) => canonical,
            None => return Verdict::NotViable,
        };

        let first = canonical
            .permutation
            .iter()
            .copied()
            .find(|&vertex| vertex == last || viable.contains(vertex))
            .expect("the last vertex is part of every labelling");
        let verdict = if first == last || canonical.orbits.find(first) == canonical.orbits.find(last)
        {
            Verdict::Canonical
        } else {
            Verdict::NotCanonical
        };
        self.automorphisms = Some(canonical);
        verdict
    }
}
