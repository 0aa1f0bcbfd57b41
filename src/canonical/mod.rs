//! Canonical labelling of graphs by equitable partition refinement
//! and backtracking, together with the automorphism group orbits and
//! a set of group generators found on the way.
//!
//! The labelling picks, among all leaves of the refinement tree, the
//! vertex order whose edge positions form the lexicographically largest
//! sequence. Two graphs are isomorphic iff relabelling both by their
//! canonical permutation gives the same graph.
mod partition;
mod search;
mod storage;

pub use partition::{OrderedPartition, RefinementScratch};
pub use search::canonical_isomorph_allocated;
pub use storage::{CanonicalOptions, CanonicalStorage};

use crate::{
    disjoint::DisjointSet,
    graph::{EditableGraph, Graph},
    permutation::{self, Permutation},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canonical {
    /// `permutation[p]` is the vertex at canonical position `p`.
    pub permutation: Vec<usize>,
    /// Orbits of the automorphism group.
    pub orbits: DisjointSet,
    /// Generators of the automorphism group, may be empty.
    pub generators: Vec<Permutation>,
}

impl Canonical {
    fn empty() -> Self {
        Canonical {
            permutation: Vec::new(),
            orbits: DisjointSet::new(0),
            generators: Vec::new(),
        }
    }

    /// Size of the automorphism group if it has at most `limit` elements.
    pub fn group_order(&self, limit: usize) -> Option<usize> {
        permutation::group_order(self.permutation.len(), &self.generators, limit)
    }
}

/// Canonical labelling, orbits and generators of `graph`. With vertex
/// classes only automorphisms fixing every class are considered and the
/// classes keep their order in the labelling.
pub fn canonical_isomorph_full<G: Graph>(
    graph: &G,
    vertex_classes: Option<&[Vec<usize>]>,
) -> Canonical {
    let (n, m) = (graph.n(), graph.m());
    let neighbours = graph.adjacency();
    let mut partition = OrderedPartition::new(n, m, vertex_classes);
    let mut storage = CanonicalStorage::new(n, m);

    canonical_isomorph_allocated(
        n,
        m,
        &neighbours,
        &mut partition,
        &mut storage,
        &mut CanonicalOptions::default(),
    )
    .expect("without a viability check the search always finishes")
}

/// The canonical permutation of `graph`.
pub fn canonical_isomorph<G: Graph>(graph: &G) -> Vec<usize> {
    canonical_isomorph_full(graph, None).permutation
}

/// `graph` relabelled by its canonical permutation.
pub fn canonical_form<G: EditableGraph>(graph: &G) -> G {
    graph.induced_subgraph(&canonical_isomorph(graph))
}

pub fn are_isomorphic<G: EditableGraph + PartialEq>(first: &G, second: &G) -> bool {
    if first.n() != second.n() || first.m() != second.m() {
        return false;
    }
    let mut first_degrees = first.degrees();
    let mut second_degrees = second.degrees();
    first_degrees.sort_unstable();
    second_degrees.sort_unstable();
    first_degrees == second_degrees && canonical_form(first) == canonical_form(second)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::graph::DenseGraph;
    use rand::{rngs::SmallRng, seq::SliceRandom, Rng, SeedableRng};
    use std::collections::HashSet;

    fn random_graph(rng: &mut SmallRng, n: usize) -> DenseGraph {
        let mut graph = DenseGraph::new(n);
        for j in 1..n {
            for i in 0..j {
                if rng.gen_bool(0.4) {
                    graph.add_edge(i, j);
                }
            }
        }
        graph
    }

    fn petersen() -> DenseGraph {
        let mut graph = DenseGraph::new(10);
        for v in 0..5 {
            graph.add_edge(v, (v + 1) % 5);
            graph.add_edge(v, v + 5);
            graph.add_edge(v + 5, (v + 2) % 5 + 5);
        }
        graph
    }

    fn assert_automorphisms<G: Graph>(graph: &G, canonical: &Canonical) {
        for generator in canonical.generators.iter() {
            for j in 0..graph.n() {
                for i in 0..j {
                    assert_eq!(
                        graph.is_edge(i, j),
                        graph.is_edge(generator.apply(i), generator.apply(j)),
                        "{} is no automorphism",
                        generator
                    );
                }
            }
        }
    }

    #[test]
    fn test_relabelling_gives_same_form() {
        let mut rng = SmallRng::seed_from_u64(2021);
        for round in 0..60 {
            let n = 1 + round % 12;
            let graph = random_graph(&mut rng, n);
            let mut relabelling = (0..n).collect::<Vec<usize>>();
            relabelling.shuffle(&mut rng);
            let relabelled = graph.induced_subgraph(&relabelling);

            assert_eq!(canonical_form(&graph), canonical_form(&relabelled));
            assert!(are_isomorphic(&graph, &relabelled));
        }
    }

    #[test]
    fn test_generators_are_automorphisms() {
        let mut rng = SmallRng::seed_from_u64(7);
        for round in 0..30 {
            let graph = random_graph(&mut rng, 3 + round % 9);
            let canonical = canonical_isomorph_full(&graph, None);
            assert_automorphisms(&graph, &canonical);

            let mut orbits = canonical.orbits.clone();
            for generator in canonical.generators.iter() {
                for v in 0..graph.n() {
                    assert_eq!(orbits.find(v), orbits.find(generator.apply(v)));
                }
            }
        }
    }

    #[test]
    fn test_complete_graph_one_orbit() {
        let mut canonical = canonical_isomorph_full(&DenseGraph::complete(5), None);
        assert_eq!(vec![vec![0, 1, 2, 3, 4]], canonical.orbits.sets());
        assert_eq!(Some(120), canonical.group_order(1000));
    }

    #[test]
    fn test_cycle_dihedral_group() {
        let cycle = DenseGraph::cycle(5);
        let mut canonical = canonical_isomorph_full(&cycle, None);
        assert_eq!(1, canonical.orbits.number_of_sets());
        assert_eq!(5, canonical.orbits.sets()[0].len());
        assert_eq!(Some(10), canonical.group_order(1000));
        assert_automorphisms(&cycle, &canonical);
    }

    #[test]
    fn test_petersen_graph() {
        let graph = petersen();
        let canonical = canonical_isomorph_full(&graph, None);
        assert_eq!(1, canonical.orbits.number_of_sets());
        assert_automorphisms(&graph, &canonical);

        let mut rng = SmallRng::seed_from_u64(10);
        let mut relabelling = (0..10).collect::<Vec<usize>>();
        relabelling.shuffle(&mut rng);
        assert_eq!(
            canonical_form(&graph),
            canonical_form(&graph.induced_subgraph(&relabelling))
        );
    }

    #[test]
    fn test_asymmetric_path_with_pendant() {
        // Smallest asymmetric tree has seven vertices.
        let graph =
            DenseGraph::from_edge_list(7, &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (2, 6)])
                .unwrap();
        let canonical = canonical_isomorph_full(&graph, None);
        assert!(canonical.generators.is_empty());
        assert_eq!(7, canonical.orbits.number_of_sets());
        assert_eq!(Some(1), canonical.group_order(10));
    }

    #[test]
    fn test_edgeless_closed_form() {
        let mut canonical = canonical_isomorph_full(&DenseGraph::new(4), None);
        assert_eq!(vec![0, 1, 2, 3], canonical.permutation);
        assert_eq!(vec![vec![0, 1, 2, 3]], canonical.orbits.sets());
        assert_eq!(
            vec![
                Permutation::new(vec![1, 2, 3, 0]),
                Permutation::new(vec![1, 0, 2, 3])
            ],
            canonical.generators
        );
        assert_eq!(Some(24), canonical.group_order(100));

        let two = canonical_isomorph_full(&DenseGraph::new(2), None);
        assert_eq!(vec![Permutation::new(vec![1, 0])], two.generators);
        let one = canonical_isomorph_full(&DenseGraph::new(1), None);
        assert!(one.generators.is_empty());

        let empty = canonical_isomorph_full(&DenseGraph::new(0), None);
        assert!(empty.permutation.is_empty());
        assert!(empty.orbits.is_empty());
        assert!(empty.generators.is_empty());
    }

    #[test]
    fn test_vertex_classes() {
        let path = DenseGraph::from_edge_list(3, &[(0, 1), (1, 2)]).unwrap();
        let classes = vec![vec![1], vec![0, 2]];
        let mut canonical = canonical_isomorph_full(&path, Some(classes.as_slice()));
        assert_eq!(1, canonical.permutation[0]);
        assert_eq!(vec![vec![0, 2], vec![1]], canonical.orbits.sets());

        // The classes forbid swapping the two leaves.
        let classes = vec![vec![0], vec![1], vec![2]];
        let canonical = canonical_isomorph_full(&path, Some(classes.as_slice()));
        assert_eq!(vec![0, 1, 2], canonical.permutation);
        assert!(canonical.generators.is_empty());

        let classes = vec![vec![2], vec![0, 1]];
        let mut edgeless = canonical_isomorph_full(&DenseGraph::new(3), Some(classes.as_slice()));
        assert_eq!(vec![2, 0, 1], edgeless.permutation);
        assert_eq!(vec![vec![0, 1], vec![2]], edgeless.orbits.sets());
        assert_eq!(vec![Permutation::new(vec![1, 0, 2])], edgeless.generators);
    }

    #[test]
    fn test_distinct_forms_of_all_labelled_graphs() {
        for (n, expected) in [1, 1, 2, 4, 11, 34].iter().enumerate() {
            let pairs = n * n.saturating_sub(1) / 2;
            let forms = (0..1u32 << pairs)
                .map(|bits| {
                    let edges = (0..pairs).map(|k| bits & (1 << k) != 0).collect();
                    canonical_form(&DenseGraph::from_edges(n, edges))
                })
                .collect::<HashSet<DenseGraph>>();
            assert_eq!(*expected, forms.len(), "graphs on {} vertices", n);
        }
    }

    #[test]
    fn test_storage_is_reusable() {
        let first = petersen();
        let second = DenseGraph::cycle(6);
        let mut partition = OrderedPartition::new(10, 15, None);
        let mut storage = CanonicalStorage::new(4, 4);

        for graph in [&first, &second, &first].iter() {
            partition.reset(graph.n(), graph.m(), None);
            let canonical = canonical_isomorph_allocated(
                graph.n(),
                graph.m(),
                &graph.adjacency(),
                &mut partition,
                &mut storage,
                &mut CanonicalOptions::default(),
            )
            .unwrap();
            assert_eq!(canonical_isomorph(*graph), canonical.permutation);
        }
    }

    #[test]
    fn test_viability_check_gives_up() {
        // Vertex 1 hangs off a vertex of degree two, so refinement moves it
        // in front of the last vertex 4.
        let graph = DenseGraph::from_edge_list(5, &[(0, 2), (1, 2), (0, 3), (0, 4)]).unwrap();
        let mut partition = OrderedPartition::new(5, 4, None);
        let mut storage = CanonicalStorage::new(5, 4);
        let mut options = CanonicalOptions {
            check_viability: Some(crate::bitset::VertexSet::from_vertices(&[1, 3])),
        };
        let result = canonical_isomorph_allocated(
            5,
            4,
            &graph.adjacency(),
            &mut partition,
            &mut storage,
            &mut options,
        );
        assert!(result.is_none());
        assert_eq!(None, options.check_viability);
    }
}
