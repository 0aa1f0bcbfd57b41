//! Depth first search over the tree of refined ordered partitions.
//!
//! Every leaf is a vertex ordering; the canonical labelling is the
//! leaf with the lexicographically largest value. Leaves which tie
//! with the best leaf or with the first leaf found give automorphisms,
//! which both collect the orbits and let the search skip subtrees.
use std::cmp::Ordering;

use super::{
    partition::OrderedPartition,
    storage::{CanonicalOptions, CanonicalStorage},
    Canonical,
};
use crate::{disjoint::DisjointSet, permutation::Permutation};

/// Canonical labelling, orbits and automorphism group generators of
/// the graph on `n` vertices and `m` edges with the given neighbour
/// lists, reusing `partition` and `storage`.
///
/// `partition` must have been reset for this graph, optionally with
/// vertex classes which the labelling then respects. Returns `None`
/// only if `options` asked for a viability check and it failed.
pub fn canonical_isomorph_allocated(
    n: usize,
    m: usize,
    neighbours: &[Vec<usize>],
    partition: &mut OrderedPartition,
    storage: &mut CanonicalStorage,
    options: &mut CanonicalOptions,
) -> Option<Canonical> {
    assert_eq!(
        n,
        partition.n(),
        "partition was reset for {} vertices but the graph has {}",
        partition.n(),
        n
    );
    assert!(
        neighbours.len() >= n,
        "missing neighbour lists for a graph with {} vertices",
        n
    );
    let viability = options.check_viability.take();

    if n == 0 {
        return Some(Canonical::empty());
    }
    if m == 0 {
        return Some(edgeless(partition));
    }

    storage.prepare(n);
    let CanonicalStorage {
        path,
        choices,
        generators,
        current_best,
        current_best_path,
        current_best_perm,
        current_best_perm_inv,
        current_best_orbits,
        first_leaf,
        first_leaf_path,
        first_leaf_perm_inv,
        first_leaf_orbits,
        buffer,
        image,
        refinement,
    } = storage;

    let mut count = 0;
    let mut skip_deage = false;

    partition.expand_value(neighbours, &[], &[]);
    let mut worse =
        partition.equitable_refinement(neighbours, refinement, current_best, first_leaf, viability);
    if viability.is_some() && worse {
        return None;
    }

    loop {
        if !worse && partition.is_discrete() {
            count += 1;
            match partition.value().cmp(current_best.as_slice()) {
                Ordering::Greater => {
                    current_best.clear();
                    current_best.extend_from_slice(partition.value());
                    current_best_path.clear();
                    current_best_path.extend_from_slice(path);
                    current_best_perm.clear();
                    current_best_perm.extend_from_slice(partition.order());
                    for (position, &vertex) in partition.order().iter().enumerate() {
                        current_best_perm_inv[vertex] = position;
                    }
                    current_best_orbits.reset(n);

                    if count == 1 {
                        first_leaf.clear();
                        first_leaf.extend_from_slice(partition.value());
                        first_leaf_path.clear();
                        first_leaf_path.extend_from_slice(path);
                        first_leaf_perm_inv.copy_from_slice(current_best_perm_inv);
                        first_leaf_orbits.reset(n);
                    }
                }
                Ordering::Equal => {
                    merge_orbits(partition.order(), current_best_perm_inv, current_best_orbits, buffer);
                    if merge_orbits(partition.order(), current_best_perm_inv, first_leaf_orbits, buffer) {
                        generators.push(automorphism(partition.order(), current_best_perm_inv, image));
                    }
                    retract(partition, path, choices, current_best_path);
                }
                Ordering::Less => {
                    if partition.value() == first_leaf.as_slice() {
                        if merge_orbits(partition.order(), first_leaf_perm_inv, first_leaf_orbits, buffer) {
                            generators.push(automorphism(partition.order(), first_leaf_perm_inv, image));
                        }
                        retract(partition, path, choices, first_leaf_path);
                    }
                }
            }
        } else if !worse {
            if let Some((start, end)) = partition.first_non_singleton() {
                choices.push(end);
                path.push(end - start);
                skip_deage = true;
            }
        }

        // Find the next node of the search tree.
        'step: loop {
            let remaining = match path.last() {
                Some(&remaining) => remaining,
                None => {
                    return Some(Canonical {
                        permutation: current_best_perm.clone(),
                        orbits: first_leaf_orbits.clone(),
                        generators: generators.clone(),
                    })
                }
            };

            for j in (0..remaining).rev() {
                if skip_deage {
                    skip_deage = false;
                } else {
                    partition.deage();
                }

                let choice = choices.len() - 1;
                choices[choice] -= 1;
                let position = choices[choice];
                let element = partition.order()[position];

                // Only orbit representatives need to be tried below
                // a node on the path to the first or the best leaf.
                let parent = &path[..path.len() - 1];
                if count > 0
                    && first_leaf_path.starts_with(parent)
                    && !first_leaf_orbits.is_root(element)
                {
                    skip_deage = true;
                    continue;
                }
                if count > 0
                    && current_best_path.starts_with(parent)
                    && !current_best_orbits.is_root(element)
                {
                    skip_deage = true;
                    continue;
                }

                let split_worse = partition.split_cell(position, neighbours, current_best, first_leaf);
                let level = path.len() - 1;
                path[level] = j;
                if split_worse {
                    continue;
                }
                break 'step;
            }

            // Every child of this node is done, go up.
            if skip_deage {
                skip_deage = false;
            } else {
                partition.deage();
            }
            path.pop();
            choices.pop();
        }

        worse = partition.equitable_refinement(neighbours, refinement, current_best, first_leaf, None);
    }
}

/// Unions every vertex with its image under the automorphism taking
/// the reference leaf to the current one. Returns whether any orbits merged.
fn merge_orbits(
    order: &[usize],
    reference_inverse: &[usize],
    orbits: &mut DisjointSet,
    buffer: &mut Vec<usize>,
) -> bool {
    let mut merged = false;
    for (vertex, &position) in reference_inverse.iter().enumerate() {
        let image = order[position];
        if orbits.find_buffered(image, buffer) != orbits.find_buffered(vertex, buffer) {
            orbits.union_buffered(vertex, image, buffer);
            merged = true;
        }
    }
    merged
}

fn automorphism(order: &[usize], reference_inverse: &[usize], image: &mut Vec<usize>) -> Permutation {
    image.clear();
    image.extend(reference_inverse.iter().map(|&position| order[position]));
    Permutation::new(image.clone())
}

/// Jumps back to the first level where `path` leaves `reference`,
/// all other nodes below it are equivalent to ones already seen.
fn retract(
    partition: &mut OrderedPartition,
    path: &mut Vec<usize>,
    choices: &mut Vec<usize>,
    reference: &[usize],
) {
    let last = path.len() - 1;
    let index = (0..last)
        .find(|&level| reference.get(level) != Some(&path[level]))
        .unwrap_or(last);
    for _ in index + 1..path.len() {
        partition.deage();
    }
    path.truncate(index + 1);
    choices.truncate(index + 1);
}

/// Every permutation fixing the cells is an automorphism of a
/// graph without edges, so the cells give the answer directly.
fn edgeless(partition: &OrderedPartition) -> Canonical {
    let n = partition.n();
    let cells = partition.cells();

    let orbits = if cells.len() == 1 {
        DisjointSet::single_class(n)
    } else {
        let mut orbits = DisjointSet::new(n);
        for cell in cells.iter() {
            for &vertex in cell[1..].iter() {
                orbits.union(cell[0], vertex);
            }
        }
        orbits
    };

    let mut generators = Vec::new();
    for cell in cells.iter().filter(|cell| cell.len() > 1) {
        let mut shift = (0..n).collect::<Vec<usize>>();
        for (k, &vertex) in cell.iter().enumerate() {
            shift[vertex] = cell[(k + 1) % cell.len()];
        }
        generators.push(Permutation::new(shift));

        if cell.len() > 2 {
            let mut transposition = (0..n).collect::<Vec<usize>>();
            transposition.swap(cell[0], cell[1]);
            generators.push(Permutation::new(transposition));
        }
    }

    Canonical {
        permutation: partition.order().to_vec(),
        orbits,
        generators,
    }
}
