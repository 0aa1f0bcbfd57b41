//! Ordered partitions of the vertex set which can be split,
//! refined to an equitable partition and rolled back again.
//!
//! Cells are stored as a permutation `order` of the vertices
//! together with the exclusive end position of every cell.
//! Each cell end remembers the age at which it was created so
//! that [`OrderedPartition::deage`] can remove exactly the cells
//! created since the last split, which is all the backtracking
//! search needs to undo a step in place.
//!
//! Alongside the cells the partition maintains `value`: once
//! the first `j` cells are singletons, the positions of the
//! edges among these vertices are known and encoded as
//! `j(j-1)/2 + k` for an edge between positions `k < j`.
//! Comparing these prefixes lets the search drop branches
//! which can no longer produce the largest leaf.
use std::ops::RangeInclusive;

use crate::bitset::VertexSet;

/// Scratch space for [`OrderedPartition::equitable_refinement`].
#[derive(Debug, Clone, Default)]
pub struct RefinementScratch {
    times_seen: Vec<usize>,
    max_count: Vec<usize>,
    number_of_max: Vec<usize>,
    keyed: Vec<(usize, usize)>,
    new_ends: Vec<usize>,
}

impl RefinementScratch {
    pub fn new(n: usize) -> Self {
        RefinementScratch {
            times_seen: vec![0; n],
            max_count: vec![0; n],
            number_of_max: vec![0; n],
            keyed: Vec::with_capacity(n),
            new_ends: Vec::with_capacity(n),
        }
    }

    fn prepare(&mut self, n: usize, cells: usize) {
        self.times_seen.clear();
        self.times_seen.resize(n, 0);
        self.max_count.clear();
        self.max_count.resize(cells, 0);
        self.number_of_max.clear();
        self.number_of_max.resize(cells, 0);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedPartition {
    max_n: usize,
    max_m: usize,
    n: usize,
    /// Vertices by position, sorted inside every cell unless split.
    order: Vec<usize>,
    /// Exclusive end position of each cell.
    cell_ends: Vec<usize>,
    /// Age at which each cell end was created.
    cell_ages: Vec<usize>,
    /// Sorted set of cells whose neighbourhoods may shatter others.
    to_recheck: Vec<usize>,
    age: usize,
    value: Vec<usize>,
    /// Number of leading singleton cells encoded in `value`.
    singleton_prefix: usize,
    /// Cell index of every vertex.
    in_cell: Vec<usize>,
}

impl OrderedPartition {
    /// Partition able to hold graphs with at most `n` vertices and `m`
    /// edges, initialised for exactly `n` vertices.
    pub fn new(n: usize, m: usize, vertex_classes: Option<&[Vec<usize>]>) -> Self {
        let mut partition = OrderedPartition {
            max_n: n,
            max_m: m,
            n: 0,
            order: Vec::with_capacity(n),
            cell_ends: Vec::with_capacity(n),
            cell_ages: Vec::with_capacity(n),
            to_recheck: Vec::with_capacity(n),
            age: 0,
            value: Vec::with_capacity(m),
            singleton_prefix: 0,
            in_cell: Vec::with_capacity(n),
        };
        partition.reset(n, m, vertex_classes);
        partition
    }

    /// Reinitialise for a graph with `n` vertices and `m` edges.
    /// Without vertex classes all vertices start in one cell,
    /// otherwise every class forms a cell in the given order.
    ///
    /// Panics if `n` or `m` exceed the sizes given to [`OrderedPartition::new`]
    /// or if the classes do not partition `0..n`.
    pub fn reset(&mut self, n: usize, m: usize, vertex_classes: Option<&[Vec<usize>]>) {
        assert!(
            n <= self.max_n,
            "the partition is too small for graphs with {} vertices (capacity: {})",
            n,
            self.max_n
        );
        assert!(
            m <= self.max_m,
            "the partition is too small for graphs with {} edges (capacity: {})",
            m,
            self.max_m
        );

        self.n = n;
        self.order.clear();
        self.cell_ends.clear();
        self.cell_ages.clear();
        self.to_recheck.clear();
        self.in_cell.clear();
        self.in_cell.resize(n, 0);
        self.value.clear();
        self.age = 0;
        self.singleton_prefix = 0;

        if n == 0 {
            return;
        }

        match vertex_classes {
            None => {
                self.order.extend(0..n);
                self.cell_ends.push(n);
                self.to_recheck.push(0);
            }
            Some(classes) => {
                let mut seen = vec![false; n];
                for (class_index, class) in classes.iter().enumerate() {
                    assert!(!class.is_empty(), "vertex class {} is empty", class_index);
                    let start = self.order.len();
                    for &v in class {
                        assert!(v < n && !seen[v], "vertex classes do not partition 0..{}", n);
                        seen[v] = true;
                        self.order.push(v);
                        self.in_cell[v] = class_index;
                    }
                    self.order[start..].sort_unstable();
                    self.cell_ends.push(self.order.len());
                    self.to_recheck.push(class_index);
                }
                assert_eq!(n, self.order.len(), "vertex classes do not cover 0..{}", n);
            }
        }
        self.cell_ages.resize(self.cell_ends.len(), 0);
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn order(&self) -> &[usize] {
        &self.order
    }

    pub fn value(&self) -> &[usize] {
        &self.value
    }

    pub fn cell_count(&self) -> usize {
        self.cell_ends.len()
    }

    pub fn cell_of(&self, vertex: usize) -> usize {
        self.in_cell[vertex]
    }

    pub fn is_discrete(&self) -> bool {
        self.cell_ends.len() == self.n
    }

    /// Members of every cell, in position order.
    pub fn cells(&self) -> Vec<Vec<usize>> {
        (0..self.cell_count())
            .map(|cell| self.order[self.cell_start(cell)..self.cell_ends[cell]].to_vec())
            .collect()
    }

    /// Start and exclusive end position of the first cell with more
    /// than one vertex.
    pub fn first_non_singleton(&self) -> Option<(usize, usize)> {
        (0..self.cell_count())
            .map(|cell| (self.cell_start(cell), self.cell_ends[cell]))
            .find(|(start, end)| end - start > 1)
    }

    #[inline]
    fn cell_start(&self, cell: usize) -> usize {
        if cell == 0 {
            0
        } else {
            self.cell_ends[cell - 1]
        }
    }

    fn mark_for_recheck(&mut self, cells: RangeInclusive<usize>) {
        for cell in cells {
            if let Err(slot) = self.to_recheck.binary_search(&cell) {
                self.to_recheck.insert(slot, cell);
            }
        }
    }

    fn recompute_in_cell(&mut self) {
        let mut cell = 0;
        for (position, &vertex) in self.order.iter().enumerate() {
            if self.cell_ends[cell] == position {
                cell += 1;
            }
            self.in_cell[vertex] = cell;
        }
    }

    /// Individualises the vertex at `position` by moving it to the
    /// front of its cell. Ages the partition. Returns whether the
    /// extended value proves this branch worse than `current_best`.
    pub fn split_cell(
        &mut self,
        position: usize,
        neighbours: &[Vec<usize>],
        current_best: &[usize],
        first_leaf: &[usize],
    ) -> bool {
        assert!(position < self.n, "position {} is outside the partition", position);
        self.age += 1;

        let cell = self.cell_ends.partition_point(|&end| end <= position);
        let start = self.cell_start(cell);
        self.order[start..=position].rotate_right(1);
        for &vertex in self.order[start + 1..].iter() {
            self.in_cell[vertex] += 1;
        }

        self.cell_ends.insert(cell, start + 1);
        self.cell_ages.insert(cell, self.age);
        for recheck in self.to_recheck.iter_mut().rev() {
            if *recheck <= cell {
                break;
            }
            *recheck += 1;
        }
        self.mark_for_recheck(cell..=cell + 1);

        if cell == self.singleton_prefix {
            return self.expand_value(neighbours, current_best, first_leaf);
        }
        false
    }

    /// Encodes the adjacency of every new leading singleton cell into
    /// `value`. Returns `true` as soon as `value` is smaller than the
    /// same length prefix of `current_best` while differing from
    /// `first_leaf`.
    pub fn expand_value(
        &mut self,
        neighbours: &[Vec<usize>],
        current_best: &[usize],
        first_leaf: &[usize],
    ) -> bool {
        let mut j = self.singleton_prefix;
        while j < self.n {
            // All earlier cells are singletons, so cell j starts at position j.
            if self.cell_ends[j] != j + 1 {
                self.singleton_prefix = j;
                return false;
            }

            let u = self.order[j];
            let chunk = self.value.len();
            for &v in neighbours[u].iter() {
                let k = self.in_cell[v];
                if k < j {
                    self.value.push(j * (j - 1) / 2 + k);
                }
            }
            self.value[chunk..].sort_unstable();
            j += 1;

            if !current_best.is_empty() {
                let len = self.value.len();
                if self.value[..] < current_best[..len] && self.value[..] != first_leaf[..len] {
                    self.singleton_prefix = j;
                    return true;
                }
            }
        }
        self.singleton_prefix = self.n;
        false
    }

    /// Undoes every split made at the current age and steps the age back.
    pub fn deage(&mut self) {
        assert!(self.age > 0, "cannot deage a partition of age 0");
        let age = self.age;

        let mut kept = 0;
        let mut previous: Option<usize> = None;
        let mut previous_end = 0;
        for i in 0..self.cell_ages.len() {
            if self.cell_ages[i] == age {
                continue;
            }
            self.cell_ends[kept] = self.cell_ends[i];
            self.cell_ages[kept] = self.cell_ages[i];

            let merged = match previous {
                Some(previous) => i - previous > 1,
                None => i > 0,
            };
            if merged {
                if kept < self.singleton_prefix {
                    self.singleton_prefix = kept;
                    let first_dropped = kept * kept.saturating_sub(1) / 2;
                    let keep = self.value.partition_point(|&entry| entry < first_dropped);
                    self.value.truncate(keep);
                }
                self.order[previous_end..self.cell_ends[kept]].sort_unstable();
            }

            previous = Some(i);
            previous_end = self.cell_ends[kept];
            kept += 1;
        }

        self.cell_ends.truncate(kept);
        self.cell_ages.truncate(kept);
        self.to_recheck.clear();
        self.recompute_in_cell();
        self.age -= 1;
    }

    /// Refines until every cell has, for every other cell, the same
    /// number of neighbours in it for all its vertices.
    ///
    /// Returns `true` once the value proves the branch worse (see
    /// [`OrderedPartition::expand_value`]) or, if `viability` is given,
    /// once one of the viable vertices lands in an earlier cell than
    /// the last vertex. In both cases the refinement may be incomplete.
    pub fn equitable_refinement(
        &mut self,
        neighbours: &[Vec<usize>],
        scratch: &mut RefinementScratch,
        current_best: &[usize],
        first_leaf: &[usize],
        viability: Option<VertexSet>,
    ) -> bool {
        let n = self.n;

        while let Some(splitter) = self.to_recheck.pop() {
            let cells = self.cell_count();
            scratch.prepare(n, cells);

            for position in self.cell_start(splitter)..self.cell_ends[splitter] {
                let w = self.order[position];
                for &v in neighbours[w].iter() {
                    scratch.times_seen[v] += 1;
                    let seen = scratch.times_seen[v];
                    let cell = self.in_cell[v];
                    if seen > scratch.max_count[cell] {
                        scratch.max_count[cell] = seen;
                        scratch.number_of_max[cell] = 1;
                    } else if seen == scratch.max_count[cell] {
                        scratch.number_of_max[cell] += 1;
                    }
                }
            }

            // Later cells first so that earlier cell indices stay valid.
            for j in (0..cells).rev() {
                let start = self.cell_start(j);
                let size = self.cell_ends[j] - start;
                if size == 1
                    || scratch.max_count[j] == 0
                    || scratch.number_of_max[j] == size
                {
                    continue;
                }

                scratch.keyed.clear();
                scratch.keyed.extend(
                    self.order[start..start + size]
                        .iter()
                        .map(|&v| (scratch.times_seen[v], v)),
                );
                scratch.keyed.sort_by_key(|&(count, _)| count);

                scratch.new_ends.clear();
                for (k, &(count, vertex)) in scratch.keyed.iter().enumerate() {
                    self.order[start + k] = vertex;
                    if k > 0 && count != scratch.keyed[k - 1].0 {
                        scratch.new_ends.push(start + k);
                    }
                }
                let added = scratch.new_ends.len();

                for recheck in self.to_recheck.iter_mut().rev() {
                    if *recheck <= j {
                        break;
                    }
                    *recheck += added;
                }
                self.cell_ends
                    .splice(j..j, scratch.new_ends.iter().copied());
                let age = self.age;
                self.cell_ages
                    .splice(j..j, std::iter::repeat(age).take(added));
                self.mark_for_recheck(j..=j + added);
                self.recompute_in_cell();

                if j == self.singleton_prefix
                    && self.expand_value(neighbours, current_best, first_leaf)
                {
                    return true;
                }

                if let Some(viable) = viability {
                    let last_cell = self.in_cell[n - 1];
                    if viable.iter().any(|v| self.in_cell[v] < last_cell) {
                        return true;
                    }
                }
            }
        }

        false
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn path(n: usize) -> Vec<Vec<usize>> {
        (0..n)
            .map(|v| {
                let mut neighbours = Vec::new();
                if v > 0 {
                    neighbours.push(v - 1);
                }
                if v + 1 < n {
                    neighbours.push(v + 1);
                }
                neighbours
            })
            .collect()
    }

    fn refine(partition: &mut OrderedPartition, neighbours: &[Vec<usize>]) -> bool {
        let mut scratch = RefinementScratch::new(partition.n());
        partition.equitable_refinement(neighbours, &mut scratch, &[], &[], None)
    }

    #[test]
    fn test_reset_default() {
        let partition = OrderedPartition::new(5, 4, None);
        assert_eq!(&[0, 1, 2, 3, 4], partition.order());
        assert_eq!(1, partition.cell_count());
        assert!(partition.value().is_empty());
        assert!(!partition.is_discrete());
        assert_eq!(Some((0, 5)), partition.first_non_singleton());
    }

    #[test]
    fn test_reset_with_classes() {
        let classes = vec![vec![2], vec![3, 0, 1]];
        let partition = OrderedPartition::new(4, 3, Some(classes.as_slice()));
        assert_eq!(&[2, 0, 1, 3], partition.order());
        assert_eq!(0, partition.cell_of(2));
        assert_eq!(1, partition.cell_of(3));
        assert_eq!(vec![vec![2], vec![0, 1, 3]], partition.cells());
    }

    #[test]
    #[should_panic]
    fn test_reset_beyond_capacity() {
        let mut partition = OrderedPartition::new(4, 3, None);
        partition.reset(5, 3, None);
    }

    #[test]
    fn test_refine_path() {
        let neighbours = path(4);
        let mut partition = OrderedPartition::new(4, 3, None);
        assert!(!refine(&mut partition, &neighbours));
        // Ends of the path have degree 1, the middle vertices degree 2.
        assert_eq!(vec![vec![0, 3], vec![1, 2]], partition.cells());
    }

    #[test]
    fn test_refine_regular_graph_keeps_one_cell() {
        let cycle = (0..6)
            .map(|v| vec![(v + 5) % 6, (v + 1) % 6])
            .collect::<Vec<_>>();
        let mut partition = OrderedPartition::new(6, 6, None);
        assert!(!refine(&mut partition, &cycle));
        assert_eq!(1, partition.cell_count());
    }

    #[test]
    fn test_split_refine_deage_restores() {
        let neighbours = path(4);
        let mut partition = OrderedPartition::new(4, 3, None);
        let mut scratch = RefinementScratch::new(4);
        partition.equitable_refinement(&neighbours, &mut scratch, &[], &[], None);
        let before = partition.clone();

        assert!(!partition.split_cell(1, &neighbours, &[], &[]));
        assert!(!partition.equitable_refinement(&neighbours, &mut scratch, &[], &[], None));
        assert!(partition.is_discrete());
        assert_eq!(&[3, 0, 2, 1], partition.order());
        assert_eq!(&[1, 4, 5], partition.value());

        partition.deage();
        assert_eq!(before, partition);
    }

    #[test]
    fn test_value_prunes_worse_branch() {
        let neighbours = path(4);
        let mut partition = OrderedPartition::new(4, 3, None);
        let mut scratch = RefinementScratch::new(4);
        partition.equitable_refinement(&neighbours, &mut scratch, &[], &[], None);
        let before = partition.clone();

        // Any leaf of the path gives [1, 4, 5], a larger best prunes it.
        let best = [2, 4, 5];
        let worse = partition.split_cell(0, &neighbours, &best, &best)
            || partition.equitable_refinement(&neighbours, &mut scratch, &best, &best, None);
        assert!(worse);
        partition.deage();
        assert_eq!(before, partition);
    }

    #[test]
    fn test_viability_check() {
        // A star with centre 0 and leaves 2, 3, 4 plus vertex 1 hanging off 2.
        let neighbours = vec![vec![2, 3, 4], vec![2], vec![0, 1], vec![0], vec![0]];
        let mut scratch = RefinementScratch::new(5);

        // Vertex 1 is separated from 4 and sorted in front of it.
        let mut partition = OrderedPartition::new(5, 4, None);
        let viable = VertexSet::from_vertices(&[1, 3]);
        assert!(partition.equitable_refinement(&neighbours, &mut scratch, &[], &[], Some(viable)));

        // Vertex 3 stays in the cell of 4.
        let mut partition = OrderedPartition::new(5, 4, None);
        let viable = VertexSet::singleton(3);
        assert!(!partition.equitable_refinement(&neighbours, &mut scratch, &[], &[], Some(viable)));
        assert_eq!(partition.cell_of(3), partition.cell_of(4));
    }
}
