//! Disjoint sets over `{0, ..., n-1}` with union by rank
//! and path compression. Used to collect vertex orbits
//! during the canonical search and orbits of subsets
//! during the generation.
use std::fmt;

/// Each entry is either a parent index or, for a root,
/// the negated rank minus one (a singleton holds `-1`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisjointSet {
    entries: Vec<isize>,
}

impl DisjointSet {
    /// Every element starts in its own set.
    pub fn new(n: usize) -> Self {
        DisjointSet {
            entries: vec![-1; n],
        }
    }

    /// All elements in one set rooted at 0.
    pub fn single_class(n: usize) -> Self {
        let mut entries = vec![0; n];
        if let Some(root) = entries.first_mut() {
            *root = if n > 1 { -2 } else { -1 };
        }
        DisjointSet { entries }
    }

    /// Turn this back into `n` singletons, reusing the allocation.
    pub fn reset(&mut self, n: usize) {
        self.entries.clear();
        self.entries.resize(n, -1);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_root(&self, x: usize) -> bool {
        self.entries[x] < 0
    }

    /// Returns the root of the set containing `x` and
    /// points every visited element directly at it.
    /// Panics if `x` is out of range.
    pub fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.entries[root] >= 0 {
            root = self.entries[root] as usize;
        }

        let mut current = x;
        while self.entries[current] >= 0 {
            let parent = self.entries[current] as usize;
            self.entries[current] = root as isize;
            current = parent;
        }

        root
    }

    /// Same as [`DisjointSet::find`] but records the visited
    /// path in `buffer` which the caller keeps around between calls.
    pub fn find_buffered(&mut self, x: usize, buffer: &mut Vec<usize>) -> usize {
        buffer.clear();
        let mut current = x;
        while self.entries[current] >= 0 {
            buffer.push(current);
            current = self.entries[current] as usize;
        }
        for &seen in buffer.iter() {
            self.entries[seen] = current as isize;
        }
        current
    }

    /// Merges the sets containing `x` and `y`. The root with the
    /// higher rank wins, on a tie `y`'s root wins and gains a rank.
    pub fn union(&mut self, x: usize, y: usize) {
        let root_x = self.find(x);
        let root_y = self.find(y);
        self.link(root_x, root_y);
    }

    pub fn union_buffered(&mut self, x: usize, y: usize, buffer: &mut Vec<usize>) {
        let root_x = self.find_buffered(x, buffer);
        let root_y = self.find_buffered(y, buffer);
        self.link(root_x, root_y);
    }

    fn link(&mut self, root_x: usize, root_y: usize) {
        if root_x == root_y {
            return;
        }
        let (rank_x, rank_y) = (self.entries[root_x], self.entries[root_y]);
        if rank_x < rank_y {
            self.entries[root_y] = root_x as isize;
        } else if rank_y < rank_x {
            self.entries[root_x] = root_y as isize;
        } else {
            self.entries[root_x] = root_y as isize;
            self.entries[root_y] -= 1;
        }
    }

    /// The sets, each sorted ascending and ordered
    /// by their smallest element.
    pub fn sets(&mut self) -> Vec<Vec<usize>> {
        let mut slot_of_root = vec![usize::MAX; self.len()];
        let mut sets: Vec<Vec<usize>> = Vec::new();
        for element in 0..self.len() {
            let root = self.find(element);
            if slot_of_root[root] == usize::MAX {
                slot_of_root[root] = sets.len();
                sets.push(Vec::new());
            }
            sets[slot_of_root[root]].push(element);
        }
        sets
    }

    /// One element from each set, namely the current roots.
    pub fn roots(&self) -> Vec<usize> {
        (0..self.len()).filter(|&x| self.is_root(x)).collect()
    }

    pub fn number_of_sets(&self) -> usize {
        self.entries.iter().filter(|entry| **entry < 0).count()
    }
}

impl fmt::Display for DisjointSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut copy = self.clone();
        write!(f, "{:?}", copy.sets())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_new_is_singletons() {
        let mut ds = DisjointSet::new(4);
        assert_eq!(4, ds.number_of_sets());
        assert_eq!(vec![vec![0], vec![1], vec![2], vec![3]], ds.sets());
        assert_eq!(vec![0, 1, 2, 3], ds.roots());
    }

    #[test]
    fn test_union_transitive() {
        let mut ds = DisjointSet::new(7);
        ds.union(0, 4);
        ds.union(4, 6);
        ds.union(2, 3);

        assert_eq!(ds.find(0), ds.find(6));
        assert_eq!(ds.find(2), ds.find(3));
        assert_ne!(ds.find(0), ds.find(2));
        assert_ne!(ds.find(1), ds.find(5));
        assert_eq!(vec![vec![0, 4, 6], vec![1], vec![2, 3], vec![5]], ds.sets());
        assert_eq!(4, ds.number_of_sets());
    }

    #[test]
    fn test_union_by_rank() {
        let mut ds = DisjointSet::new(4);
        // Tie: the root of the second argument wins.
        ds.union(0, 1);
        assert!(ds.is_root(1));
        assert!(!ds.is_root(0));

        // Higher rank wins regardless of order.
        ds.union(1, 2);
        assert!(ds.is_root(1));
        ds.union(3, 0);
        assert!(ds.is_root(1));
        assert_eq!(vec![1], ds.roots());
    }

    #[test]
    fn test_union_same_set_is_noop() {
        let mut ds = DisjointSet::new(3);
        ds.union(0, 1);
        let before = ds.clone();
        ds.union(1, 0);
        assert_eq!(before, ds);
    }

    #[test]
    fn test_buffered_agrees() {
        let pairs = [(0, 1), (2, 3), (1, 3), (5, 6), (4, 6), (7, 0)];
        let mut plain = DisjointSet::new(9);
        let mut buffered = DisjointSet::new(9);
        let mut buffer = Vec::new();
        for &(x, y) in pairs.iter() {
            plain.union(x, y);
            buffered.union_buffered(x, y, &mut buffer);
        }
        for x in 0..9 {
            for y in 0..9 {
                assert_eq!(
                    plain.find(x) == plain.find(y),
                    buffered.find_buffered(x, &mut buffer) == buffered.find_buffered(y, &mut buffer)
                );
            }
        }
        assert_eq!(plain.sets(), buffered.sets());
    }

    #[test]
    fn test_sets_cover_everything_once() {
        let mut ds = DisjointSet::new(12);
        for x in (0..12).step_by(3) {
            ds.union(x, (x * 5) % 12);
        }
        let mut seen = ds.sets().into_iter().flatten().collect::<Vec<usize>>();
        seen.sort_unstable();
        assert_eq!((0..12).collect::<Vec<usize>>(), seen);
    }

    #[test]
    fn test_path_compression() {
        let mut ds = DisjointSet::new(5);
        ds.union(0, 1);
        ds.union(2, 3);
        ds.union(1, 3);
        let root = ds.find(0);
        assert_eq!(root as isize, ds.entries[0]);
    }

    #[test]
    fn test_single_class_and_reset() {
        let ds = DisjointSet::single_class(5);
        assert_eq!(1, ds.number_of_sets());

        let mut ds = DisjointSet::new(6);
        ds.union(5, 2);
        ds.union(4, 1);
        assert_eq!(4, ds.number_of_sets());

        ds.reset(3);
        assert_eq!(3, ds.number_of_sets());
        assert_eq!("[[0], [1], [2]]", ds.to_string());
    }
}
