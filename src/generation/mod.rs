//! Orderly generation of all graphs on `n` vertices up to isomorphism
//! by canonical deletion.
//!
//! Graphs are grown one vertex at a time. Every graph of the search
//! tree proposes one neighbourhood per orbit of its automorphism group
//! on vertex subsets, and a child is kept only if its new vertex is the
//! one a canonical deletion would remove again. Each isomorphism class
//! is therefore reached along exactly one path.
//!
//! The search runs as an explicit stack machine behind [`Generator`],
//! so it can be stopped, saved and resumed between any two graphs.
mod augment;
mod checkpoint;
mod parallel;

pub use augment::{SearchGraph, Verdict};
pub use checkpoint::{Checkpoint, CHECKPOINT_VERSION};
pub use parallel::{count, generate, CancelToken, ParallelGeneration};

use custom_debug_derive::Debug;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::{
    bitset::VertexSet,
    debug::opt_fmt,
    graph::DenseGraph,
    statistics::{GenerationStatistics, Rejection, StatisticsLevel},
};

/// Largest number of vertices the generation supports.
pub const MAX_VERTICES: usize = 62;

/// Predicate rejecting a graph and everything grown from it.
pub type PruneFn = Arc<dyn Fn(&DenseGraph) -> bool + Send + Sync>;

pub fn no_pruning() -> PruneFn {
    Arc::new(|_: &DenseGraph| false)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Nothing has been done yet.
    Start,
    /// The current graph is a new node of the search tree.
    Visit,
    /// Looking for the next child, or going back up.
    Step,
    Done,
}

/// The `i`th augmentation of a node at depth `split_level(n)` is only
/// explored by the generator with `residue == i % modulus`.
pub fn split_level(n: usize) -> usize {
    (2 * (n + 1) / 3).saturating_sub(1)
}

#[derive(Debug)]
pub struct Generator {
    n: usize,
    residue: usize,
    modulus: usize,
    search: SearchGraph,
    /// Untried augmentations of all nodes on the current path.
    #[debug(skip)]
    choices: Vec<VertexSet>,
    /// Number of untried augmentations per level.
    path: Vec<usize>,
    /// No child has been added below the current node yet.
    step_forward: bool,
    phase: Phase,
    #[debug(skip)]
    preprune: PruneFn,
    #[debug(skip)]
    prune: PruneFn,
    #[debug(with = "opt_fmt")]
    statistics: Option<GenerationStatistics>,
    #[debug(skip)]
    cancel: Option<CancelToken>,
}

impl Generator {
    /// All graphs on `n` vertices.
    pub fn all(n: usize) -> Self {
        Generator::new(n, 0, 1)
    }

    /// The share of the graphs on `n` vertices belonging to `residue`.
    /// The generators for all residues of one modulus together produce
    /// every graph exactly once.
    pub fn new(n: usize, residue: usize, modulus: usize) -> Self {
        Generator::with_pruning(n, residue, modulus, no_pruning(), no_pruning())
    }

    /// `preprune` sees every augmented graph before the canonicity test,
    /// `prune` only the canonical ones. Neither is applied to graphs on
    /// zero vertices and only `prune` to the graph on one vertex.
    ///
    /// Panics if `modulus` is zero, `residue >= modulus` or `n` is above
    /// [`MAX_VERTICES`].
    pub fn with_pruning(
        n: usize,
        residue: usize,
        modulus: usize,
        preprune: PruneFn,
        prune: PruneFn,
    ) -> Self {
        assert!(modulus > 0, "the modulus must be positive");
        assert!(
            residue < modulus,
            "residue {} is not below the modulus {}",
            residue,
            modulus
        );
        assert!(
            n <= MAX_VERTICES,
            "cannot generate graphs with {} vertices (at most {})",
            n,
            MAX_VERTICES
        );

        Generator {
            n,
            residue,
            modulus,
            search: SearchGraph::new(DenseGraph::new(n.min(1)), n),
            choices: Vec::new(),
            path: Vec::with_capacity(n),
            step_forward: false,
            phase: Phase::Start,
            preprune,
            prune,
            statistics: None,
            cancel: None,
        }
    }

    pub fn with_statistics(mut self, level: StatisticsLevel) -> Self {
        self.statistics = match level {
            StatisticsLevel::None => None,
            _ => Some(GenerationStatistics::new(
                level,
                self.n,
                self.residue,
                self.modulus,
            )),
        };
        self
    }

    /// Stops the generation once `token` is cancelled.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn statistics(&self) -> Option<&GenerationStatistics> {
        self.statistics.as_ref()
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn residue(&self) -> usize {
        self.residue
    }

    pub fn modulus(&self) -> usize {
        self.modulus
    }

    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }

    fn finish(&mut self) {
        if self.phase != Phase::Done {
            self.phase = Phase::Done;
            if let Some(statistics) = self.statistics.as_mut() {
                statistics.log_end();
            }
            info!(
                n = self.n,
                residue = self.residue,
                modulus = self.modulus,
                "generation finished"
            );
        }
    }

    fn reject(&mut self, rejection: Rejection) {
        if let Some(statistics) = self.statistics.as_mut() {
            statistics.log_rejection(rejection);
        }
    }

    /// Graphs on zero or one vertex are the only ones of their size.
    fn trivial(&mut self) -> Option<DenseGraph> {
        let graph = DenseGraph::new(self.n);
        self.finish();
        if self.residue == 0 && !(self.prune)(&graph) {
            if let Some(statistics) = self.statistics.as_mut() {
                statistics.log_emitted();
            }
            Some(graph)
        } else {
            None
        }
    }

    fn start(&mut self) {
        info!(
            n = self.n,
            residue = self.residue,
            modulus = self.modulus,
            "generation started"
        );
        if (self.prune)(self.search.graph()) {
            self.finish();
        } else {
            self.phase = Phase::Visit;
        }
    }

    /// Tries the remaining augmentations of the current node until
    /// one gives a new node. Goes back up when there are none left.
    fn step(&mut self) {
        if self.choices.is_empty() {
            self.finish();
            return;
        }

        let level = self.path.len();
        let remaining = self.path[level - 1];
        for i in (0..remaining).rev() {
            let choice = match self.choices.pop() {
                Some(choice) => choice,
                None => unreachable!("every level owns as many choices as it counts"),
            };
            if level == split_level(self.n) && i % self.modulus != self.residue {
                continue;
            }

            if !self.step_forward {
                self.search.remove_last_vertex();
            }
            self.step_forward = false;
            self.search.add_vertex(choice);
            let vertices = self.search.n();
            if let Some(statistics) = self.statistics.as_mut() {
                statistics.log_augmentation(vertices);
            }

            if (self.preprune)(self.search.graph()) {
                self.reject(Rejection::Preprune);
                continue;
            }

            let verdict = self.search.is_canonical(self.statistics.as_mut());
            if let Some(rejection) = verdict.rejection() {
                self.reject(rejection);
                continue;
            }
            if (self.prune)(self.search.graph()) {
                self.reject(Rejection::Prune);
                continue;
            }

            if let Some(statistics) = self.statistics.as_mut() {
                statistics.log_accepted(vertices);
            }
            self.path[level - 1] = i;
            self.phase = Phase::Visit;
            return;
        }

        if !self.step_forward {
            self.search.remove_last_vertex();
        }
        self.step_forward = false;
        self.path.pop();
    }
}

impl Iterator for Generator {
    type Item = DenseGraph;

    fn next(&mut self) -> Option<DenseGraph> {
        loop {
            let cancelled = self
                .cancel
                .as_ref()
                .map_or(false, |token| token.is_cancelled());
            if cancelled && self.phase != Phase::Done {
                // The search state stays intact so it can still be saved.
                debug!(residue = self.residue, "generation cancelled");
                return None;
            }

            match self.phase {
                Phase::Done => return None,
                Phase::Start if self.n < 2 => return self.trivial(),
                Phase::Start => self.start(),
                Phase::Visit => {
                    self.phase = Phase::Step;
                    if self.search.n() == self.n {
                        if let Some(statistics) = self.statistics.as_mut() {
                            statistics.log_emitted();
                        }
                        return Some(self.search.graph().clone());
                    }
                    let augmentations = self.search.augmentations(self.statistics.as_mut());
                    self.path.push(augmentations.len());
                    self.choices.extend(augmentations);
                    self.step_forward = true;
                }
                Phase::Step => self.step(),
            }
        }
    }
}
