//! Running the residues of one modulus side by side.
use crossbeam::channel::{self, Receiver, SendTimeoutError};
use rayon::prelude::*;
use std::{
    any::Any,
    panic,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};
use tracing::{debug, info, instrument, warn};

use super::{Generator, PruneFn};
use crate::graph::DenseGraph;

/// How long a worker waits on a full channel before it
/// checks for cancellation again.
const SEND_POLL: Duration = Duration::from_millis(50);

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

/// Shared flag telling generators to stop.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// The merged output of one worker thread per residue.
/// Dropping it cancels and joins the workers.
#[derive(Debug)]
pub struct ParallelGeneration {
    receiver: Receiver<DenseGraph>,
    workers: Vec<JoinHandle<()>>,
    token: CancelToken,
}

/// Generates all graphs on `n` vertices which survive the pruning
/// with `workers` threads, residue `a` on thread `a`. At most
/// `capacity` graphs wait in the channel.
#[instrument(skip(preprune, prune))]
pub fn generate(
    n: usize,
    workers: usize,
    preprune: PruneFn,
    prune: PruneFn,
    capacity: usize,
) -> ParallelGeneration {
    assert!(workers > 0, "at least one worker is needed");
    let (sender, receiver) = channel::bounded(capacity);
    let token = CancelToken::new();

    let handles = (0..workers)
        .map(|residue| {
            let sender = sender.clone();
            let token = token.clone();
            let preprune = preprune.clone();
            let prune = prune.clone();
            thread::spawn(move || {
                info!(residue, "worker started");
                let generator = Generator::with_pruning(n, residue, workers, preprune, prune)
                    .with_cancel(token.clone());
                let mut sent = 0usize;
                for graph in generator {
                    let mut pending = graph;
                    loop {
                        match sender.send_timeout(pending, SEND_POLL) {
                            Ok(()) => break,
                            Err(SendTimeoutError::Timeout(graph)) => {
                                if token.is_cancelled() {
                                    debug!(residue, "worker cancelled while blocked");
                                    return;
                                }
                                pending = graph;
                            }
                            Err(SendTimeoutError::Disconnected(_)) => return,
                        }
                    }
                    sent += 1;
                }
                info!(residue, sent, "worker finished");
            })
        })
        .collect();

    ParallelGeneration {
        receiver,
        workers: handles,
        token,
    }
}

impl ParallelGeneration {
    /// Stops all workers. Graphs already in the channel may still arrive.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Joins the workers and re-raises the first panic among them.
    fn join(&mut self) {
        let mut first_panic = None;
        for worker in self.workers.drain(..) {
            if let Err(payload) = worker.join() {
                if first_panic.is_none() {
                    first_panic = Some(payload);
                }
            }
        }
        if let Some(payload) = first_panic {
            panic::resume_unwind(payload);
        }
    }
}

impl Iterator for ParallelGeneration {
    type Item = DenseGraph;

    fn next(&mut self) -> Option<DenseGraph> {
        match self.receiver.recv() {
            Ok(graph) => Some(graph),
            // Every sender is gone, so every worker has returned.
            Err(_) => {
                self.join();
                None
            }
        }
    }
}

impl Drop for ParallelGeneration {
    fn drop(&mut self) {
        self.token.cancel();
        for worker in self.workers.drain(..) {
            if let Err(payload) = worker.join() {
                warn!(panic = panic_message(&*payload), "worker panicked");
            }
        }
    }
}

/// Number of graphs on `n` vertices, counting the `shards` residues in parallel.
pub fn count(n: usize, shards: usize) -> usize {
    assert!(shards > 0, "at least one shard is needed");
    (0..shards)
        .into_par_iter()
        .map(|residue| Generator::new(n, residue, shards).count())
        .sum()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{canonical::canonical_form, generation::no_pruning, graph::Graph};
    use std::collections::HashSet;

    #[test]
    fn test_parallel_generation_is_complete() {
        let graphs = generate(7, 3, no_pruning(), no_pruning(), 16).collect::<Vec<DenseGraph>>();
        assert_eq!(1044, graphs.len());
        let forms = graphs.iter().map(canonical_form).collect::<HashSet<DenseGraph>>();
        assert_eq!(1044, forms.len());
    }

    #[test]
    fn test_parallel_generation_with_pruning() {
        let prune: PruneFn = Arc::new(|graph: &DenseGraph| graph.m() > 3);
        // Graphs on six vertices with at most three edges.
        let graphs = generate(6, 2, no_pruning(), prune, 4).count();
        assert_eq!(1 + 1 + 2 + 5, graphs);
    }

    #[test]
    fn test_cancel_stops_workers() {
        let mut generation = generate(8, 4, no_pruning(), no_pruning(), 1);
        assert_eq!(5, generation.by_ref().take(5).count());
        generation.cancel();
        // The channel holds at most one graph per worker still blocked
        // in between, everything else stops.
        assert!(generation.count() < 12346 - 5);
    }

    #[test]
    fn test_drop_joins_workers() {
        let mut generation = generate(8, 2, no_pruning(), no_pruning(), 1);
        assert!(generation.next().is_some());
        drop(generation);
    }

    fn panicking_prune() -> PruneFn {
        Arc::new(|graph: &DenseGraph| {
            if graph.n() >= 3 {
                panic!("prune failed");
            }
            false
        })
    }

    #[test]
    #[should_panic(expected = "prune failed")]
    fn test_worker_panic_is_raised() {
        generate(5, 2, no_pruning(), panicking_prune(), 4).for_each(drop);
    }

    #[test]
    fn test_drop_survives_worker_panic() {
        let generation = generate(5, 2, no_pruning(), panicking_prune(), 4);
        thread::sleep(Duration::from_millis(100));
        drop(generation);
    }

    #[test]
    fn test_panic_message() {
        let literal: Box<dyn Any + Send> = Box::new("literal");
        let formatted: Box<dyn Any + Send> = Box::new(format!("formatted {}", 1));
        let other: Box<dyn Any + Send> = Box::new(7);
        assert_eq!("literal", panic_message(&*literal));
        assert_eq!("formatted 1", panic_message(&*formatted));
        assert_eq!("unknown panic", panic_message(&*other));
    }

    #[test]
    fn test_count() {
        assert_eq!(156, count(6, 1));
        assert_eq!(1044, count(7, 5));
        assert_eq!(1, count(0, 3));
    }
}
