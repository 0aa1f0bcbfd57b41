//! Saving and restoring the state of a [`Generator`].
//!
//! The search stack is all that is needed: the current graph, the
//! untried augmentations and their count per level. Automorphisms are
//! recomputed on demand after loading.
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use tracing::{debug, instrument};

use super::{Generator, Phase, PruneFn, SearchGraph, MAX_VERTICES};
use crate::{
    bitset::VertexSet,
    graph::{DenseGraph, Graph},
    Error,
};

pub const CHECKPOINT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub version: u32,
    pub n: usize,
    pub residue: usize,
    pub modulus: usize,
    pub graph: DenseGraph,
    pub choices: Vec<VertexSet>,
    pub path: Vec<usize>,
    pub step_forward: bool,
    pub phase: Phase,
}

fn invalid<T>(reason: String) -> Result<T, Error> {
    Err(Error::InvalidCheckpoint(reason))
}

impl Checkpoint {
    /// Checks that a generator could continue from this state.
    pub fn validate(&self) -> Result<(), Error> {
        if self.version != CHECKPOINT_VERSION {
            return invalid(format!(
                "version {} is not supported (expected {})",
                self.version, CHECKPOINT_VERSION
            ));
        }
        if self.n > MAX_VERTICES {
            return invalid(format!(
                "{} vertices exceed the limit of {}",
                self.n, MAX_VERTICES
            ));
        }
        if self.modulus == 0 || self.residue >= self.modulus {
            return invalid(format!(
                "residue {} modulo {} is not a valid split",
                self.residue, self.modulus
            ));
        }

        let k = self.graph.n();
        if k > self.n {
            return invalid(format!(
                "the graph has {} vertices but only {} are generated",
                k, self.n
            ));
        }
        if self.graph.edge_bits().len() != k * k.saturating_sub(1) / 2
            || DenseGraph::from_edges(k, self.graph.edge_bits().to_vec()) != self.graph
        {
            return invalid("the graph is inconsistent".to_string());
        }

        if self.choices.len() != self.path.iter().sum::<usize>() {
            return invalid(format!(
                "{} augmentations stored but the path counts {}",
                self.choices.len(),
                self.path.iter().sum::<usize>()
            ));
        }
        let mut offset = 0;
        for (level, &count) in self.path.iter().enumerate() {
            // Nodes at this level have `level + 1` vertices.
            let outside = self.choices[offset..offset + count]
                .iter()
                .any(|choice| choice.iter().any(|vertex| vertex > level));
            if outside {
                return invalid(format!(
                    "augmentation at level {} refers to missing vertices",
                    level
                ));
            }
            offset += count;
        }

        let consistent = match self.phase {
            Phase::Start => self.path.is_empty() && k == self.n.min(1),
            Phase::Visit => k == self.path.len() + 1,
            Phase::Step => k == self.path.len() + if self.step_forward { 0 } else { 1 },
            Phase::Done => true,
        };
        if !consistent {
            return invalid(format!(
                "a graph with {} vertices does not fit the phase {:?} at depth {}",
                k,
                self.phase,
                self.path.len()
            ));
        }
        Ok(())
    }
}

impl Generator {
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            version: CHECKPOINT_VERSION,
            n: self.n,
            residue: self.residue,
            modulus: self.modulus,
            graph: self.search.graph().clone(),
            choices: self.choices.clone(),
            path: self.path.clone(),
            step_forward: self.step_forward,
            phase: self.phase,
        }
    }

    /// Writes the state as JSON. The generator itself is unaffected
    /// and may continue independently of the saved copy.
    #[instrument(skip_all)]
    pub fn save<W: Write>(&self, writer: W) -> Result<(), Error> {
        let checkpoint = self.checkpoint();
        serde_json::to_writer(writer, &checkpoint)?;
        debug!(
            residue = self.residue,
            depth = self.path.len(),
            pending = self.choices.len(),
            "checkpoint saved"
        );
        Ok(())
    }

    /// Continues a generator from a [`Generator::save`]d state. Pruning
    /// functions are not saved and have to be passed again.
    #[instrument(skip_all)]
    pub fn load<R: Read>(reader: R, preprune: PruneFn, prune: PruneFn) -> Result<Self, Error> {
        let checkpoint: Checkpoint = serde_json::from_reader(reader)?;
        let generator = Generator::from_checkpoint(checkpoint, preprune, prune)?;
        debug!(
            residue = generator.residue,
            depth = generator.path.len(),
            pending = generator.choices.len(),
            "checkpoint loaded"
        );
        Ok(generator)
    }

    pub fn from_checkpoint(
        checkpoint: Checkpoint,
        preprune: PruneFn,
        prune: PruneFn,
    ) -> Result<Self, Error> {
        checkpoint.validate()?;

        let mut generator = Generator::with_pruning(
            checkpoint.n,
            checkpoint.residue,
            checkpoint.modulus,
            preprune,
            prune,
        );
        generator.search = SearchGraph::new(checkpoint.graph, checkpoint.n);
        generator.choices = checkpoint.choices;
        generator.path = checkpoint.path;
        generator.step_forward = checkpoint.step_forward;
        generator.phase = checkpoint.phase;
        Ok(generator)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::generation::no_pruning;

    fn reload(generator: &Generator) -> Result<Generator, Error> {
        let mut saved = Vec::new();
        generator.save(&mut saved)?;
        Generator::load(saved.as_slice(), no_pruning(), no_pruning())
    }

    #[test]
    fn test_save_at_start() -> Result<(), Error> {
        let generator = Generator::all(7);
        assert_eq!(1044, reload(&generator)?.count());
        Ok(())
    }

    #[test]
    fn test_save_in_the_middle() -> Result<(), Error> {
        let mut generator = Generator::all(7);
        assert_eq!(100, generator.by_ref().take(100).count());

        let mut saved = Vec::new();
        generator.save(&mut saved)?;
        // Continuing the running generator must not affect the saved state.
        let remaining = generator.collect::<Vec<DenseGraph>>();
        assert_eq!(944, remaining.len());

        let loaded = Generator::load(saved.as_slice(), no_pruning(), no_pruning())?;
        assert_eq!(remaining, loaded.collect::<Vec<DenseGraph>>());
        Ok(())
    }

    #[test]
    fn test_save_at_the_end() -> Result<(), Error> {
        let mut generator = Generator::all(5);
        assert_eq!(34, generator.by_ref().count());
        assert_eq!(0, reload(&generator)?.count());
        Ok(())
    }

    #[test]
    fn test_save_split_generators() -> Result<(), Error> {
        let mut total = 0;
        for residue in 0..2 {
            let mut generator = Generator::new(8, residue, 2);
            total += generator.by_ref().take(1000).count();
            let loaded = reload(&generator)?;
            assert_eq!(residue, loaded.residue());
            assert_eq!(2, loaded.modulus());
            total += loaded.count();
        }
        assert_eq!(12346, total);
        Ok(())
    }

    #[test]
    fn test_small_generators() -> Result<(), Error> {
        assert_eq!(1, reload(&Generator::all(0))?.count());
        assert_eq!(1, reload(&Generator::all(1))?.count());
        let mut generator = Generator::all(2);
        assert!(generator.next().is_some());
        assert_eq!(1, reload(&generator)?.count());
        Ok(())
    }

    #[test]
    fn test_rejects_broken_checkpoints() {
        let mut generator = Generator::all(6);
        generator.by_ref().take(20).for_each(drop);
        let valid = generator.checkpoint();
        assert!(valid.validate().is_ok());

        let mut wrong_version = valid.clone();
        wrong_version.version += 1;
        let mut missing_choice = valid.clone();
        missing_choice.choices.pop();
        let mut bad_residue = valid.clone();
        bad_residue.residue = 1;
        let mut too_large = valid.clone();
        too_large.n = MAX_VERTICES + 1;
        let mut wrong_depth = valid.clone();
        wrong_depth.graph = DenseGraph::new(1);

        for checkpoint in [wrong_version, missing_choice, bad_residue, too_large, wrong_depth]
            .iter()
            .cloned()
        {
            assert!(matches!(
                Generator::from_checkpoint(checkpoint, no_pruning(), no_pruning()),
                Err(Error::InvalidCheckpoint(_))
            ));
        }

        assert!(matches!(
            Generator::load(&b"{\"version\": 1"[..], no_pruning(), no_pruning()),
            Err(Error::CheckpointError(_))
        ));
    }
}
