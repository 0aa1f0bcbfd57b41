//! Statistics about the generation.

use custom_debug_derive::Debug;
use std::{
    fs::File,
    io::Write,
    path::Path,
    time::{Duration, Instant},
};

use crate::debug::opt_fmt;
use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatisticsLevel {
    None,
    Basic,
    Full,
}

impl From<u64> for StatisticsLevel {
    #[cfg(not(tarpaulin_include))]
    fn from(level: u64) -> Self {
        match level {
            0 => Self::None,
            1 => Self::Basic,
            _ => Self::Full,
        }
    }
}

impl Default for StatisticsLevel {
    #[cfg(not(tarpaulin_include))]
    fn default() -> Self {
        Self::None
    }
}

/// Counters for graphs with one fixed number of vertices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelStatistics {
    pub augmentations: u64,
    pub accepted: u64,
}

/// Why an augmentation did not become a node of the search tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Preprune,
    Degree,
    NotViable,
    NotCanonical,
    Prune,
}

#[derive(Debug, Clone)]
pub struct GenerationStatistics {
    // Meta information
    #[debug(skip)]
    level: StatisticsLevel,
    #[debug(skip)]
    start_time: Instant,
    vertices: usize,
    residue: usize,
    modulus: usize,
    #[debug(with = "opt_fmt")]
    end_time: Option<Duration>,
    // Search tree
    augmentations: u64,
    prepruned: u64,
    degree_rejected: u64,
    not_viable: u64,
    not_canonical: u64,
    pruned: u64,
    accepted: u64,
    emitted: u64,
    // Canonical labelling
    canonical_calls: u64,
    canonical_time: Duration,
    #[debug(with = "opt_fmt")]
    max_canonical_time: Option<Duration>,
    #[debug(skip)]
    levels: Vec<LevelStatistics>,
}

impl GenerationStatistics {
    pub fn new(level: StatisticsLevel, vertices: usize, residue: usize, modulus: usize) -> Self {
        debug_assert!(level != StatisticsLevel::None);

        GenerationStatistics {
            level,
            start_time: Instant::now(),
            vertices,
            residue,
            modulus,
            end_time: None,
            augmentations: 0,
            prepruned: 0,
            degree_rejected: 0,
            not_viable: 0,
            not_canonical: 0,
            pruned: 0,
            accepted: 0,
            emitted: 0,
            canonical_calls: 0,
            canonical_time: Duration::ZERO,
            max_canonical_time: None,
            levels: Vec::new(),
        }
    }

    pub fn level(&self) -> StatisticsLevel {
        self.level
    }

    fn level_entry(&mut self, vertices: usize) -> Option<&mut LevelStatistics> {
        if self.level != StatisticsLevel::Full {
            return None;
        }
        if self.levels.len() <= vertices {
            self.levels.resize(vertices + 1, LevelStatistics::default());
        }
        self.levels.get_mut(vertices)
    }

    /// A new vertex was added, giving a graph with `vertices` vertices.
    pub fn log_augmentation(&mut self, vertices: usize) {
        self.augmentations += 1;
        if let Some(entry) = self.level_entry(vertices) {
            entry.augmentations += 1;
        }
    }

    pub fn log_rejection(&mut self, rejection: Rejection) {
        let counter = match rejection {
            Rejection::Preprune => &mut self.prepruned,
            Rejection::Degree => &mut self.degree_rejected,
            Rejection::NotViable => &mut self.not_viable,
            Rejection::NotCanonical => &mut self.not_canonical,
            Rejection::Prune => &mut self.pruned,
        };
        *counter += 1;
    }

    pub fn log_accepted(&mut self, vertices: usize) {
        self.accepted += 1;
        if let Some(entry) = self.level_entry(vertices) {
            entry.accepted += 1;
        }
    }

    pub fn log_emitted(&mut self) {
        self.emitted += 1;
    }

    pub fn log_canonical(&mut self, duration: Duration) {
        self.canonical_calls += 1;
        self.canonical_time += duration;
        self.max_canonical_time = Some(
            self.max_canonical_time
                .map_or(duration, |max_time| max_time.max(duration)),
        );
    }

    pub fn log_end(&mut self) {
        if self.end_time.is_none() {
            self.end_time = Some(self.start_time.elapsed());
        }
    }

    pub fn augmentations(&self) -> u64 {
        self.augmentations
    }

    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    pub fn canonical_calls(&self) -> u64 {
        self.canonical_calls
    }

    pub fn rejected(&self, rejection: Rejection) -> u64 {
        match rejection {
            Rejection::Preprune => self.prepruned,
            Rejection::Degree => self.degree_rejected,
            Rejection::NotViable => self.not_viable,
            Rejection::NotCanonical => self.not_canonical,
            Rejection::Prune => self.pruned,
        }
    }

    /// Per vertex count counters, only kept at [`StatisticsLevel::Full`].
    pub fn levels(&self) -> &[LevelStatistics] {
        &self.levels
    }

    #[cfg(not(tarpaulin_include))]
    pub fn save_statistics(&self, out_file: &Path) -> Result<(), Error> {
        let mut statistics_file = File::create(out_file)?;
        write!(statistics_file, "Raw Statistics: {:#?}", self)?;
        if self.level == StatisticsLevel::Full {
            writeln!(statistics_file)?;
            for (vertices, entry) in self.levels.iter().enumerate() {
                writeln!(
                    statistics_file,
                    "{} vertices: {} augmentations, {} accepted",
                    vertices, entry.augmentations, entry.accepted
                )?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_counters() {
        let mut statistics = GenerationStatistics::new(StatisticsLevel::Basic, 5, 0, 1);
        statistics.log_augmentation(2);
        statistics.log_augmentation(3);
        statistics.log_rejection(Rejection::Degree);
        statistics.log_accepted(3);
        statistics.log_canonical(Duration::from_millis(3));
        statistics.log_canonical(Duration::from_millis(1));

        assert_eq!(2, statistics.augmentations());
        assert_eq!(1, statistics.rejected(Rejection::Degree));
        assert_eq!(0, statistics.rejected(Rejection::Prune));
        assert_eq!(1, statistics.accepted());
        assert_eq!(2, statistics.canonical_calls());
        assert_eq!(Some(Duration::from_millis(3)), statistics.max_canonical_time);
        assert!(statistics.levels().is_empty());
    }

    #[test]
    fn test_full_level_keeps_levels() {
        let mut statistics = GenerationStatistics::new(StatisticsLevel::Full, 4, 0, 1);
        statistics.log_augmentation(3);
        statistics.log_accepted(3);
        statistics.log_augmentation(4);
        assert_eq!(5, statistics.levels().len());
        assert_eq!(
            LevelStatistics {
                augmentations: 1,
                accepted: 1
            },
            statistics.levels()[3]
        );
        assert_eq!(0, statistics.levels()[4].accepted);
    }

    #[test]
    fn test_level_from_number() {
        assert_eq!(StatisticsLevel::None, StatisticsLevel::from(0));
        assert_eq!(StatisticsLevel::Basic, StatisticsLevel::from(1));
        assert_eq!(StatisticsLevel::Full, StatisticsLevel::from(7));
    }
}
