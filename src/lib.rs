#![warn(rust_2018_idioms)]

//! Canonical labelling of simple graphs and orderly
//! generation of all graphs on `n` vertices up to isomorphism.

pub mod bitset;
pub mod canonical;
pub mod comb;
pub mod debug;
pub mod disjoint;
pub mod generation;
pub mod graph;
pub mod parser;
pub mod permutation;
pub mod settings;
pub mod statistics;

pub use canonical::{
    are_isomorphic, canonical_form, canonical_isomorph, canonical_isomorph_full, Canonical,
};
pub use debug::Error;
pub use generation::{no_pruning, Generator, PruneFn};
pub use graph::{DenseGraph, EditableGraph, Graph};
