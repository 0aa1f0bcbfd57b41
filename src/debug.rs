//! Debug facilities.
use itertools::Itertools;
use nom::error::{VerboseError, VerboseErrorKind};
use std::{
    fmt::{self, Debug, Display},
    io::{self, Write},
    time::Duration,
};

use crate::{disjoint::DisjointSet, graph::GraphError, parser::ParseError, permutation::Permutation};

// Error types and From<...> implementations

#[derive(Debug)]
pub struct SettingsError(pub String);

impl Display for SettingsError {
    #[cfg(not(tarpaulin_include))]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Graph initialization error: {0}")]
    GraphError(GraphError),
    #[error("Error while parsing input file with graph description")]
    ParseError(Vec<VerboseErrorKind>),
    #[error("I/O error: {0}")]
    IoError(io::Error),
    #[error("Error while reading or writing a checkpoint: {0}")]
    CheckpointError(serde_json::Error),
    #[error("Invalid checkpoint: {0}")]
    InvalidCheckpoint(String),
    #[error("Invalid settings: {0}")]
    SettingsError(SettingsError),
}

impl From<GraphError> for Error {
    #[cfg(not(tarpaulin_include))]
    fn from(ge: GraphError) -> Self {
        Self::GraphError(ge)
    }
}

#[cfg(not(tarpaulin_include))]
fn handle_nom_verbose_error<E: Debug>(
    should_print: bool,
    verbose: VerboseError<E>,
) -> Vec<VerboseErrorKind> {
    verbose
        .errors
        .into_iter()
        .map(|(msg, kind)| {
            if should_print {
                eprintln!("{:?}", msg);
            }
            kind
        })
        .collect()
}

impl<'a> From<nom::Err<ParseError<'a>>> for Error {
    #[cfg(not(tarpaulin_include))]
    fn from(pe: nom::Err<ParseError<'a>>) -> Self {
        match pe {
            nom::Err::Error(verbose) | nom::Err::Failure(verbose) => {
                Self::ParseError(handle_nom_verbose_error(true, verbose))
            }
            nom::Err::Incomplete(_) => unreachable!(),
        }
    }
}

impl From<io::Error> for Error {
    #[cfg(not(tarpaulin_include))]
    fn from(ie: io::Error) -> Self {
        Self::IoError(ie)
    }
}

impl From<serde_json::Error> for Error {
    #[cfg(not(tarpaulin_include))]
    fn from(je: serde_json::Error) -> Self {
        Self::CheckpointError(je)
    }
}

impl From<SettingsError> for Error {
    #[cfg(not(tarpaulin_include))]
    fn from(se: SettingsError) -> Self {
        Self::SettingsError(se)
    }
}

// Printing of results

/// Orbits as printed by dreadnaut: members of larger orbits
/// followed by the orbit size, singletons on their own.
pub fn orbits_nauty_style(orbits: &mut DisjointSet) -> String {
    orbits
        .sets()
        .into_iter()
        .map(|members| {
            if members.len() > 1 {
                format!("{} ({});", members.iter().join(" "), members.len())
            } else {
                format!("{};", members[0])
            }
        })
        .join(" ")
}

#[cfg(not(tarpaulin_include))]
pub fn print_orbits_nauty_style(orbits: &mut DisjointSet, runtime: Option<Duration>) {
    // This is necessary to give a correct
    // start point for the output.
    let runtime = runtime.unwrap_or(Duration::ZERO);
    println!("cpu time = {:.6} seconds", runtime.as_secs_f64());
    println!("{}", orbits_nauty_style(orbits));

    std::io::stdout()
        .flush()
        .expect("Why would stdout not be flushed?");
}

#[cfg(not(tarpaulin_include))]
pub fn print_generator(generator: &Permutation) {
    if generator.is_identity() {
        println!("Identity permutation.");
        return;
    }
    println!("{}", generator);
}

// Custom formatter for debug printing

#[cfg(not(tarpaulin_include))]
pub fn opt_fmt<T: fmt::Debug>(option: &Option<T>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match option {
        Some(val) => val.fmt(f),
        None => write!(f, "None"),
    }
}

// Debug macros that allow to time single expressions

#[macro_export]
macro_rules! time {
    ($i:ident, $ret:ident, $exp:expr) => {
        let before = std::time::Instant::now();
        let $ret = $exp;
        let $i = before.elapsed();
    };
}

#[macro_export]
macro_rules! parse_single_line {
    ($ret:ident, $exp:expr) => {
        let (res, $ret) = $exp?;
        eof::<$crate::parser::Input<'_>, $crate::parser::ParseError<'_>>(res)?;
    };
}

#[macro_export]
macro_rules! get_line {
    ($ret:ident, $lines:ident) => {
        let $ret = $lines.next().unwrap_or_else(|| {
            Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "Unexpected EOF!",
            ))
        })?;
    };
}
