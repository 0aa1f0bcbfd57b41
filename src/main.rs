#![warn(rust_2018_idioms)]

//! Command line front end: counts or prints all graphs
//! on `n` vertices, or labels a single graph canonically.

use itertools::Itertools;
use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Write},
    process,
};
use tracing::{info, Level};

use orderly::{
    canonical_isomorph_full,
    debug::{print_generator, print_orbits_nauty_style, SettingsError},
    generation::{self, no_pruning, Generator},
    graph::EditableGraph,
    parser::parse_txt_input,
    settings::{Mode, Settings},
    time, Error,
};

/// Graphs waiting between the workers and the output.
const CHANNEL_CAPACITY: usize = 1024;
/// Largest automorphism group whose order is computed.
const GROUP_ORDER_LIMIT: usize = 1_000_000;

#[cfg(not(tarpaulin_include))]
fn usage_and_exit(code: i32) -> ! {
    eprintln!(
        "Usage:\n  orderly count N [--shards M | --residue A --modulus M]\n  orderly generate N [--workers W | --residue A --modulus M] [--resume FILE] [--checkpoint FILE --save-after K]\n  orderly canon FILE\n\nOptions:\n  --shards M               Count with M parallel shards\n  --residue A --modulus M  Only the share of residue A modulo M\n  --workers W              Generate with W threads, output order is arbitrary\n  --resume FILE            Continue from a saved checkpoint\n  --checkpoint FILE        Where to save the state after K graphs\n  --save-after K           Stop and save after K graphs\n  --stats FILE             Save generation statistics\n  --stats-level 1|2        Basic or full statistics\n  -v, -vv                  More log output on stderr\n"
    );
    process::exit(code)
}

#[cfg(not(tarpaulin_include))]
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
}

#[cfg(not(tarpaulin_include))]
fn save_statistics(generator: &Generator, settings: &Settings) -> Result<(), Error> {
    if let Some(statistics) = generator.statistics() {
        match &settings.statistics_file {
            Some(path) => statistics.save_statistics(path)?,
            None => eprintln!("{:#?}", statistics),
        }
    }
    Ok(())
}

#[cfg(not(tarpaulin_include))]
fn count(settings: &Settings) -> Result<(), Error> {
    let total = if let Some(shards) = settings.shards {
        generation::count(settings.vertices, shards)
    } else {
        let (residue, modulus) = settings.split();
        let mut generator = Generator::new(settings.vertices, residue, modulus)
            .with_statistics(settings.statistics_level);
        let total = generator.by_ref().count();
        save_statistics(&generator, settings)?;
        total
    };
    println!("{}", total);
    Ok(())
}

#[cfg(not(tarpaulin_include))]
fn generate(settings: &Settings) -> Result<(), Error> {
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    if let Some(workers) = settings.workers {
        let graphs = generation::generate(
            settings.vertices,
            workers,
            no_pruning(),
            no_pruning(),
            CHANNEL_CAPACITY,
        );
        for graph in graphs {
            writeln!(out, "{}", graph)?;
        }
        out.flush()?;
        return Ok(());
    }

    let generator = match &settings.checkpoint_in {
        Some(path) => {
            let generator =
                Generator::load(BufReader::new(File::open(path)?), no_pruning(), no_pruning())?;
            if generator.n() != settings.vertices {
                return Err(SettingsError(format!(
                    "the checkpoint generates graphs on {} vertices, not {}",
                    generator.n(),
                    settings.vertices
                ))
                .into());
            }
            generator
        }
        None => {
            let (residue, modulus) = settings.split();
            Generator::new(settings.vertices, residue, modulus)
        }
    };
    let mut generator = generator.with_statistics(settings.statistics_level);

    let limit = settings.save_after.unwrap_or(usize::MAX);
    for graph in generator.by_ref().take(limit) {
        writeln!(out, "{}", graph)?;
    }
    out.flush()?;

    if let Some(path) = &settings.checkpoint_out {
        let mut writer = BufWriter::new(File::create(path)?);
        generator.save(&mut writer)?;
        writer.flush()?;
        info!(
            path = %path.display(),
            done = generator.is_done(),
            "checkpoint written"
        );
    }

    save_statistics(&generator, settings)
}

#[cfg(not(tarpaulin_include))]
fn canon(settings: &Settings) -> Result<(), Error> {
    let path = settings
        .input
        .as_ref()
        .ok_or_else(|| SettingsError("no input file given".to_string()))?;
    let graph = parse_txt_input(BufReader::new(File::open(path)?))?;

    time!(runtime, canonical, canonical_isomorph_full(&graph, None));
    let mut canonical = canonical;

    println!("canonical labelling: {}", canonical.permutation.iter().join(" "));
    println!(
        "canonical form: {}",
        graph.induced_subgraph(&canonical.permutation)
    );
    print_orbits_nauty_style(&mut canonical.orbits, Some(runtime));
    canonical.generators.iter().for_each(print_generator);
    match canonical.group_order(GROUP_ORDER_LIMIT) {
        Some(order) => println!("grpsize={}", order),
        None => println!("grpsize>{}", GROUP_ORDER_LIMIT),
    }
    Ok(())
}

#[cfg(not(tarpaulin_include))]
fn main() -> Result<(), Error> {
    let settings = match Settings::from_args(std::env::args().skip(1)) {
        Ok(settings) => settings,
        Err(error) => {
            eprintln!("{}", error);
            usage_and_exit(2)
        }
    };
    if settings.help {
        usage_and_exit(0);
    }
    init_logging(settings.verbosity);

    match settings.mode {
        Mode::Count => count(&settings),
        Mode::Generate => generate(&settings),
        Mode::Canon => canon(&settings),
    }
}
