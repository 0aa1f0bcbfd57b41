//! Configuration of the `orderly` binary.
use std::{path::PathBuf, str::FromStr};

use crate::{debug::SettingsError, generation::MAX_VERTICES, statistics::StatisticsLevel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Count the graphs on `n` vertices.
    Count,
    /// Print the graphs on `n` vertices.
    Generate,
    /// Canonical labelling of a graph read from a file.
    Canon,
}

impl FromStr for Mode {
    type Err = SettingsError;

    #[cfg(not(tarpaulin_include))]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "count" => Ok(Self::Count),
            "generate" | "gen" => Ok(Self::Generate),
            "canon" => Ok(Self::Canon),
            _ => Err(SettingsError(format!("unknown mode `{}`", s))),
        }
    }
}

impl Default for Mode {
    #[cfg(not(tarpaulin_include))]
    fn default() -> Self {
        Self::Count
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Settings {
    pub mode: Mode,
    /// Print the usage and stop.
    pub help: bool,
    /// Number of vertices to generate.
    pub vertices: usize,
    /// Restrict to one residue class of the split.
    pub residue: Option<usize>,
    pub modulus: Option<usize>,
    /// Count with this many rayon shards.
    pub shards: Option<usize>,
    /// Generate with this many worker threads.
    pub workers: Option<usize>,
    /// Resume from this checkpoint.
    pub checkpoint_in: Option<PathBuf>,
    /// Save a checkpoint here after `save_after` graphs.
    pub checkpoint_out: Option<PathBuf>,
    pub save_after: Option<usize>,
    pub statistics_level: StatisticsLevel,
    pub statistics_file: Option<PathBuf>,
    /// Graph file for canonical labelling.
    pub input: Option<PathBuf>,
    pub verbosity: u8,
}

fn value<I: Iterator<Item = String>>(args: &mut I, flag: &str) -> Result<String, SettingsError> {
    args.next()
        .ok_or_else(|| SettingsError(format!("missing value for {}", flag)))
}

fn number<I: Iterator<Item = String>>(args: &mut I, flag: &str) -> Result<usize, SettingsError> {
    let raw = value(args, flag)?;
    raw.parse()
        .map_err(|_| SettingsError(format!("{} expects a number, got `{}`", flag, raw)))
}

impl Settings {
    /// Reads the settings from the command line arguments,
    /// without the program name.
    pub fn from_args<I: IntoIterator<Item = String>>(args: I) -> Result<Self, SettingsError> {
        let mut settings = Settings::default();
        let mut args = args.into_iter();
        let mut positional = Vec::new();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--help" | "-h" => {
                    settings.help = true;
                    return Ok(settings);
                }
                "-v" => settings.verbosity += 1,
                "-vv" => settings.verbosity += 2,
                "--residue" => settings.residue = Some(number(&mut args, &arg)?),
                "--modulus" => settings.modulus = Some(number(&mut args, &arg)?),
                "--shards" => settings.shards = Some(number(&mut args, &arg)?),
                "--workers" => settings.workers = Some(number(&mut args, &arg)?),
                "--resume" => settings.checkpoint_in = Some(value(&mut args, &arg)?.into()),
                "--checkpoint" => settings.checkpoint_out = Some(value(&mut args, &arg)?.into()),
                "--save-after" => settings.save_after = Some(number(&mut args, &arg)?),
                "--stats" => {
                    settings.statistics_file = Some(value(&mut args, &arg)?.into());
                    if settings.statistics_level == StatisticsLevel::None {
                        settings.statistics_level = StatisticsLevel::Basic;
                    }
                }
                "--stats-level" => {
                    settings.statistics_level =
                        StatisticsLevel::from(number(&mut args, &arg)? as u64)
                }
                flag if flag.starts_with('-') => {
                    return Err(SettingsError(format!("unknown option `{}`", flag)))
                }
                _ => positional.push(arg.clone()),
            }
        }

        let mut positional = positional.into_iter();
        settings.mode = positional
            .next()
            .ok_or_else(|| SettingsError("no mode given".to_string()))?
            .parse()?;
        let target = positional
            .next()
            .ok_or_else(|| SettingsError("missing argument after the mode".to_string()))?;
        if let Some(extra) = positional.next() {
            return Err(SettingsError(format!("unexpected argument `{}`", extra)));
        }
        match settings.mode {
            Mode::Canon => settings.input = Some(target.into()),
            Mode::Count | Mode::Generate => {
                settings.vertices = target
                    .parse()
                    .map_err(|_| SettingsError(format!("`{}` is not a vertex count", target)))?
            }
        }

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.vertices > MAX_VERTICES {
            return Err(SettingsError(format!(
                "at most {} vertices are supported",
                MAX_VERTICES
            )));
        }
        match (self.residue, self.modulus) {
            (None, None) => {}
            (Some(residue), Some(modulus)) if residue < modulus => {}
            (Some(_), Some(_)) => {
                return Err(SettingsError(
                    "the residue must be below the modulus".to_string(),
                ))
            }
            _ => {
                return Err(SettingsError(
                    "--residue and --modulus go together".to_string(),
                ))
            }
        }
        if self.shards == Some(0) || self.workers == Some(0) {
            return Err(SettingsError("at least one thread is needed".to_string()));
        }
        if self.shards.is_some() && self.residue.is_some() {
            return Err(SettingsError(
                "--shards splits all residues itself".to_string(),
            ));
        }
        if self.workers.is_some()
            && (self.residue.is_some() || self.checkpoint_in.is_some() || self.checkpoint_out.is_some())
        {
            return Err(SettingsError(
                "--workers cannot be combined with a residue or checkpoints".to_string(),
            ));
        }
        if self.save_after.is_some() != self.checkpoint_out.is_some() {
            return Err(SettingsError(
                "--checkpoint and --save-after go together".to_string(),
            ));
        }
        let generation_only = self.workers.is_some()
            || self.checkpoint_in.is_some()
            || self.checkpoint_out.is_some();
        if generation_only && self.mode != Mode::Generate {
            return Err(SettingsError(
                "workers and checkpoints need the generate mode".to_string(),
            ));
        }
        if self.shards.is_some() && self.mode != Mode::Count {
            return Err(SettingsError("--shards needs the count mode".to_string()));
        }
        Ok(())
    }

    /// Residue and modulus of a single generator.
    pub fn split(&self) -> (usize, usize) {
        (self.residue.unwrap_or(0), self.modulus.unwrap_or(1))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn parse(line: &str) -> Result<Settings, SettingsError> {
        Settings::from_args(line.split_whitespace().map(String::from))
    }

    #[test]
    fn test_count_settings() -> Result<(), SettingsError> {
        let settings = parse("count 7 --shards 4 -v")?;
        assert_eq!(Mode::Count, settings.mode);
        assert_eq!(7, settings.vertices);
        assert_eq!(Some(4), settings.shards);
        assert_eq!(1, settings.verbosity);
        assert_eq!((0, 1), settings.split());

        let settings = parse("count 8 --residue 2 --modulus 3")?;
        assert_eq!((2, 3), settings.split());
        Ok(())
    }

    #[test]
    fn test_generate_settings() -> Result<(), SettingsError> {
        let settings = parse("generate 6 --checkpoint out.json --save-after 10 --stats stats.txt")?;
        assert_eq!(Mode::Generate, settings.mode);
        assert_eq!(Some(PathBuf::from("out.json")), settings.checkpoint_out);
        assert_eq!(Some(10), settings.save_after);
        assert_eq!(StatisticsLevel::Basic, settings.statistics_level);

        let settings = parse("gen 5 --stats-level 2 --stats s.txt --resume in.json")?;
        assert_eq!(StatisticsLevel::Full, settings.statistics_level);
        assert_eq!(Some(PathBuf::from("in.json")), settings.checkpoint_in);
        Ok(())
    }

    #[test]
    fn test_canon_settings() -> Result<(), SettingsError> {
        let settings = parse("canon graph.txt -vv")?;
        assert_eq!(Mode::Canon, settings.mode);
        assert_eq!(Some(PathBuf::from("graph.txt")), settings.input);
        assert_eq!(2, settings.verbosity);
        Ok(())
    }

    #[test]
    fn test_help() -> Result<(), SettingsError> {
        assert!(parse("--help")?.help);
        assert!(parse("count -h")?.help);
        Ok(())
    }

    #[test]
    fn test_invalid_settings() {
        for line in [
            "",
            "count",
            "draw 5",
            "count five",
            "count 5 6",
            "count 63",
            "count 5 --residue 1",
            "count 5 --residue 3 --modulus 3",
            "count 5 --shards 0",
            "count 5 --shards 2 --residue 0 --modulus 2",
            "count 5 --workers 2",
            "generate 5 --workers 2 --resume in.json",
            "generate 5 --checkpoint out.json",
            "generate 5 --shards 2",
            "generate 5 --unknown",
            "generate 5 --save-after",
        ]
        .iter()
        {
            assert!(parse(line).is_err(), "`{}` was accepted", line);
        }
    }
}
