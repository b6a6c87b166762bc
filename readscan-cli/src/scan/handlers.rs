use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::ArgMatches;
use log::info;

use readscan_bam::BamMatcher;
use readscan_core::config::{CountPolicy, Mode, ScanConfig, SequenceType, Strandedness};
use readscan_count::run_readscan;

use super::cli::*;

/// Parse an optional enum argument, naming the argument in the error.
fn parse_value<T: FromStr>(matches: &ArgMatches, arg: &str) -> Result<Option<T>> {
    match matches.get_one::<String>(arg) {
        Some(value) => match T::from_str(value) {
            Ok(parsed) => Ok(Some(parsed)),
            Err(_err) => anyhow::bail!("Unknown value supplied for --{}: {}", arg, value),
        },
        None => Ok(None),
    }
}

///
/// Build the run configuration: the `--config` file (or defaults) first, then
/// every value given on the command line on top.
///
pub fn config_from_matches(matches: &ArgMatches) -> Result<ScanConfig> {
    let mut config = match matches.get_one::<String>(CONFIG_ARG) {
        Some(path) => ScanConfig::try_from(Path::new(path))
            .with_context(|| format!("Failed to load config file {}", path))?,
        None => ScanConfig::default(),
    };

    if let Some(mode) = parse_value::<Mode>(matches, MODE_ARG)? {
        config.mode = mode;
    }
    if let Some(sequence_type) = parse_value::<SequenceType>(matches, TYPE_ARG)? {
        config.sequence_type = sequence_type;
    }
    if let Some(strandedness) = parse_value::<Strandedness>(matches, STRAND_ARG)? {
        config.strandedness = strandedness;
    }
    if let Some(count) = parse_value::<CountPolicy>(matches, COUNT_ARG)? {
        config.count = count;
    }
    if let Some(threads) = matches.get_one::<usize>(THREADS_ARG) {
        config.threads = *threads;
    }
    if let Some(library_size) = matches.get_one::<u64>(LIB_SIZE_ARG) {
        config.library_size = Some(*library_size);
    }
    if let Some(prob) = matches.get_one::<f64>(PROB_ARG) {
        config.roi_error_threshold = *prob;
    }
    if matches.get_flag(EQUAL_ARG) {
        config.il_equal = true;
    }
    if matches.get_flag(DECOY_ARG) {
        config.decoy = true;
    }

    config.validate()?;
    Ok(config)
}

pub fn run_scan(matches: &ArgMatches) -> Result<()> {
    // get arguments from CLI
    let input = matches
        .get_one::<String>(INPUT_ARG)
        .context("A path to the query table is required.")?;
    let bam = matches
        .get_one::<String>(BAM_ARG)
        .context("A path to a BAM file is required.")?;
    let output = matches
        .get_one::<String>(OUTPUT_ARG)
        .context("An output prefix is required.")?;

    let config = config_from_matches(matches)?;

    let matcher = BamMatcher::new(Path::new(bam))
        .with_context(|| format!("Failed to open alignment file {}", bam))?;

    let summary = run_readscan(&config, Path::new(input), &matcher, Path::new(output))
        .with_context(|| format!("Failed to count reads for {}", input))?;

    info!(
        "Done: {} records, {} decoys, library size {}, strandedness {}",
        summary.records, summary.decoys, summary.library_size, summary.strandedness
    );

    Ok(())
}
