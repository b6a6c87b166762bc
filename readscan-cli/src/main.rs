mod scan;

use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use log::LevelFilter;

pub mod consts {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
    pub const BIN_NAME: &str = "readscan";
    pub const VERBOSE_ARG: &str = "verbose";
}

fn build_parser() -> Command {
    Command::new(consts::BIN_NAME)
        .bin_name(consts::BIN_NAME)
        .version(consts::VERSION)
        .author("readscan contributors")
        .about("Count sequencing reads that support nucleotide or peptide sequences, with genomic locations and library-size normalization.")
        .subcommand_required(true)
        .arg(
            Arg::new(consts::VERBOSE_ARG)
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .global(true)
                .help("Increase logging verbosity (-v info, -vv debug)"),
        )
        .subcommand(scan::cli::create_scan_cli())
}

fn init_logger(verbose: u8) {
    env_logger::Builder::new()
        .filter_level(match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            _ => LevelFilter::Debug,
        })
        .init();
}

fn main() -> Result<()> {
    let app = build_parser();
    let matches = app.get_matches();

    init_logger(matches.get_count(consts::VERBOSE_ARG));

    match matches.subcommand() {
        //
        // SCAN
        //
        Some((scan::cli::SCAN_CMD, matches)) => {
            scan::handlers::run_scan(matches)?;
        }

        _ => unreachable!("Subcommand not found"),
    };

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    fn test_parser_is_well_formed() {
        build_parser().debug_assert();
    }

    #[rstest]
    fn test_commands_carry_project_author() {
        let parser = build_parser();
        assert_eq!(parser.get_author(), Some("readscan contributors"));

        let scan = parser
            .find_subcommand(scan::cli::SCAN_CMD)
            .expect("scan subcommand");
        assert_eq!(scan.get_author(), Some("readscan contributors"));
    }
}
