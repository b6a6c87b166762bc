use clap::{Arg, ArgAction, Command, value_parser};

pub const SCAN_CMD: &str = "scan";

pub const INPUT_ARG: &str = "input";
pub const BAM_ARG: &str = "bam";
pub const OUTPUT_ARG: &str = "output";
pub const MODE_ARG: &str = "mode";
pub const TYPE_ARG: &str = "type";
pub const STRAND_ARG: &str = "strand";
pub const THREADS_ARG: &str = "threads";
pub const COUNT_ARG: &str = "count";
pub const EQUAL_ARG: &str = "equal";
pub const LIB_SIZE_ARG: &str = "lib-size";
pub const PROB_ARG: &str = "prob";
pub const DECOY_ARG: &str = "decoy";
pub const CONFIG_ARG: &str = "config";

pub fn create_scan_cli() -> Command {
    Command::new(SCAN_CMD)
        .author("readscan contributors")
        .about("Count the reads of an indexed BAM file that support each sequence of a query table.")
        .arg(
            Arg::new(INPUT_ARG)
                .short('i')
                .long("input")
                .required(true)
                .help("Tab-separated query table with a header row (may be gzipped)"),
        )
        .arg(
            Arg::new(BAM_ARG)
                .short('b')
                .long("bam")
                .required(true)
                .help("Coordinate-sorted BAM file with a .bai index"),
        )
        .arg(
            Arg::new(OUTPUT_ARG)
                .short('o')
                .long("output")
                .required(true)
                .help("Output prefix: the main table is written here, other views next to it"),
        )
        .arg(
            Arg::new(MODE_ARG)
                .short('m')
                .long("mode")
                .help("Counting mode: target or scan [default: target]"),
        )
        .arg(
            Arg::new(TYPE_ARG)
                .short('t')
                .long("type")
                .help("Sequence type of the queries: nucleotide or peptide [default: peptide]"),
        )
        .arg(
            Arg::new(STRAND_ARG)
                .short('s')
                .long("strand")
                .help("Library strandedness: non, fr, rf, f, r or auto [default: auto]"),
        )
        .arg(
            Arg::new(THREADS_ARG)
                .short('@')
                .long("threads")
                .value_parser(value_parser!(usize))
                .help("Number of worker threads [default: 4]"),
        )
        .arg(
            Arg::new(COUNT_ARG)
                .short('c')
                .long("count")
                .help("Which alignments to count: primary or all [default: primary]"),
        )
        .arg(
            Arg::new(EQUAL_ARG)
                .short('e')
                .long("equal")
                .action(ArgAction::SetTrue)
                .help("Treat isoleucine and leucine as the same residue (peptide scans only)"),
        )
        .arg(
            Arg::new(LIB_SIZE_ARG)
                .short('l')
                .long("lib-size")
                .value_parser(value_parser!(u64))
                .help("Library size used for RPHM; estimated from the BAM file when absent"),
        )
        .arg(
            Arg::new(PROB_ARG)
                .short('p')
                .long("prob")
                .value_parser(value_parser!(f64))
                .help("Largest accepted probability of a base error in a matched window, in (0,1] [default: 0.05]"),
        )
        .arg(
            Arg::new(DECOY_ARG)
                .long("decoy")
                .action(ArgAction::SetTrue)
                .help("Also count reversed decoy sequences (scan mode only)"),
        )
        .arg(
            Arg::new(CONFIG_ARG)
                .long("config")
                .help("TOML file with run settings; command-line values take precedence"),
        )
}
