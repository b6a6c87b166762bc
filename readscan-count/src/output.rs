//! Derived output views, addressed from one output prefix.
use std::ffi::OsString;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{error, info};

use readscan_core::errors::{ReadScanError, Result};
use readscan_core::utils::rphm;

use crate::aggregate::{ScanAggregate, SequenceCount, TargetAggregate};

pub const NOT_FOUND_SUFFIX: &str = ".not_found.tsv";
pub const GLOC_SUFFIX: &str = ".gloc.tsv";
pub const PEPT_COUNT_SUFFIX: &str = ".pept_count.tsv";
pub const PEPT_COUNT_DECOY_SUFFIX: &str = ".pept_count.random.tsv";
pub const LIBSIZE_SUFFIX: &str = ".libsize";

const SCAN_COLUMNS: &str =
    "Location\tMutations\tStrand\tObsNucleotide\tObsPeptide\tRefNucleotide\tReadCount\tRPHM";
const TARGET_COLUMNS: &str = "ReadCount\tRPHM";

///
/// Paths of every view written by a run.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub main: PathBuf,
    pub not_found: PathBuf,
    pub gloc: PathBuf,
    pub pept_count: PathBuf,
    pub pept_count_decoy: PathBuf,
    pub libsize: PathBuf,
}

impl OutputPaths {
    pub fn from_prefix(prefix: &Path) -> Self {
        let with_suffix = |suffix: &str| {
            let mut path: OsString = prefix.as_os_str().to_owned();
            path.push(suffix);
            PathBuf::from(path)
        };

        OutputPaths {
            main: prefix.to_path_buf(),
            not_found: with_suffix(NOT_FOUND_SUFFIX),
            gloc: with_suffix(GLOC_SUFFIX),
            pept_count: with_suffix(PEPT_COUNT_SUFFIX),
            pept_count_decoy: with_suffix(PEPT_COUNT_DECOY_SUFFIX),
            libsize: with_suffix(LIBSIZE_SUFFIX),
        }
    }
}

fn write_lines<I>(path: &Path, header: &str, rows: I) -> io::Result<()>
where
    I: IntoIterator<Item = String>,
{
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    writeln!(writer, "{}", header)?;
    for row in rows {
        writeln!(writer, "{}", row)?;
    }
    writer.flush()
}

fn sequence_rows(
    counts: &[SequenceCount],
    library_size: u64,
    with_locations: bool,
) -> impl Iterator<Item = String> + '_ {
    counts.iter().map(move |count| {
        let row = format!(
            "{}\t{}\t{}",
            count.sequence,
            count.read_count,
            rphm(count.read_count, library_size)
        );
        if with_locations {
            format!("{}\t{}", row, count.num_locations)
        } else {
            row
        }
    })
}

///
/// Writes views one by one; a failing view is logged and remembered, and the
/// remaining views are still attempted.
///
#[derive(Default)]
struct ViewWriter {
    failed: Vec<String>,
}

impl ViewWriter {
    fn view<I>(&mut self, name: &str, path: &Path, header: &str, rows: I)
    where
        I: IntoIterator<Item = String>,
    {
        match write_lines(path, header, rows) {
            Ok(()) => info!("Wrote {} to {}", name, path.display()),
            Err(e) => {
                error!("Failed to write {} to {}: {}", name, path.display(), e);
                self.failed.push(name.to_string());
            }
        }
    }

    fn library_size(&mut self, path: &Path, library_size: u64) {
        let result = File::create(path).and_then(|mut file| writeln!(file, "{}", library_size));
        match result {
            Ok(()) => info!("Wrote library size to {}", path.display()),
            Err(e) => {
                error!("Failed to write library size to {}: {}", path.display(), e);
                self.failed.push("libsize".to_string());
            }
        }
    }

    fn finish(self) -> Result<()> {
        if self.failed.is_empty() {
            Ok(())
        } else {
            Err(ReadScanError::Output(self.failed))
        }
    }
}

///
/// Write the scan-mode views: main table, not-found, tuples, unique sequences,
/// decoy sequences (when decoys were generated) and library size.
///
pub fn write_scan_outputs(
    paths: &OutputPaths,
    header: &str,
    aggregate: &ScanAggregate,
    library_size: u64,
    with_decoys: bool,
) -> Result<()> {
    let mut writer = ViewWriter::default();

    writer.view(
        "main table",
        &paths.main,
        &format!("{}\t{}", header, SCAN_COLUMNS),
        aggregate.annotated.iter().cloned(),
    );
    writer.view(
        "not found",
        &paths.not_found,
        &format!("{}\tLocation", header),
        aggregate
            .not_found
            .iter()
            .map(|line| format!("{}\tNot found", line)),
    );
    writer.view(
        "genomic tuples",
        &paths.gloc,
        "ObsPeptide\tLocation\tStrand\tReadCount\tRPHM",
        aggregate.tuples.iter().map(|tuple| {
            format!(
                "{}\t{}\t{}\t{}\t{}",
                tuple.sequence,
                tuple.location,
                tuple.strand,
                tuple.read_count,
                rphm(tuple.read_count, library_size)
            )
        }),
    );
    writer.view(
        "sequence counts",
        &paths.pept_count,
        "Sequence\tReadCount\tRPHM\tNumLocations",
        sequence_rows(&aggregate.sequences, library_size, true),
    );
    if with_decoys {
        writer.view(
            "decoy sequence counts",
            &paths.pept_count_decoy,
            "Sequence\tReadCount\tRPHM\tNumLocations",
            sequence_rows(&aggregate.decoys, library_size, true),
        );
    }
    writer.library_size(&paths.libsize, library_size);

    writer.finish()
}

///
/// Write the target-mode views: main table, unique sequences and library size.
///
pub fn write_target_outputs(
    paths: &OutputPaths,
    header: &str,
    aggregate: &TargetAggregate,
    library_size: u64,
) -> Result<()> {
    let mut writer = ViewWriter::default();

    writer.view(
        "main table",
        &paths.main,
        &format!("{}\t{}", header, TARGET_COLUMNS),
        aggregate.annotated.iter().cloned(),
    );
    writer.view(
        "sequence counts",
        &paths.pept_count,
        "Sequence\tReadCount\tRPHM",
        sequence_rows(&aggregate.sequences, library_size, false),
    );
    writer.library_size(&paths.libsize, library_size);

    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs::read_to_string;

    use pretty_assertions::assert_eq;
    use rstest::*;
    use tempfile::tempdir;

    use readscan_core::models::Strand;

    use crate::aggregate::TupleCount;

    #[fixture]
    fn aggregate() -> ScanAggregate {
        ScanAggregate {
            annotated: vec!["a\tMA\tchr1:1-6\t-\t+\tATGGCC\tMA\tATGGCC\t5\t5000000".to_string()],
            not_found: vec!["b\tKK".to_string()],
            sequences: vec![
                SequenceCount {
                    sequence: "MA".to_string(),
                    read_count: 5,
                    num_locations: 1,
                },
                SequenceCount {
                    sequence: "KK".to_string(),
                    read_count: 0,
                    num_locations: 0,
                },
            ],
            decoys: vec![],
            tuples: vec![TupleCount {
                sequence: "MA".to_string(),
                location: "chr1:1-6".to_string(),
                strand: Strand::Forward,
                read_count: 5,
            }],
            duplicates: 0,
        }
    }

    #[rstest]
    fn test_paths_from_prefix() {
        let paths = OutputPaths::from_prefix(Path::new("/tmp/run/out.tsv"));
        assert_eq!(paths.main, PathBuf::from("/tmp/run/out.tsv"));
        assert_eq!(paths.not_found, PathBuf::from("/tmp/run/out.tsv.not_found.tsv"));
        assert_eq!(paths.libsize, PathBuf::from("/tmp/run/out.tsv.libsize"));
    }

    #[rstest]
    fn test_write_scan_outputs(aggregate: ScanAggregate) {
        let dir = tempdir().unwrap();
        let paths = OutputPaths::from_prefix(&dir.path().join("out"));

        write_scan_outputs(&paths, "id\tpeptide", &aggregate, 100, false).unwrap();

        let main = read_to_string(&paths.main).unwrap();
        assert!(main.starts_with(
            "id\tpeptide\tLocation\tMutations\tStrand\tObsNucleotide\tObsPeptide\tRefNucleotide\tReadCount\tRPHM\n"
        ));
        assert_eq!(main.lines().count(), 2);

        let not_found = read_to_string(&paths.not_found).unwrap();
        assert_eq!(not_found, "id\tpeptide\tLocation\nb\tKK\tNot found\n");

        let gloc = read_to_string(&paths.gloc).unwrap();
        assert_eq!(
            gloc,
            "ObsPeptide\tLocation\tStrand\tReadCount\tRPHM\nMA\tchr1:1-6\t+\t5\t5000000\n"
        );

        let counts = read_to_string(&paths.pept_count).unwrap();
        assert_eq!(
            counts,
            "Sequence\tReadCount\tRPHM\tNumLocations\nMA\t5\t5000000\t1\nKK\t0\t0\t0\n"
        );

        assert!(!paths.pept_count_decoy.exists());
        assert_eq!(read_to_string(&paths.libsize).unwrap(), "100\n");
    }

    #[rstest]
    fn test_failed_view_does_not_stop_the_others(aggregate: ScanAggregate) {
        let dir = tempdir().unwrap();
        let paths = OutputPaths::from_prefix(&dir.path().join("out"));
        // a directory where the tuple view should go
        std::fs::create_dir(&paths.gloc).unwrap();

        let result = write_scan_outputs(&paths, "id\tpeptide", &aggregate, 100, false);

        match result {
            Err(ReadScanError::Output(views)) => assert_eq!(views, vec!["genomic tuples".to_string()]),
            other => panic!("expected an output error, got {:?}", other),
        }
        assert!(paths.pept_count.exists());
        assert!(paths.libsize.exists());
    }

    #[rstest]
    fn test_write_target_outputs() {
        let dir = tempdir().unwrap();
        let paths = OutputPaths::from_prefix(&dir.path().join("out"));
        let aggregate = TargetAggregate {
            annotated: vec!["MAK\tchr1:1-9\t+\t3\t300000".to_string()],
            sequences: vec![SequenceCount {
                sequence: "MAK".to_string(),
                read_count: 3,
                num_locations: 1,
            }],
        };

        write_target_outputs(&paths, "peptide\tlocation\tstrand", &aggregate, 1000).unwrap();

        let main = read_to_string(&paths.main).unwrap();
        assert!(main.starts_with("peptide\tlocation\tstrand\tReadCount\tRPHM\n"));
        let counts = read_to_string(&paths.pept_count).unwrap();
        assert_eq!(counts, "Sequence\tReadCount\tRPHM\nMAK\t3\t300000\n");
        assert!(!paths.not_found.exists());
        assert!(!paths.gloc.exists());
    }
}
