use std::fmt::{self, Display};
use std::fs::read_to_string;
use std::path::Path;
use std::str::FromStr;

use log::info;
use serde::{Deserialize, Serialize};

use crate::errors::{ReadScanError, Result};

#[derive(Deserialize, Serialize, Debug, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Traverse the whole alignment source to discover where queries occur.
    Scan,
    /// Count reads at the location each query is expected at.
    #[default]
    Target,
}

#[derive(Deserialize, Serialize, Debug, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum SequenceType {
    Nucleotide,
    #[default]
    Peptide,
}

///
/// Read-to-transcript orientation convention of the library.
///
/// `Fr` is fr-secondstrand (mate 1 is sense), `Rf` is fr-firststrand (mate 1 is
/// antisense), `F`/`R` are the single-end equivalents.
///
#[derive(Deserialize, Serialize, Debug, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum Strandedness {
    Non,
    Fr,
    Rf,
    F,
    R,
    #[default]
    Auto,
}

#[derive(Deserialize, Serialize, Debug, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum CountPolicy {
    /// Skip secondary and supplementary alignments.
    #[default]
    Primary,
    All,
}

impl FromStr for Mode {
    type Err = ReadScanError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "scan" => Ok(Mode::Scan),
            "target" => Ok(Mode::Target),
            _ => Err(ReadScanError::Config(format!("Invalid mode: {}", s))),
        }
    }
}

impl FromStr for SequenceType {
    type Err = ReadScanError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "nucleotide" => Ok(SequenceType::Nucleotide),
            "peptide" => Ok(SequenceType::Peptide),
            _ => Err(ReadScanError::Config(format!("Invalid sequence type: {}", s))),
        }
    }
}

impl FromStr for Strandedness {
    type Err = ReadScanError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "non" => Ok(Strandedness::Non),
            "fr" => Ok(Strandedness::Fr),
            "rf" => Ok(Strandedness::Rf),
            "f" => Ok(Strandedness::F),
            "r" => Ok(Strandedness::R),
            "auto" => Ok(Strandedness::Auto),
            _ => Err(ReadScanError::Config(format!("Wrong strandedness: {}", s))),
        }
    }
}

impl FromStr for CountPolicy {
    type Err = ReadScanError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "primary" => Ok(CountPolicy::Primary),
            "all" => Ok(CountPolicy::All),
            _ => Err(ReadScanError::Config(format!("Invalid count policy: {}", s))),
        }
    }
}

impl Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Scan => write!(f, "scan"),
            Mode::Target => write!(f, "target"),
        }
    }
}

impl Display for SequenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequenceType::Nucleotide => write!(f, "nucleotide"),
            SequenceType::Peptide => write!(f, "peptide"),
        }
    }
}

impl Display for Strandedness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strandedness::Non => "non",
            Strandedness::Fr => "fr",
            Strandedness::Rf => "rf",
            Strandedness::F => "f",
            Strandedness::R => "r",
            Strandedness::Auto => "auto",
        };
        write!(f, "{}", name)
    }
}

impl Display for CountPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CountPolicy::Primary => write!(f, "primary"),
            CountPolicy::All => write!(f, "all"),
        }
    }
}

///
/// Everything a run can be configured with. All fields have defaults, so a
/// config file only needs to list what it changes.
///
#[derive(Deserialize, Serialize, Debug, PartialEq, Clone)]
#[serde(default)]
pub struct ScanConfig {
    pub mode: Mode,
    pub sequence_type: SequenceType,
    pub strandedness: Strandedness,
    pub count: CountPolicy,
    pub threads: usize,
    pub library_size: Option<u64>,
    pub il_equal: bool,
    pub decoy: bool,
    pub roi_error_threshold: f64,
    pub strand_dominance_ratio: u64,
    pub strand_sample_size: u64,
    pub chunks_per_worker: usize,
    pub scan_window: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            mode: Mode::default(),
            sequence_type: SequenceType::default(),
            strandedness: Strandedness::default(),
            count: CountPolicy::default(),
            threads: 4,
            library_size: None,
            il_equal: false,
            decoy: false,
            roi_error_threshold: 0.05,
            strand_dominance_ratio: 10,
            strand_sample_size: 100_000,
            chunks_per_worker: 10,
            scan_window: 50_000_000,
        }
    }
}

impl ScanConfig {
    ///
    /// Reject values that can't drive a run.
    ///
    pub fn validate(&self) -> Result<()> {
        if self.threads == 0 {
            return Err(ReadScanError::Config(
                "the number of threads must be at least 1".to_string(),
            ));
        }
        if !(self.roi_error_threshold > 0.0 && self.roi_error_threshold <= 1.0) {
            return Err(ReadScanError::Config(format!(
                "ROI cutoff is out of range (0,1]: {}",
                self.roi_error_threshold
            )));
        }
        if self.strand_dominance_ratio == 0 {
            return Err(ReadScanError::Config(
                "strand dominance ratio must be positive".to_string(),
            ));
        }
        if self.chunks_per_worker == 0 {
            return Err(ReadScanError::Config(
                "chunks per worker must be positive".to_string(),
            ));
        }
        if self.scan_window == 0 {
            return Err(ReadScanError::Config(
                "scan window must be positive".to_string(),
            ));
        }
        if self.library_size == Some(0) {
            return Err(ReadScanError::Config(
                "library size must be positive when given".to_string(),
            ));
        }
        Ok(())
    }

    ///
    /// Drop options that don't apply to the selected mode and sequence type.
    /// I/L equivalence only makes sense for peptide scans, decoys only for scans.
    ///
    pub fn normalized(&self) -> Self {
        let mut config = self.clone();
        if config.il_equal
            && !(config.mode == Mode::Scan && config.sequence_type == SequenceType::Peptide)
        {
            info!("This is target mode or nucleotide input. IL option is ignored.");
            config.il_equal = false;
        }
        if config.decoy && config.mode != Mode::Scan {
            info!("Decoy sequences are only generated in scan mode. Decoy option is ignored.");
            config.decoy = false;
        }
        config
    }
}

impl TryFrom<&Path> for ScanConfig {
    type Error = ReadScanError;

    fn try_from(path: &Path) -> Result<Self> {
        let toml_str = read_to_string(path)?;
        let config = toml::from_str(&toml_str)?;
        Ok(config)
    }
}

impl Display for ScanConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Mode: {}", self.mode)?;
        writeln!(f, "Sequence: {}", self.sequence_type)?;
        writeln!(f, "Strandedness: {}", self.strandedness)?;
        writeln!(f, "Count: {}", self.count)?;
        writeln!(f, "ROI cutoff: {}", self.roi_error_threshold)?;
        writeln!(f, "Threads: {}", self.threads)?;
        match self.library_size {
            Some(size) => writeln!(f, "Library size: {}", size)?,
            None => writeln!(f, "Library size: estimated")?,
        }
        writeln!(f, "I/L equivalent: {}", self.il_equal)?;
        write!(f, "Decoy: {}", self.decoy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::io::Write;

    #[rstest]
    #[case("SCAN", Mode::Scan)]
    #[case("target", Mode::Target)]
    fn test_parse_mode(#[case] input: &str, #[case] expected: Mode) {
        assert_eq!(input.parse::<Mode>().unwrap(), expected);
    }

    #[rstest]
    #[case("non", Strandedness::Non)]
    #[case("FR", Strandedness::Fr)]
    #[case("rf", Strandedness::Rf)]
    #[case("f", Strandedness::F)]
    #[case("r", Strandedness::R)]
    #[case("auto", Strandedness::Auto)]
    fn test_parse_strandedness(#[case] input: &str, #[case] expected: Strandedness) {
        assert_eq!(input.parse::<Strandedness>().unwrap(), expected);
    }

    #[rstest]
    fn test_unknown_values_are_config_errors() {
        assert!(matches!("both".parse::<Mode>(), Err(ReadScanError::Config(_))));
        assert!(matches!(
            "sideways".parse::<Strandedness>(),
            Err(ReadScanError::Config(_))
        ));
    }

    #[rstest]
    #[case(0.0)]
    #[case(-0.5)]
    #[case(1.5)]
    fn test_roi_threshold_out_of_range(#[case] threshold: f64) {
        let config = ScanConfig {
            roi_error_threshold: threshold,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ReadScanError::Config(_))));
    }

    #[rstest]
    fn test_default_config_is_valid() {
        assert!(ScanConfig::default().validate().is_ok());
    }

    #[rstest]
    fn test_normalized_drops_il_outside_peptide_scan() {
        let config = ScanConfig {
            mode: Mode::Scan,
            sequence_type: SequenceType::Nucleotide,
            il_equal: true,
            decoy: true,
            ..Default::default()
        };
        let normalized = config.normalized();
        assert_eq!(normalized.il_equal, false);
        assert_eq!(normalized.decoy, true);

        let config = ScanConfig {
            mode: Mode::Target,
            decoy: true,
            ..Default::default()
        };
        assert_eq!(config.normalized().decoy, false);
    }

    #[rstest]
    fn test_try_from_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "mode = \"scan\"\nsequence_type = \"nucleotide\"\nstrandedness = \"rf\"\nthreads = 8\ndecoy = true"
        )
        .unwrap();

        let config = ScanConfig::try_from(file.path()).unwrap();
        assert_eq!(config.mode, Mode::Scan);
        assert_eq!(config.sequence_type, SequenceType::Nucleotide);
        assert_eq!(config.strandedness, Strandedness::Rf);
        assert_eq!(config.threads, 8);
        assert_eq!(config.decoy, true);
        assert_eq!(config.roi_error_threshold, 0.05);
    }
}
