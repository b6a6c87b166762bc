/// Reads-per-hundred-million scale factor.
pub const RPHM_SCALE: f64 = 100_000_000.0;

/// Placeholder written for empty fields (no mutations, untranslatable peptide, ...).
pub const EMPTY_FIELD: &str = "-";

/// Location string for matches on reads without a placement.
pub const UNMAPPED_LOCATION: &str = "unmapped";

/// Values of a location/strand cell that mean "not given".
pub const NULL_TOKENS: [&str; 5] = ["-", "null", "na", ".", ""];

/// Header names accepted for the sequence column.
pub const NUCLEOTIDE_COLUMNS: [&str; 2] = ["sequence", "nucleotide"];
pub const PEPTIDE_COLUMNS: [&str; 2] = ["sequence", "peptide"];
pub const LOCATION_COLUMN: &str = "location";
pub const STRAND_COLUMN: &str = "strand";

/// SAM tags consulted by the matcher.
pub const XS_TAG: [u8; 2] = *b"XS";
pub const MD_TAG: [u8; 2] = *b"MD";

/// Phred value used by BAM when base qualities are absent.
pub const MISSING_QUALITY: u8 = 0xff;
