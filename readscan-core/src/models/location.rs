use std::fmt::{self, Display};

use crate::consts::EMPTY_FIELD;
use crate::models::Strand;
use crate::utils::rphm;

///
/// Identity of one (observed sequence, genomic location, strand) tuple.
///
#[derive(Eq, PartialEq, Hash, Debug, Clone, PartialOrd, Ord)]
pub struct LocationKey {
    pub location: String,
    pub strand: Strand,
    pub obs_nucleotide: String,
}

///
/// LocationInformation struct, one tuple discovered while scanning reads.
///
/// `query` is the query sequence the tuple was matched for and is the key the
/// tuple is filed under in a [LocationTable](crate::models::LocationTable).
///
#[derive(Debug, Clone, PartialEq)]
pub struct LocationInformation {
    pub query: String,
    pub obs_nucleotide: String,
    pub obs_peptide: String,
    pub location: String,
    pub strand: Strand,
    pub mutations: Vec<String>,
    pub ref_nucleotide: String,
    pub read_count: u64,
}

impl LocationInformation {
    pub fn key(&self) -> LocationKey {
        LocationKey {
            location: self.location.clone(),
            strand: self.strand,
            obs_nucleotide: self.obs_nucleotide.clone(),
        }
    }

    pub fn mutations_field(&self) -> String {
        if self.mutations.is_empty() {
            EMPTY_FIELD.to_string()
        } else {
            self.mutations.join(";")
        }
    }

    ///
    /// Render the annotation columns appended to a main-table row:
    /// `Location, Mutations, Strand, ObsNucleotide, ObsPeptide, RefNucleotide, ReadCount, RPHM`.
    ///
    pub fn annotation(&self, library_size: u64) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.location,
            self.mutations_field(),
            self.strand,
            self.obs_nucleotide,
            self.obs_peptide,
            self.ref_nucleotide,
            self.read_count,
            rphm(self.read_count, library_size)
        )
    }
}

impl Display for LocationInformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at {} ({}) x{}",
            self.query, self.location, self.strand, self.read_count
        )
    }
}
