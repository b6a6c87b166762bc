use std::ffi::OsStr;
use std::fs::File;
use std::io::prelude::*;
use std::io::BufReader;
use std::path::Path;

use flate2::read::MultiGzDecoder;

use crate::consts::RPHM_SCALE;
use crate::errors::Result;

/// Standard genetic code, indexed by `16 * b1 + 4 * b2 + b3` with A=0, C=1, G=2, T=3.
const CODON_TABLE: &[u8; 64] = b"KNKNTTTTRSRSIIMIQHQHPPPPRRRRLLLLEDEDAAAAGGGGVVVV*Y*YSSSS*CWCLFLF";

///
/// Get a reader for either a gzip'd or non-gzip'd file.
///
/// # Arguments
///
/// - path: path to the file to read
///
pub fn get_dynamic_reader(path: &Path) -> Result<BufReader<Box<dyn Read>>> {
    let is_gzipped = path.extension() == Some(OsStr::new("gz"));
    let file = File::open(path)?;
    let file: Box<dyn Read> = match is_gzipped {
        true => Box::new(MultiGzDecoder::new(file)),
        false => Box::new(file),
    };

    Ok(BufReader::new(file))
}

pub fn complement_base(base: u8) -> u8 {
    match base {
        b'A' => b'T',
        b'T' => b'A',
        b'C' => b'G',
        b'G' => b'C',
        b'a' => b't',
        b't' => b'a',
        b'c' => b'g',
        b'g' => b'c',
        b'U' => b'A',
        b'u' => b'a',
        other => other,
    }
}

pub fn reverse_complement_bytes(sequence: &[u8]) -> Vec<u8> {
    sequence.iter().rev().map(|&b| complement_base(b)).collect()
}

///
/// Reverse complement of a nucleotide sequence. Non-ACGT symbols (N, ...) are kept as is.
///
pub fn reverse_complement(sequence: &str) -> String {
    String::from_utf8_lossy(&reverse_complement_bytes(sequence.as_bytes())).into_owned()
}

/// Reverse a sequence end-to-end.
pub fn reverse_sequence(sequence: &str) -> String {
    sequence.chars().rev().collect()
}

/// Treat isoleucine and leucine as the same residue.
pub fn collapse_isoleucine(peptide: &str) -> String {
    peptide.replace('I', "L")
}

fn base_index(base: u8) -> Option<usize> {
    match base {
        b'A' | b'a' => Some(0),
        b'C' | b'c' => Some(1),
        b'G' | b'g' => Some(2),
        b'T' | b't' | b'U' | b'u' => Some(3),
        _ => None,
    }
}

pub fn translate_codon(codon: &[u8]) -> u8 {
    match (
        base_index(codon[0]),
        base_index(codon[1]),
        base_index(codon[2]),
    ) {
        (Some(b1), Some(b2), Some(b3)) => CODON_TABLE[16 * b1 + 4 * b2 + b3],
        _ => b'X',
    }
}

///
/// Translate a nucleotide sequence in frame 0. Trailing bases that don't fill a
/// codon are dropped, stop codons are `*` and codons with ambiguous bases `X`.
///
pub fn translate_bytes(sequence: &[u8]) -> Vec<u8> {
    sequence.chunks_exact(3).map(translate_codon).collect()
}

pub fn translate(sequence: &str) -> String {
    String::from_utf8_lossy(&translate_bytes(sequence.as_bytes())).into_owned()
}

///
/// Canonical chromosome name: `chrx`/`chry`/`chrm` in any case become
/// `chrX`/`chrY`/`chrM`, names without a `chr` prefix are upper-cased.
///
pub fn canonical_chromosome(chr: &str) -> String {
    if chr.eq_ignore_ascii_case("chrx") {
        "chrX".to_string()
    } else if chr.eq_ignore_ascii_case("chry") {
        "chrY".to_string()
    } else if chr.eq_ignore_ascii_case("chrm") {
        "chrM".to_string()
    } else if !chr.starts_with("chr") {
        chr.to_uppercase()
    } else {
        chr.to_string()
    }
}

///
/// Reads per hundred million: `reads * 1e8 / library_size`. An unknown (zero)
/// library size gives 0.
///
pub fn rphm(reads: u64, library_size: u64) -> f64 {
    if library_size == 0 {
        0.0
    } else {
        reads as f64 * RPHM_SCALE / library_size as f64
    }
}
