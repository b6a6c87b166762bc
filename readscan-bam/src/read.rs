use std::io;

use noodles::bam;
use noodles::sam;
use noodles::sam::alignment::record::Flags;
use noodles::sam::alignment::record::cigar::op::Kind;
use noodles::sam::alignment::record::data::field::{Tag, Value};

use readscan_core::consts::{MD_TAG, XS_TAG};
use readscan_core::models::Strand;

///
/// The subset of SAM flags the matcher looks at.
///
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadFlags {
    pub unmapped: bool,
    pub secondary: bool,
    pub supplementary: bool,
    pub reverse: bool,
    pub paired: bool,
    pub first: bool,
    pub last: bool,
}

impl From<Flags> for ReadFlags {
    fn from(flags: Flags) -> Self {
        ReadFlags {
            unmapped: flags.is_unmapped(),
            secondary: flags.is_secondary(),
            supplementary: flags.is_supplementary(),
            reverse: flags.is_reverse_complemented(),
            paired: flags.is_segmented(),
            first: flags.is_first_segment(),
            last: flags.is_last_segment(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    /// `M`, `=` and `X`: read and reference both advance.
    Match,
    Insertion,
    Deletion,
    Skip,
    SoftClip,
    HardClip,
    Pad,
}

impl From<Kind> for OpKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Match | Kind::SequenceMatch | Kind::SequenceMismatch => OpKind::Match,
            Kind::Insertion => OpKind::Insertion,
            Kind::Deletion => OpKind::Deletion,
            Kind::Skip => OpKind::Skip,
            Kind::SoftClip => OpKind::SoftClip,
            Kind::HardClip => OpKind::HardClip,
            Kind::Pad => OpKind::Pad,
        }
    }
}

///
/// An owned, decoded alignment record. Bases are in reference orientation, as
/// stored in the file; `start` is 1-based.
///
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlignedRead {
    pub flags: ReadFlags,
    pub chr: Option<String>,
    pub start: Option<u64>,
    pub cigar: Vec<(OpKind, usize)>,
    pub sequence: Vec<u8>,
    pub qualities: Vec<u8>,
    pub md: Option<String>,
    pub xs: Option<Strand>,
}

impl AlignedRead {
    pub fn from_bam(record: &bam::Record, header: &sam::Header) -> io::Result<Self> {
        let flags = ReadFlags::from(record.flags());

        let chr = match record.reference_sequence_id() {
            Some(id) => {
                let id = id?;
                header
                    .reference_sequences()
                    .get_index(id)
                    .map(|(name, _)| name.to_string())
            }
            None => None,
        };

        let start = match record.alignment_start() {
            Some(position) => Some(position?.get() as u64),
            None => None,
        };

        let cigar = record
            .cigar()
            .iter()
            .map(|op| op.map(|op| (OpKind::from(op.kind()), op.len())))
            .collect::<io::Result<Vec<_>>>()?;

        let sequence: Vec<u8> = record.sequence().iter().collect();
        let qualities: Vec<u8> = record.quality_scores().as_ref().to_vec();

        let data = record.data();
        let md = match data.get(&Tag::new(MD_TAG[0], MD_TAG[1])) {
            Some(Ok(Value::String(md))) => Some(md.to_string()),
            _ => None,
        };
        let xs = match data.get(&Tag::new(XS_TAG[0], XS_TAG[1])) {
            Some(Ok(Value::Character(b'+'))) => Some(Strand::Forward),
            Some(Ok(Value::Character(b'-'))) => Some(Strand::Reverse),
            _ => None,
        };

        Ok(AlignedRead {
            flags,
            chr,
            start,
            cigar,
            sequence,
            qualities,
            md,
            xs,
        })
    }

    pub fn is_primary(&self) -> bool {
        !self.flags.secondary && !self.flags.supplementary
    }

    /// Whether the read carries a usable placement on a reference sequence.
    pub fn is_placed(&self) -> bool {
        !self.flags.unmapped && self.chr.is_some() && self.start.is_some()
    }
}
