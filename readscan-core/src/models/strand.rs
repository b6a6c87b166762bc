use std::fmt::{self, Display};
use std::str::FromStr;

use crate::consts::NULL_TOKENS;
use crate::errors::ReadScanError;

///
/// Orientation of a query sequence, a matched read window or a transcript.
///
#[derive(Eq, PartialEq, Hash, Debug, Clone, Copy, PartialOrd, Ord)]
pub enum Strand {
    Forward,
    Reverse,
    None,
}

impl Strand {
    pub fn flip(self) -> Self {
        match self {
            Strand::Forward => Strand::Reverse,
            Strand::Reverse => Strand::Forward,
            Strand::None => Strand::None,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Strand::None)
    }
}

impl FromStr for Strand {
    type Err = ReadScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.chars().next() {
            Some('+') => Ok(Strand::Forward),
            Some('-') if s.len() == 1 => Ok(Strand::Reverse),
            _ if NULL_TOKENS.contains(&s.to_lowercase().as_str()) => Ok(Strand::None),
            _ => Err(ReadScanError::InputFormat(format!(
                "Invalid strand value: {}",
                s
            ))),
        }
    }
}

impl Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Strand::Forward => "+",
            Strand::Reverse => "-",
            Strand::None => ".",
        };
        write!(f, "{}", symbol)
    }
}
