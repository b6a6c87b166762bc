use log::info;

use readscan_core::config::Strandedness;
use readscan_core::errors::{ReadScanError, Result};
use readscan_core::matcher::StrandTally;

///
/// Classify library strandedness from summed mate orientation tallies.
///
/// Mate 1 mostly against the transcript and mate 2 mostly with it (each by more
/// than `ratio` times) is `rf`; the mirror pattern is `fr`; anything else is
/// non-stranded. An empty tally can't be classified.
///
pub fn classify_strandedness(tally: &StrandTally, ratio: u64) -> Result<Strandedness> {
    info!("Strand estimation table");
    info!("\tForward\tReverse");
    info!("R1\t{}\t{}", tally.r1f, tally.r1r);
    info!("R2\t{}\t{}", tally.r2f, tally.r2r);

    if tally.total() == 0 {
        return Err(ReadScanError::Config(
            "no mates with a transcript strand (XS tag) were found; please specify the strandedness explicitly"
                .to_string(),
        ));
    }

    let strandedness = if tally.r1f.saturating_mul(ratio) < tally.r1r
        && tally.r2f > tally.r2r.saturating_mul(ratio)
    {
        Strandedness::Rf
    } else if tally.r1f > tally.r1r.saturating_mul(ratio)
        && tally.r2f.saturating_mul(ratio) < tally.r2r
    {
        Strandedness::Fr
    } else {
        Strandedness::Non
    };

    info!("Estimated strandedness: {}", strandedness);
    Ok(strandedness)
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn tally(r1f: u64, r1r: u64, r2f: u64, r2r: u64) -> StrandTally {
        StrandTally { r1f, r1r, r2f, r2r }
    }

    #[rstest]
    #[case(tally(0, 100, 100, 0), Strandedness::Rf)]
    #[case(tally(100, 0, 0, 100), Strandedness::Fr)]
    #[case(tally(1, 1, 1, 1), Strandedness::Non)]
    #[case(tally(5, 100, 100, 5), Strandedness::Rf)]
    #[case(tally(10, 100, 100, 10), Strandedness::Non)]
    #[case(tally(0, 100, 0, 0), Strandedness::Non)]
    fn test_classify_strandedness(#[case] tally: StrandTally, #[case] expected: Strandedness) {
        assert_eq!(classify_strandedness(&tally, 10).unwrap(), expected);
    }

    #[rstest]
    fn test_empty_tally_is_config_error() {
        let result = classify_strandedness(&StrandTally::default(), 10);
        assert!(matches!(result, Err(ReadScanError::Config(_))));
    }
}
