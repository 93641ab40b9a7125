//! Bisection over an integer encoder knob
//!
//! Real encoders are only roughly monotonic in their knob, so the search keeps
//! the best candidate it has actually observed under the target instead of
//! trusting where the bisection ends up.

use crate::error::CompressError;
use crate::model::EncodedCandidate;

/// Outcome of a bounded bisection
#[derive(Debug)]
pub struct Bisection {
    /// Highest knob value whose output fit the target, with its bytes
    pub best: Option<EncodedCandidate>,
    /// Number of probes actually run
    pub probes: u32,
}

/// Bisect `[min, max]` with at most `max_probes` calls to `probe`.
///
/// An overshooting probe lowers the ceiling below the midpoint; a fitting
/// probe raises the floor above it and becomes the best candidate when its
/// knob value is the highest seen so far.
pub fn bisect<F>(
    min: u32,
    max: u32,
    max_probes: u32,
    target: u64,
    mut probe: F,
) -> Result<Bisection, CompressError>
where
    F: FnMut(u32) -> Result<EncodedCandidate, CompressError>,
{
    let mut lo = min as i64;
    let mut hi = max as i64;
    let mut best: Option<EncodedCandidate> = None;
    let mut probes = 0;

    while probes < max_probes && lo <= hi {
        let mid = ((lo + hi) / 2) as u32;
        let candidate = probe(mid)?;
        probes += 1;

        log::debug!(
            "Probe {}: knob {} -> {} bytes (target {})",
            probes,
            mid,
            candidate.size_bytes,
            target
        );

        if candidate.fits(target) {
            lo = mid as i64 + 1;
            let better = best
                .as_ref()
                .map_or(true, |b| candidate.quality_param > b.quality_param);
            if better {
                best = Some(candidate);
            }
        } else {
            hi = mid as i64 - 1;
        }
    }

    Ok(Bisection { best, probes })
}
