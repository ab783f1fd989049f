//! Synthetic progress for jobs whose backend only reports coarse phases.
//!
//! The backend never sends a percentage, so the client invents one: start
//! at [`PROGRESS_INITIAL`] on acceptance, add [`PROGRESS_STEP`] per
//! `processing` tick up to [`PROGRESS_CAP`], and jump to
//! [`PROGRESS_COMPLETE`] on completion. Errors leave the value alone.

/// Progress shown as soon as a submission is accepted.
pub const PROGRESS_INITIAL: u8 = 10;
/// Increment applied on every `processing` tick.
pub const PROGRESS_STEP: u8 = 5;
/// Ceiling while still processing; the rest is reserved for completion.
pub const PROGRESS_CAP: u8 = 85;
/// Progress once the backend reports `completed`.
pub const PROGRESS_COMPLETE: u8 = 100;

/// Stateless progress step function.
pub struct ProgressEstimator;

impl ProgressEstimator {
    /// Progress after one more `processing` tick.
    ///
    /// Monotonic: a value already above the cap is returned unchanged.
    pub fn next(current: u8) -> u8 {
        let stepped = current.saturating_add(PROGRESS_STEP).min(PROGRESS_CAP);
        stepped.max(current)
    }

    /// The initial value followed by the values after each of `ticks`
    /// `processing` ticks.
    pub fn sequence(ticks: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(ticks + 1);
        let mut current = PROGRESS_INITIAL;
        out.push(current);
        for _ in 0..ticks {
            current = Self::next(current);
            out.push(current);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn five_ticks_from_acceptance() {
        assert_eq!(ProgressEstimator::sequence(5), vec![10, 15, 20, 25, 30, 35]);
    }

    #[test]
    fn caps_at_eighty_five() {
        assert_eq!(ProgressEstimator::next(80), 85);
        assert_eq!(ProgressEstimator::next(83), 85);
        assert_eq!(ProgressEstimator::next(85), 85);
    }

    #[test]
    fn long_runs_never_exceed_cap_or_decrease() {
        let seq = ProgressEstimator::sequence(1_000);
        assert!(seq.iter().all(|&p| p <= PROGRESS_CAP));
        assert!(seq.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*seq.last().unwrap(), PROGRESS_CAP);
    }

    #[test]
    fn never_decreases_above_cap() {
        assert_eq!(ProgressEstimator::next(90), 90);
        assert_eq!(ProgressEstimator::next(u8::MAX), u8::MAX);
    }

    #[test]
    fn cap_reached_after_fifteen_ticks() {
        let seq = ProgressEstimator::sequence(15);
        assert_eq!(seq[14], 80);
        assert_eq!(seq[15], 85);
    }
}
