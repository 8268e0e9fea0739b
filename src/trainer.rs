//! Stochastic-gradient tap training
//!
//! [`train()`] runs the generic LMS-style update loop over a
//! block of training symbols for *one* output polarization:
//!
//! 1. take the `n_taps`-long dual-pol window at stride `os`;
//! 2. evaluate the filter output `y`;
//! 3. ask the criterion for the error `e`;
//! 4. update `w ← w + μ·e·conj(x)`;
//! 5. record `e` in the error trace.
//!
//! Every update depends on the previous one through the taps,
//! so the loop is strictly sequential. The error trace is a
//! diagnostic artifact only; nothing in this crate reads it
//! back.
//!
//! The length precondition is checked exactly once, before the
//! first update. A failed call returns with the taps untouched.

use num_complex::Complex;
use thiserror::Error;

use crate::criterion::ErrorCriterion;
use crate::signal::DualPol;
use crate::taps::TapState;

/// Training could not run
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum TrainError {
    /// The requested window extends past the signal
    #[error("training needs {required} samples but only {available} are available")]
    InsufficientSignal { required: usize, available: usize },

    /// An equalizer was run with no phases configured
    #[error("equalizer cascade has no phases")]
    EmptyCascade,
}

/// Train one polarization's taps over a symbol block
///
/// Runs `n_symbols` stochastic-gradient updates on `taps`
/// against the (normalized, centered) `signal`, starting at
/// sample `start` and advancing `os` samples per symbol. The
/// `criterion` supplies the per-sample error; its annealed
/// step scale, if any, multiplies `step_size`.
///
/// Returns the complex error trace, one entry per trained
/// symbol. Fails fast with
/// [`TrainError::InsufficientSignal`], before any tap
/// mutation, if `start + n_symbols·os + n_taps` exceeds the
/// signal length.
pub fn train(
    signal: &DualPol,
    start: usize,
    n_symbols: usize,
    os: usize,
    step_size: f64,
    taps: &mut TapState,
    criterion: &mut ErrorCriterion,
) -> Result<Vec<Complex<f64>>, TrainError> {
    let required = start + n_symbols * os + taps.n_taps();
    if required > signal.len() {
        return Err(TrainError::InsufficientSignal {
            required,
            available: signal.len(),
        });
    }

    let mut trace = Vec::with_capacity(n_symbols);
    for sym in 0..n_symbols {
        let at = start + sym * os;
        let y = taps.output(signal, at);
        let err = criterion.error(y);
        taps.update(signal, at, step_size * criterion.step_scale() * err);
        trace.push(err);
    }

    Ok(trace)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::criterion::CriterionKind;
    use crate::stats::ConstellationStats;
    use crate::testsig;

    #[test]
    fn test_precondition_leaves_taps_unchanged() {
        let signal = testsig::rotated_qpsk(1, 100, 0.4, 0.0);
        let stats = ConstellationStats::new(4).unwrap();
        let mut taps = TapState::centered(9);
        let before = taps.clone();
        let mut crit = CriterionKind::Cma.build(&stats);

        // 50 symbols at os 2 needs 109 samples; only 100 exist
        let out = train(&signal, 0, 50, 2, 1e-3, &mut taps, &mut crit);
        assert_eq!(
            out,
            Err(TrainError::InsufficientSignal {
                required: 109,
                available: 100,
            })
        );
        assert_eq!(before, taps);
    }

    #[test]
    fn test_trace_length() {
        let signal = testsig::rotated_qpsk(2, 512, 0.2, 0.0);
        let stats = ConstellationStats::new(4).unwrap();
        let mut taps = TapState::centered(9);
        let mut crit = CriterionKind::Cma.build(&stats);

        let trace = train(&signal, 0, 200, 1, 1e-3, &mut taps, &mut crit).unwrap();
        assert_eq!(200, trace.len());
    }

    #[test]
    fn test_cma_converges_on_rotated_qpsk() {
        // synthetic dual-pol QPSK through a unitary rotation:
        // the error magnitude must fall over the run
        let signal = testsig::rotated_qpsk(42, 5120, 0.6, 0.05);
        let stats = ConstellationStats::new(4).unwrap();
        let mut crit = CriterionKind::Cma.build(&stats);

        let mut taps = TapState::centered(9);
        let trace = train(&signal, 0, 5000, 1, 1e-3, &mut taps, &mut crit).unwrap();

        let head = testsig::mean_sq(&trace[..500]);
        let tail = testsig::mean_sq(&trace[4500..]);
        assert!(
            tail < head,
            "error grew: head {head:.4}, tail {tail:.4}"
        );
    }
}
