//! Filter application
//!
//! Once training has converged, the tap pair is applied to the
//! full oversampled signal as a strided, decimating
//! convolution: the dual-pol input window advances by the
//! oversampling factor per output symbol, and each output
//! polarization is the joint inner product of its taps with
//! that window.
//!
//! The windowing convention is *identical* to the training
//! loop's: a filter trained at stride `os` and applied at
//! stride `os` sees the same alignment both times. Application
//! itself is stateless and independent of training.

use num_complex::Complex;

use crate::signal::DualPol;
use crate::taps::TapState;

/// Apply converged taps to the full signal
///
/// Produces one output sample per polarization per symbol
/// period. The output has `(len − n_taps)/os + 1` symbols; the
/// window at output index `n` starts at input sample `n·os`,
/// matching the training loop.
///
/// An untrained center-spike [`TapState`] at `os = 1`
/// reproduces the input delayed by the center-tap offset.
pub fn apply_filter(signal: &DualPol, os: usize, taps_x: &TapState, taps_y: &TapState) -> DualPol {
    let n_taps = taps_x.n_taps();
    debug_assert_eq!(n_taps, taps_y.n_taps());

    let n_out = if signal.len() >= n_taps {
        (signal.len() - n_taps) / os + 1
    } else {
        0
    };

    let mut out_x: Vec<Complex<f64>> = Vec::with_capacity(n_out);
    let mut out_y: Vec<Complex<f64>> = Vec::with_capacity(n_out);
    for sym in 0..n_out {
        let at = sym * os;
        out_x.push(taps_x.output(signal, at));
        out_y.push(taps_y.output(signal, at));
    }

    DualPol::new(out_x, out_y)
}

#[cfg(test)]
mod tests {
    use super::*;

    use assert_approx_eq::assert_approx_eq;
    use nalgebra::DVector;

    use crate::testsig;

    #[test]
    fn test_identity_passthrough() {
        // center-spike X taps and the matching Y-row spike,
        // applied at oversampling 1, reproduce the input up to
        // the center-tap delay
        let n_taps = 9usize;
        let center = n_taps / 2;
        let signal = testsig::rotated_qpsk(7, 64, 0.0, 0.0);

        let taps_x = TapState::centered(n_taps);
        let mut spike_y = DVector::from_element(n_taps, Complex::new(0.0, 0.0));
        spike_y[center] = Complex::new(1.0, 0.0);
        let taps_y = TapState::from_rows(
            DVector::from_element(n_taps, Complex::new(0.0, 0.0)),
            spike_y,
        );

        let out = apply_filter(&signal, 1, &taps_x, &taps_y);
        assert_eq!(out.len(), signal.len() - n_taps + 1);

        for sym in 0..out.len() {
            let delayed = sym + center;
            assert_approx_eq!((out.pol(0)[sym] - signal.pol(0)[delayed]).norm(), 0.0);
            assert_approx_eq!((out.pol(1)[sym] - signal.pol(1)[delayed]).norm(), 0.0);
        }
    }

    #[test]
    fn test_output_length_oversampled() {
        let signal = testsig::rotated_qpsk(7, 101, 0.0, 0.0);
        let taps = TapState::centered(9);
        let out = apply_filter(&signal, 2, &taps, &taps.orthogonal());
        assert_eq!(out.len(), (101 - 9) / 2 + 1);
    }

    #[test]
    fn test_short_signal() {
        let signal = testsig::rotated_qpsk(7, 4, 0.0, 0.0);
        let taps = TapState::centered(9);
        let out = apply_filter(&signal, 1, &taps, &taps.orthogonal());
        assert!(out.is_empty());
    }
}
