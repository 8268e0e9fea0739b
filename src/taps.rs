//! Equalizer tap state
//!
//! A [`TapState`] owns the FIR coefficients that produce one
//! polarization of equalized output. Because polarization-mode
//! dispersion mixes the two transmit polarizations, the filter
//! spans *both* input channels: it holds one row of `n_taps`
//! complex coefficients per input polarization and produces one
//! output sample as the joint inner product over a dual-pol
//! input window.
//!
//! A fresh `TapState` is a pure pass-through: a single
//! unit-magnitude tap at the center of the X row. The Y
//! polarization's filter is derived from X's *initial* taps by
//! [`orthogonal()`](TapState::orthogonal), which preserves the
//! unitary rotation structure of a PMD channel.
//!
//! Each `TapState` is an owned value. The cascade moves it
//! between training phases; no aliasing exists between the X
//! and Y states.

use nalgebra::DVector;
use num_complex::Complex;
use num_traits::Zero;

/// FIR taps for one output polarization
///
/// Stores `2 × n_taps` complex coefficients: row 0 weights the
/// X input channel and row 1 the Y input channel.
#[derive(Clone, Debug, PartialEq)]
pub struct TapState {
    rows: [DVector<Complex<f64>>; 2],
}

impl TapState {
    /// Center-spike initialization
    ///
    /// All taps are zero except a real-valued 1 at index
    /// `n_taps / 2` of the X row, which makes the untrained
    /// filter an unbiased pass-through with a known delay.
    pub fn centered(n_taps: usize) -> Self {
        assert!(n_taps >= 1, "filter needs at least one tap");
        let mut row_x = DVector::from_element(n_taps, Complex::zero());
        row_x[n_taps / 2] = Complex::new(1.0, 0.0);
        let row_y = DVector::from_element(n_taps, Complex::zero());
        Self {
            rows: [row_x, row_y],
        }
    }

    /// Create from explicit coefficient rows
    ///
    /// Panics if the rows differ in length or are empty.
    pub fn from_rows(row_x: DVector<Complex<f64>>, row_y: DVector<Complex<f64>>) -> Self {
        assert_eq!(row_x.len(), row_y.len(), "tap rows differ in length");
        assert!(!row_x.is_empty(), "filter needs at least one tap");
        Self {
            rows: [row_x, row_y],
        }
    }

    /// Taps per input polarization
    pub fn n_taps(&self) -> usize {
        self.rows[0].len()
    }

    /// One coefficient row, 0 = X input and 1 = Y input
    pub fn row(&self, ind: usize) -> &DVector<Complex<f64>> {
        &self.rows[ind]
    }

    /// Derive the orthogonal sibling filter
    ///
    /// Builds the Y polarization's initial taps from this
    /// filter: the input rows are swapped, each row is reversed
    /// in tap order and conjugated, and one row is negated.
    /// This is the reversed form of the unitary structure
    /// `[[a, b], [-b*, a*]]`, so the derived filter is exactly
    /// orthogonal to `self` under the joint inner product.
    ///
    /// Reversal can displace the dominant tap, and a delay
    /// mismatch between the polarizations makes the second
    /// cascade phase diverge. The derived taps are therefore
    /// re-centered: both rows shift by the signed peak-index
    /// offset and the vacated end is zero-padded, so the
    /// dominant taps of both filters align in delay.
    pub fn orthogonal(&self) -> Self {
        let n_taps = self.n_taps();

        let row_x = DVector::from_iterator(
            n_taps,
            self.rows[1].as_slice().iter().rev().map(|tap| -tap.conj()),
        );
        let row_y = DVector::from_iterator(
            n_taps,
            self.rows[0].as_slice().iter().rev().map(|tap| tap.conj()),
        );
        let mut out = Self {
            rows: [row_x, row_y],
        };

        let delay = out.peak_index() as isize - self.peak_index() as isize;
        out.shift(-delay);
        out
    }

    /// Joint inner product with another tap state
    ///
    /// Computes `Σ self[p][k] · conj(other[p][k])` over both
    /// rows. Orthogonally-derived siblings give zero.
    pub fn inner_product(&self, other: &TapState) -> Complex<f64> {
        let mut acc = Complex::zero();
        for p in 0..2 {
            for (a, b) in self.rows[p].iter().zip(other.rows[p].iter()) {
                acc += a * b.conj();
            }
        }
        acc
    }

    /// Filter output at `start`
    ///
    /// Evaluates the joint inner product of the taps with the
    /// `n_taps`-long window of both input channels beginning at
    /// sample `start`. The window must be in bounds.
    #[inline]
    pub fn output(&self, signal: &crate::signal::DualPol, start: usize) -> Complex<f64> {
        let n_taps = self.n_taps();
        let mut acc = Complex::zero();
        for p in 0..2 {
            let window = &signal.pol(p)[start..start + n_taps];
            for (tap, samp) in self.rows[p].iter().zip(window.iter()) {
                acc += tap * samp;
            }
        }
        acc
    }

    /// Stochastic-gradient update
    ///
    /// Applies `w ← w + delta · conj(x)` over the same window
    /// convention as [`output()`](#method.output), where
    /// `delta` already carries the step size and the criterion
    /// error.
    #[inline]
    pub fn update(&mut self, signal: &crate::signal::DualPol, start: usize, delta: Complex<f64>) {
        let n_taps = self.n_taps();
        for p in 0..2 {
            let window = &signal.pol(p)[start..start + n_taps];
            for (tap, samp) in self.rows[p].iter_mut().zip(window.iter()) {
                *tap += delta * samp.conj();
            }
        }
    }

    // Tap index of the largest-magnitude coefficient,
    // searched across both rows
    fn peak_index(&self) -> usize {
        let mut best = 0;
        let mut best_mag = -1.0f64;
        for row in &self.rows {
            for (ind, tap) in row.iter().enumerate() {
                let mag = tap.norm_sqr();
                if mag > best_mag {
                    best_mag = mag;
                    best = ind;
                }
            }
        }
        best
    }

    // Shift both rows by `offset` taps, zero-padding the
    // vacated end. Positive offsets move taps toward higher
    // indices.
    fn shift(&mut self, offset: isize) {
        if offset == 0 {
            return;
        }
        let n_taps = self.n_taps() as isize;
        for row in self.rows.iter_mut() {
            let old = row.clone();
            for ind in 0..n_taps {
                let src = ind - offset;
                row[ind as usize] = if src >= 0 && src < n_taps {
                    old[src as usize]
                } else {
                    Complex::zero()
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use assert_approx_eq::assert_approx_eq;
    use rand::Rng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn random_taps(seed: u64, n_taps: usize) -> TapState {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut row = || {
            DVector::from_iterator(
                n_taps,
                (0..n_taps).map(|_| {
                    Complex::new(rng.gen::<f64>() - 0.5, rng.gen::<f64>() - 0.5)
                }),
            )
        };
        let row_x = row();
        let row_y = row();
        TapState::from_rows(row_x, row_y)
    }

    #[test]
    fn test_centered() {
        let taps = TapState::centered(9);
        assert_eq!(9, taps.n_taps());
        assert_eq!(taps.row(0)[4], Complex::new(1.0, 0.0));
        let energy: f64 = (0..2)
            .flat_map(|p| taps.row(p).iter().map(|t| t.norm_sqr()).collect::<Vec<_>>())
            .sum();
        assert_approx_eq!(energy, 1.0);
    }

    #[test]
    fn test_orthogonal_centered() {
        let wx = TapState::centered(9);
        let wy = wx.orthogonal();

        // dominant taps align in delay
        assert_approx_eq!(wy.row(1)[4].re, 1.0);
        assert_approx_eq!(wy.inner_product(&wx).norm(), 0.0);
    }

    #[test]
    fn test_orthogonal_even_length() {
        // reversal displaces the peak for even tap counts;
        // re-centering must bring it back
        let wx = TapState::centered(8);
        let wy = wx.orthogonal();
        assert_approx_eq!(wy.row(1)[4].norm(), 1.0);
        assert_approx_eq!(wy.inner_product(&wx).norm(), 0.0);
    }

    #[test]
    fn test_orthogonal_random() {
        for seed in 0..8u64 {
            let wx = random_taps(seed, 11);
            let wy = wx.orthogonal();
            // the single-row negation makes the two row terms
            // cancel under any delay shift, so orthogonality
            // survives the re-centering
            let ip = wx.inner_product(&wy).norm();
            let scale = wx.inner_product(&wx).norm();
            assert!(ip / scale < 1e-9, "seed {seed}: |<wx,wy>| = {ip}");
        }
    }

    #[test]
    fn test_output_and_update() {
        let mut sig_x = vec![Complex::new(0.0, 0.0); 16];
        let sig_y = vec![Complex::new(0.0, 0.0); 16];
        for (ind, samp) in sig_x.iter_mut().enumerate() {
            *samp = Complex::new(ind as f64, 0.0);
        }
        let sig = crate::signal::DualPol::new(sig_x, sig_y);

        let mut taps = TapState::centered(5);
        // pass-through: output is the center sample of the window
        assert_approx_eq!(taps.output(&sig, 3).re, 5.0);

        taps.update(&sig, 3, Complex::new(0.1, 0.0));
        // tap 0 of row X gains 0.1 * conj(3.0)
        assert_approx_eq!(taps.row(0)[0].re, 0.3);
        assert_approx_eq!(taps.row(0)[2].re, 1.5);
    }
}
