//! Dual-polarization sample storage
//!
//! A [`DualPol`] holds the two polarization channels of a
//! complex baseband signal, sampled at an integer multiple
//! (the *oversampling factor*) of the symbol rate. Both
//! channels always have the same length.
//!
//! Training expects the signal to be zero-mean with unit mean
//! power; [`normalize_and_center()`](DualPol::normalize_and_center)
//! establishes that precondition.

use num_complex::Complex;

/// Dual-polarization complex baseband signal
#[derive(Clone, Debug, PartialEq)]
pub struct DualPol {
    pols: [Vec<Complex<f64>>; 2],
}

impl DualPol {
    /// Create from the X and Y polarization channels
    ///
    /// Panics if the two channels differ in length.
    pub fn new(x: Vec<Complex<f64>>, y: Vec<Complex<f64>>) -> Self {
        assert_eq!(x.len(), y.len(), "polarization channels differ in length");
        Self { pols: [x, y] }
    }

    /// Samples per polarization channel
    pub fn len(&self) -> usize {
        self.pols[0].len()
    }

    /// True if the signal holds no samples
    pub fn is_empty(&self) -> bool {
        self.pols[0].is_empty()
    }

    /// One polarization channel, 0 = X and 1 = Y
    #[inline]
    pub fn pol(&self, ind: usize) -> &[Complex<f64>] {
        &self.pols[ind]
    }

    /// Remove DC offset and normalize to unit mean power
    ///
    /// Each polarization channel independently has its mean
    /// subtracted and is then scaled so its mean sample power
    /// is 1.0. All training entry points require this to have
    /// been done first.
    pub fn normalize_and_center(&mut self) {
        for chan in self.pols.iter_mut() {
            if chan.is_empty() {
                continue;
            }

            let count = chan.len() as f64;
            let mean = chan.iter().sum::<Complex<f64>>() / count;
            for samp in chan.iter_mut() {
                *samp -= mean;
            }

            let power = chan.iter().map(|s| s.norm_sqr()).sum::<f64>() / count;
            if power > 0.0 {
                let root = power.sqrt();
                for samp in chan.iter_mut() {
                    *samp /= root;
                }
            }
        }
    }

    /// Largest usable training-symbol count
    ///
    /// The number of symbols a training run may consume from
    /// sample `offset` onward with `n_taps`-long filters at
    /// oversampling `os`, such that every window stays in
    /// bounds.
    pub fn train_capacity(&self, offset: usize, os: usize, n_taps: usize) -> usize {
        let len = self.len();
        if len <= offset + n_taps {
            0
        } else {
            (len - offset - n_taps) / os
        }
    }

    /// Default training length, whole multiples of the filter
    ///
    /// The rule used when a caller requests training without
    /// naming a symbol count: `(L / os / n_taps) · n_taps`.
    pub fn default_train_symbols(&self, os: usize, n_taps: usize) -> usize {
        (self.len() / os / n_taps) * n_taps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_normalize_and_center() {
        let x: Vec<Complex<f64>> = (0..64)
            .map(|i| Complex::new(3.0 + (i % 2) as f64, -1.0))
            .collect();
        let y: Vec<Complex<f64>> = (0..64).map(|i| Complex::new(0.0, (i % 4) as f64)).collect();
        let mut sig = DualPol::new(x, y);
        sig.normalize_and_center();

        for p in 0..2 {
            let chan = sig.pol(p);
            let mean = chan.iter().sum::<Complex<f64>>() / chan.len() as f64;
            let power = chan.iter().map(|s| s.norm_sqr()).sum::<f64>() / chan.len() as f64;
            assert_approx_eq!(mean.norm(), 0.0);
            assert_approx_eq!(power, 1.0);
        }
    }

    #[test]
    fn test_train_capacity() {
        let sig = DualPol::new(
            vec![Complex::new(0.0, 0.0); 100],
            vec![Complex::new(0.0, 0.0); 100],
        );
        // last window must end within the signal
        assert_eq!(sig.train_capacity(0, 2, 9), 45);
        assert_eq!(sig.train_capacity(10, 2, 9), 40);
        assert_eq!(sig.train_capacity(95, 2, 9), 0);
        assert_eq!(sig.default_train_symbols(2, 9), 45);
    }
}
