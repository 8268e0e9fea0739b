//! Square QAM constellations
//!
//! Generates the ideal symbol set for a square M-QAM
//! constellation. Symbols lie on a grid of odd integer
//! coordinates, like
//!
//! ```txt
//! 16-QAM:  -3-3j  -3-1j  -3+1j  -3+3j
//!          -1-3j  -1-1j  -1+1j  -1+3j
//!          +1-3j  +1-1j  +1+1j  +1+3j
//!          +3-3j  +3-1j  +3+1j  +3+3j
//! ```
//!
//! The raw grid has a mean power of `2(M-1)/3`. The
//! [`Constellation`] type stores the grid *normalized* to unit
//! mean power, which is the representation every blind error
//! criterion in this crate expects.

use num_complex::Complex;
use thiserror::Error;

/// Modulation order is unusable
#[derive(Error, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ModulationError {
    /// The order has no square-QAM representation
    #[error("modulation order {0} is not a square QAM order")]
    NotSquareQam(u32),
}

/// An M-QAM constellation, normalized to unit mean power
///
/// Create one with [`new()`](#method.new) for any square QAM
/// order: 4, 16, 64, 256, … The symbol set and the quantities
/// derived from it are immutable. If you need a different
/// modulation order, build a new `Constellation`.
#[derive(Clone, Debug, PartialEq)]
pub struct Constellation {
    // modulation order M
    order: u32,

    // symbol set, scaled to unit mean power
    points: Vec<Complex<f64>>,

    // mean power of the raw odd-integer grid
    scale: f64,

    // distance between adjacent normalized symbols
    min_distance: f64,
}

impl Constellation {
    /// Create a constellation for QAM order `order`
    ///
    /// `order` must be a square QAM order: a perfect square
    /// with an even root, such as 4, 16, 64, or 256. Other
    /// orders, including the cross constellations 32 and 128,
    /// are rejected.
    pub fn new(order: u32) -> Result<Self, ModulationError> {
        let points = qam_symbols(order)?;
        let scale = scaling_factor(order);
        let root_scale = scale.sqrt();

        let points: Vec<Complex<f64>> = points.iter().map(|p| p / root_scale).collect();

        // adjacent grid points are two (unscaled) units apart
        let min_distance = 2.0 / root_scale;

        Ok(Self {
            order,
            points,
            scale,
            min_distance,
        })
    }

    /// Modulation order M
    pub fn order(&self) -> u32 {
        self.order
    }

    /// Normalized symbol set
    ///
    /// The symbols are scaled so that their mean power is 1.0.
    pub fn points(&self) -> &[Complex<f64>] {
        &self.points
    }

    /// Mean power of the raw odd-integer grid
    ///
    /// Divide raw grid symbols by the square root of this value
    /// to obtain unit mean power.
    pub fn scaling_factor(&self) -> f64 {
        self.scale
    }

    /// Distance between adjacent normalized symbols
    pub fn min_distance(&self) -> f64 {
        self.min_distance
    }

    /// Hard decision: nearest symbol to `value`
    ///
    /// Performs an exhaustive search over all M symbols. This
    /// is the most expensive per-sample operation of the
    /// decision-directed criteria. Ties are resolved in favor
    /// of the earlier symbol, but a tie requires `value` to lie
    /// exactly on a decision boundary.
    pub fn decide(&self, value: Complex<f64>) -> Complex<f64> {
        let mut best = self.points[0];
        let mut best_dist = f64::INFINITY;
        for point in &self.points {
            let dist = (value - point).norm_sqr();
            if dist < best_dist {
                best_dist = dist;
                best = *point;
            }
        }
        best
    }
}

/// Raw square-QAM symbol grid
///
/// Returns the M symbols of a square QAM constellation on the
/// odd-integer grid, *without* power normalization. Symbols are
/// ordered column-major by real part, then imaginary part.
pub fn qam_symbols(order: u32) -> Result<Vec<Complex<f64>>, ModulationError> {
    let side = (order as f64).sqrt().round() as u32;
    // squared in u64: side can reach 65536 for orders near u32::MAX
    if u64::from(side) * u64::from(side) != u64::from(order) || side < 2 || side % 2 != 0 {
        return Err(ModulationError::NotSquareQam(order));
    }

    let mut points = Vec::with_capacity(order as usize);
    for re_ind in 0..side {
        for im_ind in 0..side {
            let re = 2.0 * re_ind as f64 - (side as f64 - 1.0);
            let im = 2.0 * im_ind as f64 - (side as f64 - 1.0);
            points.push(Complex::new(re, im));
        }
    }
    Ok(points)
}

/// Mean power of the raw symbol grid
///
/// For square M-QAM on the odd-integer grid, the mean symbol
/// power has the closed form `2(M-1)/3`.
pub fn scaling_factor(order: u32) -> f64 {
    2.0 * (order as f64 - 1.0) / 3.0
}

#[cfg(test)]
mod tests {
    use super::*;

    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_qam_symbols_qpsk() {
        let syms = qam_symbols(4).unwrap();
        assert_eq!(4, syms.len());
        for sym in &syms {
            assert_approx_eq!(sym.re.abs(), 1.0);
            assert_approx_eq!(sym.im.abs(), 1.0);
        }
        assert_approx_eq!(scaling_factor(4), 2.0);
    }

    #[test]
    fn test_qam_symbols_rejects_cross() {
        assert_eq!(qam_symbols(32), Err(ModulationError::NotSquareQam(32)));
        assert_eq!(qam_symbols(8), Err(ModulationError::NotSquareQam(8)));
        assert_eq!(qam_symbols(0), Err(ModulationError::NotSquareQam(0)));
    }

    #[test]
    fn test_qam_symbols_rejects_huge_order() {
        // the rounded root is 65536, whose square wraps in u32
        assert_eq!(
            qam_symbols(u32::MAX),
            Err(ModulationError::NotSquareQam(u32::MAX))
        );
    }

    #[test]
    fn test_unit_mean_power() {
        for order in [4u32, 16, 64, 256] {
            let con = Constellation::new(order).unwrap();
            let power: f64 = con.points().iter().map(|p| p.norm_sqr()).sum();
            assert_approx_eq!(power / order as f64, 1.0);
        }
    }

    #[test]
    fn test_min_distance() {
        let con = Constellation::new(4).unwrap();
        assert_approx_eq!(con.min_distance(), 2.0f64.sqrt());

        let con = Constellation::new(16).unwrap();
        assert_approx_eq!(con.min_distance(), 2.0 / 10.0f64.sqrt());
    }

    #[test]
    fn test_decide() {
        let con = Constellation::new(16).unwrap();
        for point in con.points() {
            // a small perturbation never changes the decision
            let nudged = point + Complex::new(0.3, -0.2) * con.min_distance();
            assert_eq!(con.decide(nudged), *point);
        }
    }
}
