//! Constellation reference statistics
//!
//! Every blind error criterion steers the equalizer output
//! toward some statistic of the ideal constellation. This
//! module derives those statistics once per modulation order:
//!
//! * the constant-modulus target `R = E[|s|⁴]/E[|s|²]`, in a
//!   real (joint) and a complex (per-axis) flavor;
//! * partition/code tables that quantize a measured modulus
//!   to the nearest valid constellation radius;
//! * the square-contour target used by the SCA criterion.
//!
//! All quantities are pure functions of the power-normalized
//! symbol set and never change while training runs. Recompute
//! them only when the modulation order changes.

use num_complex::Complex;
use num_traits::Zero;

use crate::constellation::{Constellation, ModulationError};

/// A quantizer over sorted radius levels
///
/// Holds a sorted `codes` table of valid levels and a `parts`
/// table of the midpoint boundaries between them. `parts`
/// always has exactly one fewer entry than `codes`, so that
/// `parts[i]` separates `codes[i]` from `codes[i+1]`.
#[derive(Clone, Debug, PartialEq)]
pub struct PartitionTable {
    parts: Vec<f64>,
    codes: Vec<f64>,
}

impl PartitionTable {
    /// Build from a set of quantization levels
    ///
    /// `levels` need not be sorted or unique; duplicates
    /// (within a small tolerance) are merged.
    pub fn from_levels(levels: impl IntoIterator<Item = f64>) -> Self {
        let mut codes: Vec<f64> = levels.into_iter().collect();
        codes.sort_by(|a, b| a.partial_cmp(b).expect("non-finite level"));
        codes.dedup_by(|a, b| (*a - *b).abs() < 1e-12);

        let parts = codes.windows(2).map(|w| w[0] + (w[1] - w[0]) / 2.0).collect();

        Self { parts, codes }
    }

    /// Partition boundaries
    pub fn parts(&self) -> &[f64] {
        &self.parts
    }

    /// Quantization levels
    pub fn codes(&self) -> &[f64] {
        &self.codes
    }

    /// Nearest level to `value`
    ///
    /// Binary-searches the partition boundaries and returns the
    /// code of the bucket `value` falls in.
    #[inline]
    pub fn quantize(&self, value: f64) -> f64 {
        let ind = self.parts.partition_point(|p| *p < value);
        self.codes[ind]
    }
}

/// Reference moments and tables for one modulation order
///
/// Derived once from a [`Constellation`] and injected into the
/// error criteria. Immutable.
#[derive(Clone, Debug, PartialEq)]
pub struct ConstellationStats {
    constellation: Constellation,
    cm_target: f64,
    cm_target_complex: Complex<f64>,
    radius: PartitionTable,
    axis_re: PartitionTable,
    axis_im: PartitionTable,
    sca_target: f64,
}

impl ConstellationStats {
    /// Derive statistics for QAM order `order`
    ///
    /// Fails if `order` is not a square QAM order; the
    /// constellation provider's error propagates unchanged.
    pub fn new(order: u32) -> Result<Self, ModulationError> {
        Ok(Self::from_constellation(Constellation::new(order)?))
    }

    /// Derive statistics from an existing constellation
    pub fn from_constellation(constellation: Constellation) -> Self {
        let points = constellation.points();

        let cm_target = moment_ratio(points.iter().map(|s| s.norm_sqr()));
        let cm_target_complex = Complex::new(
            moment_ratio(points.iter().map(|s| s.re * s.re)),
            moment_ratio(points.iter().map(|s| s.im * s.im)),
        );

        // |s|⁴/|s|² collapses to the squared radius; the codes
        // are the distinct squared radii of the constellation
        let radius = PartitionTable::from_levels(points.iter().map(|s| s.norm_sqr()));
        let axis_re = PartitionTable::from_levels(points.iter().map(|s| s.re * s.re));
        let axis_im = PartitionTable::from_levels(points.iter().map(|s| s.im * s.im));

        let sca_target = sca_target(points);

        Self {
            constellation,
            cm_target,
            cm_target_complex,
            radius,
            axis_re,
            axis_im,
            sca_target,
        }
    }

    /// The constellation these statistics derive from
    pub fn constellation(&self) -> &Constellation {
        &self.constellation
    }

    /// Constant-modulus target `R = E[|s|⁴]/E[|s|²]`
    pub fn cm_target(&self) -> f64 {
        self.cm_target
    }

    /// Per-axis constant-modulus target
    ///
    /// The real and imaginary parts carry the independent
    /// fourth-to-second moment ratios of the I and Q axes.
    pub fn cm_target_complex(&self) -> Complex<f64> {
        self.cm_target_complex
    }

    /// Radius partition/code table (squared radii)
    pub fn radius_table(&self) -> &PartitionTable {
        &self.radius
    }

    /// Per-axis partition/code tables, `(real, imag)`
    pub fn axis_tables(&self) -> (&PartitionTable, &PartitionTable) {
        (&self.axis_re, &self.axis_im)
    }

    /// Square-contour target for the SCA criterion
    pub fn sca_target(&self) -> f64 {
        self.sca_target
    }
}

// Fourth-to-second moment ratio of a sequence of squared values
//
// Input items are v = x², for which the ratio E[x⁴]/E[x²]
// becomes E[v²]/E[v].
fn moment_ratio(squares: impl Iterator<Item = f64> + Clone) -> f64 {
    let count = squares.clone().count() as f64;
    let second: f64 = squares.clone().sum::<f64>() / count;
    let fourth: f64 = squares.map(|v| v * v).sum::<f64>() / count;
    fourth / second
}

// Square-contour target R'
//
// Derived from the rotated-diamond statistic of the symbol set:
// with u = Re(s)+Im(s) and v = Re(s)−Im(s),
//
// ```txt
// Rd(s) = (|u| + |v|) · ((sgn u + sgn v) + j(sgn u − sgn v)) · conj(s)
// R'    = E[(|u| + |v|)² · Rd] / (4 · E[Rd])
// ```
//
// By the symmetry of square QAM the imaginary parts cancel and
// the ratio is real.
fn sca_target(points: &[Complex<f64>]) -> f64 {
    let mut weighted: Complex<f64> = Complex::zero();
    let mut total: Complex<f64> = Complex::zero();
    for s in points {
        let contour = (s.re + s.im).abs() + (s.re - s.im).abs();
        let rdash = contour * rotated_sign(*s) * s.conj();
        weighted += contour * contour * rdash;
        total += rdash;
    }
    (weighted / (4.0 * total)).re
}

/// Sign operator on the rotated (diamond) axes
///
/// Returns `(sgn u + sgn v) + j(sgn u − sgn v)` for
/// `u = Re + Im`, `v = Re − Im`, with `sgn 0 = 0`.
pub(crate) fn rotated_sign(value: Complex<f64>) -> Complex<f64> {
    let su = sign(value.re + value.im);
    let sv = sign(value.re - value.im);
    Complex::new(su + sv, su - sv)
}

// np.sign semantics: sign(0) is 0
#[inline]
fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}
