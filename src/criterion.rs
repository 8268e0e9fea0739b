//! Blind error criteria
//!
//! Each criterion maps one equalizer output sample `y` to a
//! complex error `e`, chosen so that the stochastic-gradient
//! update `w ← w + μ·e·conj(x)` descends the criterion's cost
//! surface. The criteria differ only in which statistic of the
//! constellation they steer toward:
//!
//! * **Cma** / **Mcma**: a constant-modulus target, joint or
//!   per-axis. Robust far from convergence; used for the
//!   coarse phase of a cascade.
//! * **Rde** / **Mrde**: the nearest valid constellation
//!   radius, selected through a partition/code table. Sharper
//!   than CMA on multi-ring QAM.
//! * **Sbd** / **Mddma**: decision-directed, with the nearest
//!   constellation point standing in for the transmitted
//!   symbol. Only usable once the eye is reasonably open.
//! * **Sca** / **Cme**: square-contour and constellation-
//!   matched variants.
//!
//! The adaptive variants wrap a base rule with a block-wise
//! convergence monitor that anneals the effective step size.
//!
//! Dispatch is a closed enum with one payload per family;
//! every constant or table a rule needs is carried in its
//! payload, and the adaptive counters are explicit state. No
//! variant keeps hidden globals.
//!
//! None of the rules guard against NaN or Inf: a diverging
//! tap vector propagates silently, as is usual for this
//! algorithm family. Callers wanting robustness should check
//! finiteness of the error trace between phases.

use std::f64::consts::PI;

use num_complex::Complex;

use crate::constellation::Constellation;
use crate::stats::{rotated_sign, ConstellationStats, PartitionTable};

/// Criterion identity, without payload
///
/// Names one member of the criterion family. Combine with a
/// [`ConstellationStats`] via [`build()`](#method.build) to
/// obtain a runnable [`ErrorCriterion`]. Because this is a
/// closed enumeration, an unsupported criterion cannot be
/// expressed at all; dispatch is checked at compile time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CriterionKind {
    /// Constant modulus algorithm
    Cma,
    /// Modified (per-axis) constant modulus algorithm
    Mcma,
    /// Radius directed equalization
    Rde,
    /// Modified (per-axis) radius directed equalization
    Mrde,
    /// Symbol based decision
    Sbd,
    /// Modified decision-directed modulus algorithm
    Mddma,
    /// Square contour algorithm
    Sca,
    /// Constellation matched error
    Cme,
    /// MCMA with annealing step size
    McmaAdaptive,
    /// SBD with annealing step size
    SbdAdaptive,
}

impl CriterionKind {
    /// Attach the payload this criterion needs
    ///
    /// Looks up the target constant, partition/code table, or
    /// symbol set from `stats` and returns a runnable
    /// criterion with fresh per-call state.
    pub fn build(&self, stats: &ConstellationStats) -> ErrorCriterion {
        match self {
            CriterionKind::Cma => ErrorCriterion::Cma {
                target: stats.cm_target(),
            },
            CriterionKind::Mcma => ErrorCriterion::Mcma {
                target: stats.cm_target_complex(),
            },
            CriterionKind::Rde => ErrorCriterion::Rde {
                table: stats.radius_table().clone(),
            },
            CriterionKind::Mrde => {
                let (table_re, table_im) = stats.axis_tables();
                ErrorCriterion::Mrde {
                    table_re: table_re.clone(),
                    table_im: table_im.clone(),
                }
            }
            CriterionKind::Sbd => ErrorCriterion::Sbd {
                constellation: stats.constellation().clone(),
            },
            CriterionKind::Mddma => ErrorCriterion::Mddma {
                constellation: stats.constellation().clone(),
            },
            CriterionKind::Sca => ErrorCriterion::Sca {
                target: stats.sca_target(),
            },
            CriterionKind::Cme => ErrorCriterion::Cme {
                target: stats.cm_target(),
                spacing: stats.constellation().min_distance(),
                weight: ErrorCriterion::CME_WEIGHT,
            },
            CriterionKind::McmaAdaptive => ErrorCriterion::McmaAdaptive {
                target: stats.cm_target_complex(),
                constellation: stats.constellation().clone(),
                state: AnnealState::new(stats.constellation().min_distance()),
            },
            CriterionKind::SbdAdaptive => ErrorCriterion::SbdAdaptive {
                constellation: stats.constellation().clone(),
                state: AnnealState::new(stats.constellation().min_distance()),
            },
        }
    }
}

/// A runnable blind error criterion
///
/// Holds the constants and per-call state for one member of
/// the criterion family. Build one from a [`CriterionKind`].
/// Criteria are cheap to clone; the cascade builds a fresh one
/// per polarization so that adaptive state never crosses
/// polarization boundaries.
#[derive(Clone, Debug, PartialEq)]
pub enum ErrorCriterion {
    /// `e = y·(R − |y|²)`
    Cma { target: f64 },
    /// `e = Re(y)·(Re(R) − Re(y)²) + j·Im(y)·(Im(R) − Im(y)²)`
    Mcma { target: Complex<f64> },
    /// `e = y·(code(|y|²) − |y|²)`
    Rde { table: PartitionTable },
    /// Per-axis analogue of RDE
    Mrde {
        table_re: PartitionTable,
        table_im: PartitionTable,
    },
    /// Decision-directed, per-axis sign-weighted error
    Sbd { constellation: Constellation },
    /// Constant-modulus form with decided per-axis targets
    Mddma { constellation: Constellation },
    /// Square contour error on the rotated diamond axes
    Sca { target: f64 },
    /// CMA plus a sinusoidal constellation-matched penalty
    Cme {
        target: f64,
        spacing: f64,
        weight: f64,
    },
    /// MCMA with block-annealed step size
    McmaAdaptive {
        target: Complex<f64>,
        constellation: Constellation,
        state: AnnealState,
    },
    /// SBD with block-annealed step size
    SbdAdaptive {
        constellation: Constellation,
        state: AnnealState,
    },
}

impl ErrorCriterion {
    /// Weight of the sinusoidal term in the CME criterion
    pub const CME_WEIGHT: f64 = 0.1;

    /// Per-sample error for equalizer output `y`
    ///
    /// Adaptive variants also feed their convergence monitor,
    /// which is why this method takes `&mut self`.
    pub fn error(&mut self, y: Complex<f64>) -> Complex<f64> {
        match self {
            ErrorCriterion::Cma { target } => cma_error(y, *target),
            ErrorCriterion::Mcma { target } => mcma_error(y, *target),
            ErrorCriterion::Rde { table } => {
                let ssq = y.norm_sqr();
                y * (table.quantize(ssq) - ssq)
            }
            ErrorCriterion::Mrde { table_re, table_im } => {
                let re_sq = y.re * y.re;
                let im_sq = y.im * y.im;
                Complex::new(
                    y.re * (table_re.quantize(re_sq) - re_sq),
                    y.im * (table_im.quantize(im_sq) - im_sq),
                )
            }
            ErrorCriterion::Sbd { constellation } => sbd_error(y, constellation),
            ErrorCriterion::Mddma { constellation } => {
                let decided = constellation.decide(y);
                Complex::new(
                    y.re * (decided.re * decided.re - y.re * y.re),
                    y.im * (decided.im * decided.im - y.im * y.im),
                )
            }
            ErrorCriterion::Sca { target } => {
                let contour = (y.re + y.im).abs() + (y.re - y.im).abs();
                0.25 * (4.0 * *target - contour * contour) * contour * rotated_sign(y)
            }
            ErrorCriterion::Cme {
                target,
                spacing,
                weight,
            } => {
                let sine = Complex::new(
                    (PI * y.re / *spacing).sin(),
                    (PI * y.im / *spacing).sin(),
                );
                cma_error(y, *target) + *weight * PI / (2.0 * *spacing) * sine
            }
            ErrorCriterion::McmaAdaptive {
                target,
                constellation,
                state,
            } => {
                state.observe((y - constellation.decide(y)).norm());
                mcma_error(y, *target)
            }
            ErrorCriterion::SbdAdaptive {
                constellation,
                state,
            } => {
                state.observe((y - constellation.decide(y)).norm());
                sbd_error(y, constellation)
            }
        }
    }

    /// Multiplier applied to the configured step size
    ///
    /// Always 1.0 for the fixed-step criteria. The adaptive
    /// variants halve this each time a sample block clears the
    /// convergence threshold.
    pub fn step_scale(&self) -> f64 {
        match self {
            ErrorCriterion::McmaAdaptive { state, .. }
            | ErrorCriterion::SbdAdaptive { state, .. } => state.scale,
            _ => 1.0,
        }
    }

    /// Current tolerance radius of the convergence monitor
    ///
    /// `None` for the fixed-step criteria.
    pub fn anneal_radius(&self) -> Option<f64> {
        match self {
            ErrorCriterion::McmaAdaptive { state, .. }
            | ErrorCriterion::SbdAdaptive { state, .. } => Some(state.radius),
            _ => None,
        }
    }
}

#[inline]
fn cma_error(y: Complex<f64>, target: f64) -> Complex<f64> {
    y * (target - y.norm_sqr())
}

#[inline]
fn mcma_error(y: Complex<f64>, target: Complex<f64>) -> Complex<f64> {
    Complex::new(
        y.re * (target.re - y.re * y.re),
        y.im * (target.im - y.im * y.im),
    )
}

// Per-axis decision error, weighted by the magnitude of the
// decided coordinate
#[inline]
fn sbd_error(y: Complex<f64>, constellation: &Constellation) -> Complex<f64> {
    let decided = constellation.decide(y);
    Complex::new(
        (decided.re - y.re) * decided.re.abs(),
        (decided.im - y.im) * decided.im.abs(),
    )
}

/// Block-wise step-size annealing state
///
/// Counts, over fixed blocks of [`BLOCK`](#associatedconstant.BLOCK)
/// samples, the fraction of equalizer outputs that land within
/// a tolerance `radius` of their decided symbol. Whenever that
/// fraction exceeds [`THRESHOLD`](#associatedconstant.THRESHOLD),
/// both the step-size scale and the radius are multiplied by
/// [`ANNEAL`](#associatedconstant.ANNEAL). Tightening stops
/// once the radius reaches 0.4 of the minimum inter-symbol
/// distance, giving a decreasing step size without a fixed
/// schedule.
#[derive(Clone, Debug, PartialEq)]
pub struct AnnealState {
    // multiplier on the configured step size
    scale: f64,

    // current tolerance radius around the decided symbol
    radius: f64,

    // radius at which tightening stops
    floor: f64,

    // samples observed in the current block
    seen: usize,

    // samples within the radius in the current block
    hits: usize,
}

impl AnnealState {
    /// Samples per convergence block
    pub const BLOCK: usize = 50;

    /// Convergence fraction that triggers annealing
    pub const THRESHOLD: f64 = 0.9;

    /// Step and radius multiplier per annealing event
    pub const ANNEAL: f64 = 0.5;

    /// Radius floor, as a fraction of the symbol spacing
    pub const FLOOR: f64 = 0.4;

    fn new(min_distance: f64) -> Self {
        Self {
            scale: 1.0,
            radius: 0.99 * min_distance,
            floor: Self::FLOOR * min_distance,
            seen: 0,
            hits: 0,
        }
    }

    // Feed one sample's distance-to-decision; closes out the
    // block and anneals when due
    fn observe(&mut self, distance: f64) {
        if distance < self.radius {
            self.hits += 1;
        }
        self.seen += 1;

        if self.seen == Self::BLOCK {
            let fraction = self.hits as f64 / Self::BLOCK as f64;
            if fraction > Self::THRESHOLD && self.radius > self.floor {
                self.scale *= Self::ANNEAL;
                self.radius *= Self::ANNEAL;
            }
            self.seen = 0;
            self.hits = 0;
        }
    }
}
