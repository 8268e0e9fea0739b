//! # blindeq: blind adaptive dual-polarization equalization
//!
//! This crate recovers transmitted symbols from a
//! dual-polarization complex baseband signal distorted by
//! polarization-mode dispersion and residual channel
//! dispersion, *without* reference to known pilot symbols.
//! Two adaptive FIR filters (one per output polarization) are
//! trained by stochastic gradient descent on a blind error
//! criterion derived from the statistics of the QAM
//! constellation alone.
//!
//! ## Example
//!
//! ```
//! use blindeq::{CriterionKind, DualPol, EqualizerBuilder, Phase};
//! use num_complex::Complex;
//!
//! // a toy dual-pol QPSK signal at one sample per symbol
//! let axis = 0.5f64.sqrt();
//! let qpsk = [
//!     Complex::new(axis, axis),
//!     Complex::new(-axis, axis),
//!     Complex::new(-axis, -axis),
//!     Complex::new(axis, -axis),
//! ];
//! let x: Vec<_> = (0..512).map(|i| qpsk[i % 4]).collect();
//! let y: Vec<_> = (0..512).map(|i| qpsk[(i + 1) % 4]).collect();
//! let signal = DualPol::new(x, y);
//!
//! // constant-modulus training, then apply the taps
//! let mut builder = EqualizerBuilder::new(4);
//! builder
//!     .with_taps(5)
//!     .with_oversampling(1)
//!     .with_phase(Phase::new(CriterionKind::Cma, 1e-3).symbols(400));
//! let equalizer = builder.build().expect("square QAM order");
//!
//! let out = equalizer.equalize(&signal).expect("signal long enough");
//! assert_eq!(out.signal.len(), 512 - 5 + 1);
//! ```
//!
//! ## Training cascades
//!
//! Constant-modulus criteria converge from a cold start but
//! plateau on multi-ring QAM; radius-directed and
//! decision-directed criteria are sharp but only converge
//! near the solution. The usual remedy is a *cascade*: train
//! coarsely with [`CriterionKind::Cma`] or
//! [`CriterionKind::Mcma`], then hand the taps to
//! [`CriterionKind::Rde`], [`CriterionKind::Sbd`], or another
//! refinement criterion. [`EqualizerBuilder`] has presets for
//! the canonical cascades, and arbitrary phase lists can be
//! assembled from [`Phase`] values.
//!
//! The Y polarization's filter is seeded orthogonally from
//! the X polarization's initial taps, which decouples the two
//! outputs under a unitary (PMD-like) channel rotation.
//!
//! ## Scope
//!
//! The crate operates on in-memory sample buffers and carries
//! no I/O. Chromatic-dispersion compensation, carrier-phase
//! recovery, and frequency-offset estimation are upstream or
//! downstream stages and live elsewhere.
//!
//! A note on numerics: as is usual for this algorithm family,
//! a diverging filter (too-large step size, degenerate input)
//! propagates NaN silently. Check the error traces between
//! phases if you need to detect it.

mod builder;
mod cascade;
mod constellation;
mod criterion;
mod filter;
mod signal;
mod stats;
mod taps;
mod trainer;

#[cfg(test)]
mod testsig;

pub use builder::EqualizerBuilder;
pub use cascade::{Equalized, Equalizer, Phase};
pub use constellation::{qam_symbols, scaling_factor, Constellation, ModulationError};
pub use criterion::{AnnealState, CriterionKind, ErrorCriterion};
pub use filter::apply_filter;
pub use signal::DualPol;
pub use stats::{ConstellationStats, PartitionTable};
pub use taps::TapState;
pub use trainer::{train, TrainError};
