//! Multi-phase training orchestration
//!
//! Blind equalizers converge best in stages: a robust
//! constant-modulus criterion opens the eye, then a sharper
//! radius-directed or decision-directed criterion takes over
//! on the taps the first stage produced. The [`Equalizer`]
//! drives an ordered list of [`Phase`]s through the generic
//! training loop, carrying the tap state from phase to phase,
//! and finally applies the converged tap pair to the whole
//! signal once, not per phase.
//!
//! Both polarizations run the identical phase sequence. The Y
//! polarization's taps are seeded orthogonally from X's
//! *initial* center-spike taps; after that the two
//! polarizations train independently, coupled only through the
//! shared input windows.
//!
//! The cascade fails fast: the window arithmetic for every
//! phase is validated by the training loop before that phase
//! mutates any taps, and the first failing phase aborts the
//! whole run.

#[cfg(not(test))]
use log::debug;

#[cfg(test)]
use std::println as debug;

use num_complex::Complex;

use crate::criterion::CriterionKind;
use crate::filter::apply_filter;
use crate::signal::DualPol;
use crate::stats::ConstellationStats;
use crate::taps::TapState;
use crate::trainer::{train, TrainError};

/// One stage of a training cascade
///
/// A phase names a criterion, a step size, how many symbols to
/// train, and how it relates to its neighbors: whether the
/// next phase starts on the *remaining* portion of the
/// training window and whether this phase restarts from fresh
/// center-spike taps instead of carrying the previous phase's
/// result.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Phase {
    criterion: CriterionKind,
    step_size: f64,
    symbols: Option<usize>,
    iterations: usize,
    advance: bool,
    reset_taps: bool,
}

impl Phase {
    /// New phase with the given criterion and step size
    ///
    /// By default the phase trains as many symbols as the
    /// signal allows, runs a single iteration, carries taps in
    /// from the previous phase, and advances the window for
    /// the phase after it.
    pub fn new(criterion: CriterionKind, step_size: f64) -> Self {
        Self {
            criterion,
            step_size,
            symbols: None,
            iterations: 1,
            advance: true,
            reset_taps: false,
        }
    }

    /// Train exactly `n` symbols
    pub fn symbols(mut self, n: usize) -> Self {
        self.symbols = Some(n);
        self
    }

    /// Re-run the phase `n` times over the same window
    pub fn iterations(mut self, n: usize) -> Self {
        self.iterations = usize::max(n, 1);
        self
    }

    /// Let the next phase reuse this phase's window
    ///
    /// Used by dual-mode training, where a second pass of the
    /// same criterion re-trains over the same symbols.
    pub fn hold_window(mut self) -> Self {
        self.advance = false;
        self
    }

    /// Restart from fresh center-spike taps
    pub fn reset_taps(mut self) -> Self {
        self.reset_taps = true;
        self
    }

    /// The phase's criterion
    pub fn criterion(&self) -> CriterionKind {
        self.criterion
    }

    /// The phase's step size
    pub fn step_size(&self) -> f64 {
        self.step_size
    }
}

/// Result of a completed equalization run
#[derive(Clone, Debug, PartialEq)]
pub struct Equalized {
    /// Equalized signal, one sample per polarization per symbol
    pub signal: DualPol,

    /// Converged taps for the X output polarization
    pub taps_x: TapState,

    /// Converged taps for the Y output polarization
    pub taps_y: TapState,

    /// Per-phase error traces, `[x, y]` per phase
    ///
    /// Diagnostic output only; iterations within a phase are
    /// concatenated.
    pub traces: Vec<[Vec<Complex<f64>>; 2]>,
}

/// A phased blind equalizer
///
/// Owns the constellation statistics, the filter geometry, and
/// the phase list. Construct one directly or through
/// [`EqualizerBuilder`](crate::EqualizerBuilder).
#[derive(Clone, Debug)]
pub struct Equalizer {
    stats: ConstellationStats,
    n_taps: usize,
    oversampling: usize,
    phases: Vec<Phase>,
}

impl Equalizer {
    /// Create from parts
    ///
    /// `n_taps` is the per-input-channel filter length and
    /// `oversampling` the integer ratio of sample rate to
    /// symbol rate. An oversampling of zero is clamped to 1,
    /// matching the builder.
    pub fn new(
        stats: ConstellationStats,
        n_taps: usize,
        oversampling: usize,
        phases: Vec<Phase>,
    ) -> Self {
        Self {
            stats,
            n_taps,
            oversampling: usize::max(oversampling, 1),
            phases,
        }
    }

    /// Constellation statistics in use
    pub fn stats(&self) -> &ConstellationStats {
        &self.stats
    }

    /// Configured phases
    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    /// Train the cascade and equalize the signal
    ///
    /// Normalizes and centers a copy of `signal`, runs every
    /// phase for both polarizations, then applies the final
    /// tap pair across the whole signal. One complex sample
    /// per polarization per symbol period is produced.
    pub fn equalize(&self, signal: &DualPol) -> Result<Equalized, TrainError> {
        let mut normalized = signal.clone();
        normalized.normalize_and_center();

        let (taps_x, taps_y, traces) = self.train_taps(&normalized)?;
        let equalized = apply_filter(&normalized, self.oversampling, &taps_x, &taps_y);

        Ok(Equalized {
            signal: equalized,
            taps_x,
            taps_y,
            traces,
        })
    }

    /// Run the training phases only
    ///
    /// `signal` must already be normalized and centered.
    /// Returns the converged tap pair and the per-phase error
    /// traces without applying the filter.
    pub fn train_taps(
        &self,
        signal: &DualPol,
    ) -> Result<(TapState, TapState, Vec<[Vec<Complex<f64>>; 2]>), TrainError> {
        if self.phases.is_empty() {
            return Err(TrainError::EmptyCascade);
        }

        let os = self.oversampling;
        let mut taps_x = TapState::centered(self.n_taps);
        let mut taps_y = taps_x.orthogonal();

        let mut offset = 0usize;
        let mut traces = Vec::with_capacity(self.phases.len());
        for (ind, phase) in self.phases.iter().enumerate() {
            if phase.reset_taps {
                taps_x = TapState::centered(self.n_taps);
                taps_y = taps_x.orthogonal();
            }

            let n_symbols = match phase.symbols {
                Some(n) => n,
                None => usize::min(
                    signal.default_train_symbols(os, self.n_taps),
                    signal.train_capacity(offset, os, self.n_taps),
                ),
            };

            debug!(
                "phase {}: {:?}, {} symbols from sample {}",
                ind, phase.criterion, n_symbols, offset
            );

            let mut crit_x = phase.criterion.build(&self.stats);
            let mut crit_y = phase.criterion.build(&self.stats);
            let mut trace_x = Vec::with_capacity(phase.iterations * n_symbols);
            let mut trace_y = Vec::with_capacity(phase.iterations * n_symbols);
            for iter in 0..phase.iterations {
                if phase.iterations > 1 {
                    debug!("phase {}: iteration {}", ind, iter);
                }
                trace_x.extend(train(
                    signal,
                    offset,
                    n_symbols,
                    os,
                    phase.step_size,
                    &mut taps_x,
                    &mut crit_x,
                )?);
                trace_y.extend(train(
                    signal,
                    offset,
                    n_symbols,
                    os,
                    phase.step_size,
                    &mut taps_y,
                    &mut crit_y,
                )?);
            }
            traces.push([trace_x, trace_y]);

            if phase.advance {
                offset += n_symbols * os;
            }
        }

        Ok((taps_x, taps_y, traces))
    }
}
