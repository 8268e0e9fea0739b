//! Equalizer configuration

use crate::cascade::{Equalizer, Phase};
use crate::constellation::ModulationError;
use crate::criterion::CriterionKind;
use crate::stats::ConstellationStats;

/// Builds a blind dual-polarization equalizer
///
/// The builder comes with a sensible set of default options;
/// all you really need to provide is the QAM order. The
/// defaults suit a two-fold oversampled coherent signal, but
/// the filter geometry and the training cascade are fully
/// configurable.
///
/// If no phase is configured, [`build()`](#method.build)
/// falls back to a single adaptive-MCMA phase over the whole
/// training window.
#[derive(Clone, Debug, PartialEq)]
pub struct EqualizerBuilder {
    order: u32,
    n_taps: usize,
    oversampling: usize,
    phases: Vec<Phase>,
}

impl EqualizerBuilder {
    /// New builder for QAM order `order`
    pub fn new(order: u32) -> Self {
        Self {
            order,
            n_taps: 13,
            oversampling: 2,
            phases: Vec::new(),
        }
    }

    /// Filter length, taps per input channel
    ///
    /// Longer filters absorb more residual dispersion but
    /// converge more slowly. At least one tap is required.
    pub fn with_taps(&mut self, n_taps: usize) -> &mut Self {
        self.n_taps = usize::max(n_taps, 1);
        self
    }

    /// Oversampling factor
    ///
    /// The integer ratio of sample rate to symbol rate; must
    /// be at least 1. The training stride and the decimation
    /// of the applied filter both follow it.
    pub fn with_oversampling(&mut self, os: usize) -> &mut Self {
        self.oversampling = usize::max(os, 1);
        self
    }

    /// Append one training phase
    pub fn with_phase(&mut self, phase: Phase) -> &mut Self {
        self.phases.push(phase);
        self
    }

    /// Coarse CMA, then radius-directed refinement
    ///
    /// The canonical dual-mode cascade: the constant-modulus
    /// criterion trains `symbols.0` symbols from fresh taps,
    /// then RDE refines those taps for `symbols.1` symbols on
    /// the remaining portion of the window.
    pub fn cma_then_rde(&mut self, step: (f64, f64), symbols: (usize, usize)) -> &mut Self {
        self.with_phase(Phase::new(CriterionKind::Cma, step.0).symbols(symbols.0))
            .with_phase(Phase::new(CriterionKind::Rde, step.1).symbols(symbols.1))
    }

    /// Per-axis MCMA, then per-axis radius refinement
    pub fn mcma_then_mrde(&mut self, step: (f64, f64), symbols: (usize, usize)) -> &mut Self {
        self.with_phase(Phase::new(CriterionKind::Mcma, step.0).symbols(symbols.0))
            .with_phase(Phase::new(CriterionKind::Mrde, step.1).symbols(symbols.1))
    }

    /// Per-axis MCMA, then symbol-based decisions
    pub fn mcma_then_sbd(&mut self, step: (f64, f64), symbols: (usize, usize)) -> &mut Self {
        self.with_phase(Phase::new(CriterionKind::Mcma, step.0).symbols(symbols.0))
            .with_phase(Phase::new(CriterionKind::Sbd, step.1).symbols(symbols.1))
    }

    /// Per-axis MCMA, then decision-directed modulus
    pub fn mcma_then_mddma(&mut self, step: (f64, f64), symbols: (usize, usize)) -> &mut Self {
        self.with_phase(Phase::new(CriterionKind::Mcma, step.0).symbols(symbols.0))
            .with_phase(Phase::new(CriterionKind::Mddma, step.1).symbols(symbols.1))
    }

    /// Run one criterion twice over the same window
    ///
    /// Generic dual-mode form: a first pass from fresh taps,
    /// then a second pass of the *same* criterion re-seeded
    /// with the first pass's result, for convergence
    /// verification.
    pub fn dual_mode(&mut self, criterion: CriterionKind, step: f64) -> &mut Self {
        self.with_phase(Phase::new(criterion, step).hold_window())
            .with_phase(Phase::new(criterion, step))
    }

    /// QAM order
    pub fn order(&self) -> u32 {
        self.order
    }

    /// Filter length, taps per input channel
    pub fn n_taps(&self) -> usize {
        self.n_taps
    }

    /// Oversampling factor
    pub fn oversampling(&self) -> usize {
        self.oversampling
    }

    /// Configured phases
    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    /// Build the equalizer
    ///
    /// Derives the constellation statistics for the configured
    /// order, which fails for orders with no square-QAM
    /// representation.
    pub fn build(&self) -> Result<Equalizer, ModulationError> {
        let stats = ConstellationStats::new(self.order)?;
        let phases = if self.phases.is_empty() {
            vec![Phase::new(CriterionKind::McmaAdaptive, 1e-3)]
        } else {
            self.phases.clone()
        };
        Ok(Equalizer::new(stats, self.n_taps, self.oversampling, phases))
    }
}

impl std::default::Default for EqualizerBuilder {
    fn default() -> Self {
        Self::new(4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let eq = EqualizerBuilder::new(16).build().unwrap();
        assert_eq!(eq.phases().len(), 1);
        assert_eq!(eq.phases()[0].criterion(), CriterionKind::McmaAdaptive);
        assert_eq!(eq.stats().constellation().order(), 16);
    }

    #[test]
    fn test_preset_cascade() {
        let mut builder = EqualizerBuilder::new(64);
        builder
            .with_taps(17)
            .with_oversampling(2)
            .mcma_then_sbd((2e-3, 5e-4), (10_000, 20_000));
        let eq = builder.build().unwrap();

        assert_eq!(eq.phases().len(), 2);
        assert_eq!(eq.phases()[0].criterion(), CriterionKind::Mcma);
        assert_eq!(eq.phases()[1].criterion(), CriterionKind::Sbd);
        assert_eq!(eq.phases()[1].step_size(), 5e-4);
    }

    #[test]
    fn test_bad_order() {
        assert_eq!(
            EqualizerBuilder::new(32).build().unwrap_err(),
            ModulationError::NotSquareQam(32)
        );
    }

    #[test]
    fn test_clamps() {
        let mut builder = EqualizerBuilder::new(4);
        builder.with_taps(0).with_oversampling(0);
        assert_eq!(builder.n_taps(), 1);
        assert_eq!(builder.oversampling(), 1);
    }
}
