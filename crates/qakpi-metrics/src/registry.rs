//! Calculator registry
//!
//! Holds the calculators the engine runs for every release, in
//! registration order.

use crate::calculators::{
    CoverageCalculator, KpiCalculator, KpiInput, ResultsMixCalculator, ScopeCalculator,
};
use crate::kpi::KpiDatum;

/// Ordered set of KPI calculators
pub struct KpiRegistry {
    calculators: Vec<Box<dyn KpiCalculator>>,
}

impl KpiRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            calculators: Vec::new(),
        }
    }

    /// Create registry with scope, coverage and results-mix calculators
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(ScopeCalculator);
        registry.register(CoverageCalculator);
        registry.register(ResultsMixCalculator);
        registry
    }

    /// Register a calculator; a calculator with the same name is replaced
    pub fn register<C: KpiCalculator>(&mut self, calculator: C) {
        let name = calculator.name();
        match self.calculators.iter().position(|c| c.name() == name) {
            Some(index) => self.calculators[index] = Box::new(calculator),
            None => self.calculators.push(Box::new(calculator)),
        }
    }

    /// Registered calculator names
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.calculators.iter().map(|c| c.name()).collect()
    }

    /// Number of calculators
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.calculators.len()
    }

    /// No calculators registered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.calculators.is_empty()
    }

    /// Run every calculator and concatenate their output
    #[must_use]
    pub fn compute_all(&self, input: &KpiInput<'_>) -> Vec<KpiDatum> {
        let data: Vec<KpiDatum> = self
            .calculators
            .iter()
            .flat_map(|c| c.compute(input))
            .collect();
        tracing::debug!(
            project = input.project,
            release = input.release,
            kpis = data.len(),
            "computed release KPIs"
        );
        data
    }
}

impl Default for KpiRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for KpiRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KpiRegistry")
            .field("calculators", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kpi::{names, KpiValue};
    use crate::stats::RunStatistics;

    struct ConstantCalculator(u64);

    impl KpiCalculator for ConstantCalculator {
        fn name(&self) -> &'static str {
            "constant"
        }

        fn compute(&self, input: &KpiInput<'_>) -> Vec<KpiDatum> {
            vec![KpiDatum::new(
                "constant",
                "Constant",
                KpiValue::count(self.0),
                input.project,
                input.release,
            )]
        }
    }

    fn input(stats: &RunStatistics) -> KpiInput<'_> {
        KpiInput {
            project: "WEB",
            release: "1.0_QA",
            plans: &[],
            stats,
        }
    }

    #[test]
    fn defaults_produce_seven_kpis_in_order() {
        let registry = KpiRegistry::with_defaults();
        assert_eq!(registry.names(), vec!["scope", "coverage", "results_mix"]);

        let stats = RunStatistics::default();
        let data = registry.compute_all(&input(&stats));
        let produced: Vec<_> = data.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(
            produced,
            vec![
                names::PLANNED_SCOPE,
                names::EXECUTED_CASES,
                names::COVERAGE_PCT,
                names::PASSED_PCT,
                names::FAILED_PCT,
                names::BLOCKED_PCT,
                names::RETEST_PCT,
            ]
        );
    }

    #[test]
    fn register_replaces_same_name() {
        let mut registry = KpiRegistry::new();
        assert!(registry.is_empty());

        registry.register(ConstantCalculator(1));
        registry.register(ConstantCalculator(2));
        assert_eq!(registry.len(), 1);

        let stats = RunStatistics::default();
        let data = registry.compute_all(&input(&stats));
        assert_eq!(data[0].value, KpiValue::count(2));
    }

    #[test]
    fn registry_debug() {
        let debug = format!("{:?}", KpiRegistry::default());
        assert!(debug.contains("results_mix"));
    }
}
