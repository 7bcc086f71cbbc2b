use super::{
    ConsecutiveNumberConstraint, DecadeClusterLimit, HistoricalFirstPrizeExclude,
    LowHighImbalanceAtLeast, MustExclude, MustInclude, OddEvenRange, OnesDigitPattern, Rule,
    RuleDescriptor, RuleParameters, SumOutsideRange,
};
use crate::models::RuleInstance;
use crate::services::history::DrawHistory;
use std::sync::Arc;

/// Every built-in rule, registered once at startup.
///
/// The list is explicit: adding a rule means adding a line to [`RuleRegistry::new`].
/// Rules are shared (`Arc`) between the registry and any number of rule instances.
#[derive(Clone)]
pub struct RuleRegistry {
    rules: Vec<Arc<dyn Rule>>,
}

impl RuleRegistry {
    /// Build the registry. `history` backs `HistoricalFirstPrizeExclude` and must
    /// already be loaded.
    pub fn new(history: Arc<dyn DrawHistory>) -> Self {
        let rules: Vec<Arc<dyn Rule>> = vec![
            Arc::new(ConsecutiveNumberConstraint),
            Arc::new(DecadeClusterLimit),
            Arc::new(HistoricalFirstPrizeExclude::new(history)),
            Arc::new(LowHighImbalanceAtLeast),
            Arc::new(MustExclude),
            Arc::new(MustInclude),
            Arc::new(OddEvenRange),
            Arc::new(OnesDigitPattern),
            Arc::new(SumOutsideRange),
        ];

        tracing::debug!("Registered {} rules", rules.len());
        Self { rules }
    }

    pub fn get(&self, key: &str) -> Option<Arc<dyn Rule>> {
        self.rules.iter().find(|rule| rule.key() == key).cloned()
    }

    pub fn rules(&self) -> &[Arc<dyn Rule>] {
        &self.rules
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.iter().map(|rule| rule.key())
    }

    pub fn descriptors(&self) -> Vec<RuleDescriptor> {
        self.rules.iter().map(|rule| rule.describe()).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Create an enabled rule instance: declared defaults first, then `overrides`.
    ///
    /// Returns `None` for an unknown key.
    pub fn instantiate(&self, key: &str, overrides: &RuleParameters) -> Option<RuleInstance> {
        let rule = self.get(key)?;
        let mut parameters = RuleParameters::from_specs(rule.parameter_specs());
        for (name, value) in overrides.iter() {
            parameters.set(name, value);
        }
        Some(RuleInstance::new(rule, parameters))
    }
}

impl std::fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.keys()).finish()
    }
}
