use crate::models::{Combination, RuleInstance};
use crate::rules::{BoundRule, RuleError};
use std::collections::HashSet;

/// One enabled rule with its parameters already bound.
pub struct RuleSnapshot {
    pub key: &'static str,
    pub summary: String,
    predicate: BoundRule,
}

impl RuleSnapshot {
    pub fn excludes(&self, combo: &Combination) -> bool {
        (self.predicate)(combo)
    }
}

impl std::fmt::Debug for RuleSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleSnapshot")
            .field("key", &self.key)
            .field("summary", &self.summary)
            .finish_non_exhaustive()
    }
}

/// Immutable capture of the enabled rules and the soft-delete set, taken once per
/// scan or export.
///
/// Later edits to the condition list or the page store do not affect a snapshot,
/// so a worker can own one for the whole run.
#[derive(Debug, Default)]
pub struct FilterSnapshot {
    rules: Vec<RuleSnapshot>,
    removed: HashSet<Combination>,
}

impl FilterSnapshot {
    /// Bind every enabled condition, in order, and copy the soft-delete set.
    ///
    /// Signatures that do not parse as a combination cannot match any candidate
    /// and are dropped.
    pub fn capture(conditions: &[RuleInstance], removed: &HashSet<String>) -> Self {
        let rules: Vec<RuleSnapshot> = conditions
            .iter()
            .filter(|instance| instance.enabled)
            .map(|instance| RuleSnapshot {
                key: instance.key(),
                summary: instance.summary(),
                predicate: instance.rule.bind(&instance.parameters),
            })
            .collect();

        let removed: HashSet<Combination> = removed
            .iter()
            .filter_map(|signature| signature.parse().ok())
            .collect();

        tracing::debug!(
            "Captured filter snapshot: {} rules, {} soft-deleted",
            rules.len(),
            removed.len()
        );

        Self { rules, removed }
    }

    pub fn rules(&self) -> &[RuleSnapshot] {
        &self.rules
    }

    pub fn removed_count(&self) -> usize {
        self.removed.len()
    }

    /// `true` if any rule excludes `combo` (first match wins), otherwise whether
    /// it was soft-deleted.
    pub fn excludes(&self, combo: &Combination) -> bool {
        self.rules.iter().any(|rule| rule.excludes(combo)) || self.removed.contains(combo)
    }

    /// Same as [`excludes`](Self::excludes) for unvalidated input.
    pub fn should_exclude(&self, values: &[u8]) -> Result<bool, RuleError> {
        let combo = Combination::from_slice(values)?;
        Ok(self.excludes(&combo))
    }
}

/// Evaluate `combo` against live rule instances without binding.
///
/// Disabled instances are skipped. Rules run in order and stop at the first
/// exclusion; the soft-delete set is consulted only when no rule excludes.
pub fn should_exclude(
    combo: &[u8],
    conditions: &[RuleInstance],
    removed: &HashSet<String>,
) -> Result<bool, RuleError> {
    for instance in conditions.iter().filter(|instance| instance.enabled) {
        if instance.rule.evaluate(combo, &instance.parameters)? {
            return Ok(true);
        }
    }
    let combo = Combination::from_slice(combo)?;
    Ok(removed.contains(&combo.signature()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{MustInclude, Rule, RuleParameters, SumOutsideRange};
    use std::sync::Arc;

    fn instance(rule: Arc<dyn Rule>, params: &[(&str, &str)]) -> RuleInstance {
        let mut parameters = RuleParameters::from_specs(rule.parameter_specs());
        for (name, value) in params {
            parameters.set(*name, *value);
        }
        RuleInstance::new(rule, parameters)
    }

    #[test]
    fn test_no_rules_keeps_everything() {
        let snapshot = FilterSnapshot::capture(&[], &HashSet::new());
        assert!(!snapshot.should_exclude(&[1, 2, 3, 4, 5, 6]).unwrap());
    }

    #[test]
    fn test_disabled_rules_are_not_captured() {
        let mut sum = instance(Arc::new(SumOutsideRange), &[]);
        sum.enabled = false;
        let snapshot = FilterSnapshot::capture(&[sum], &HashSet::new());

        assert!(snapshot.rules().is_empty());
        // sum 21 would be excluded if the rule were active
        assert!(!snapshot.should_exclude(&[1, 2, 3, 4, 5, 6]).unwrap());
    }

    #[test]
    fn test_soft_deleted_signature_excludes() {
        let removed: HashSet<String> = ["1,2,3,4,5,6".to_string(), "garbage".to_string()].into();
        let snapshot = FilterSnapshot::capture(&[], &removed);

        assert_eq!(snapshot.removed_count(), 1);
        assert!(snapshot.should_exclude(&[6, 5, 4, 3, 2, 1]).unwrap());
        assert!(!snapshot.should_exclude(&[1, 2, 3, 4, 5, 7]).unwrap());
    }

    #[test]
    fn test_invalid_input_is_an_error() {
        let snapshot = FilterSnapshot::capture(&[], &HashSet::new());
        assert!(snapshot.should_exclude(&[1, 2, 3]).is_err());
        assert!(should_exclude(&[1, 1, 2, 3, 4, 5], &[], &HashSet::new()).is_err());
    }

    #[test]
    fn test_bound_and_unbound_paths_agree() {
        let conditions = vec![
            instance(Arc::new(SumOutsideRange), &[("MIN", "100"), ("MAX", "150")]),
            instance(Arc::new(MustInclude), &[("Numbers", "7")]),
        ];
        let removed: HashSet<String> = ["7,20,21,22,23,24".to_string()].into();
        let snapshot = FilterSnapshot::capture(&conditions, &removed);

        for values in [
            [1u8, 2, 3, 4, 5, 6],
            [7, 20, 21, 22, 23, 24],
            [7, 20, 21, 22, 23, 25],
            [7, 30, 31, 32, 33, 34],
            [8, 20, 21, 22, 23, 24],
        ] {
            assert_eq!(
                snapshot.should_exclude(&values).unwrap(),
                should_exclude(&values, &conditions, &removed).unwrap(),
                "disagreement on {:?}",
                values
            );
        }
    }
}
