use super::{BoundRule, ParameterSpec, Rule, RuleParameters};

/// Upper bound of the low half (1–22); 23–45 is the high half.
const LOW_MAX: u8 = 22;

const DEFAULT_K: i32 = 5;

/// Excludes combinations where either half holds at least `K` numbers.
pub struct LowHighImbalanceAtLeast;

const SPECS: &[ParameterSpec] = &[ParameterSpec::new("K", "Imbalance K", "5")];

impl Rule for LowHighImbalanceAtLeast {
    fn key(&self) -> &'static str {
        "LowHighImbalanceAtLeast"
    }

    fn display_name(&self) -> &'static str {
        "Low/high imbalance (K or more)"
    }

    fn description(&self) -> &'static str {
        "Excludes combinations with K or more numbers in the low range (1-22) or the high range (23-45) (default K=5)."
    }

    fn parameter_specs(&self) -> &'static [ParameterSpec] {
        SPECS
    }

    fn bind(&self, parameters: &RuleParameters) -> BoundRule {
        let k = match parameters.int("K") {
            Some(k) if k > 0 => k,
            _ => DEFAULT_K,
        };

        Box::new(move |combo| {
            let low = combo.numbers().iter().filter(|&&n| n <= LOW_MAX).count() as i32;
            let high = 6 - low;
            low >= k || high >= k
        })
    }
}
