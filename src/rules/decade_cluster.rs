use super::{BoundRule, Rule, RuleParameters};

/// Excludes combinations with three or more numbers in the same tens bucket.
///
/// Buckets are `min(4, value / 10)`: 1–9, 10–19, 20–29, 30–39, 40–45.
pub struct DecadeClusterLimit;

impl Rule for DecadeClusterLimit {
    fn key(&self) -> &'static str {
        "DecadeClusterLimit"
    }

    fn display_name(&self) -> &'static str {
        "Same-decade cluster limit"
    }

    fn description(&self) -> &'static str {
        "Excludes combinations with 3 or more numbers in the same tens range."
    }

    fn bind(&self, _parameters: &RuleParameters) -> BoundRule {
        Box::new(|combo| {
            let mut buckets = [0u8; 5];
            combo.numbers().iter().any(|&value| {
                let index = usize::from(value / 10).min(4);
                buckets[index] += 1;
                buckets[index] >= 3
            })
        })
    }
}
