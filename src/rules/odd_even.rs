use super::{BoundRule, ParameterSpec, Rule, RuleParameters};

/// Keeps the count of odd numbers within `MinOdd..=MaxOdd`.
///
/// `MinOdd` is clamped to 0..=6 and `MaxOdd` to `MinOdd..=6`.
pub struct OddEvenRange;

const SPECS: &[ParameterSpec] = &[
    ParameterSpec::new("MinOdd", "Minimum odd count", "2"),
    ParameterSpec::new("MaxOdd", "Maximum odd count", "4"),
];

impl Rule for OddEvenRange {
    fn key(&self) -> &'static str {
        "OddEvenRange"
    }

    fn display_name(&self) -> &'static str {
        "Odd/even distribution range"
    }

    fn description(&self) -> &'static str {
        "Excludes combinations whose odd count falls outside the given range."
    }

    fn parameter_specs(&self) -> &'static [ParameterSpec] {
        SPECS
    }

    fn bind(&self, parameters: &RuleParameters) -> BoundRule {
        let min_odd = parameters.clamped_int("MinOdd", 2, 0, 6);
        let max_odd = parameters.clamped_int("MaxOdd", 4, min_odd, 6);

        Box::new(move |combo| {
            let odd = combo.numbers().iter().filter(|&&n| n & 1 == 1).count() as i32;
            odd < min_odd || odd > max_odd
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_range() {
        let rule = OddEvenRange;
        let params = RuleParameters::new();
        assert!(rule.evaluate(&[1, 3, 5, 7, 9, 11], &params).unwrap());
        assert!(rule.evaluate(&[1, 2, 4, 6, 8, 10], &params).unwrap());
        assert!(!rule.evaluate(&[1, 3, 4, 6, 8, 10], &params).unwrap());
        assert!(!rule.evaluate(&[1, 3, 5, 7, 8, 10], &params).unwrap());
    }

    #[test]
    fn test_max_clamped_to_min() {
        let rule = OddEvenRange;
        let params: RuleParameters = [("MinOdd", "3"), ("MaxOdd", "1")].into_iter().collect();
        // MaxOdd becomes 3, so exactly three odd numbers pass
        assert!(!rule.evaluate(&[1, 3, 5, 6, 8, 10], &params).unwrap());
        assert!(rule.evaluate(&[1, 3, 5, 7, 8, 10], &params).unwrap());
    }

    #[test]
    fn test_out_of_range_values_clamped() {
        let rule = OddEvenRange;
        let params: RuleParameters = [("MinOdd", "-4"), ("MaxOdd", "40")].into_iter().collect();
        assert!(!rule.evaluate(&[1, 3, 5, 7, 9, 11], &params).unwrap());
        assert!(!rule.evaluate(&[2, 4, 6, 8, 10, 12], &params).unwrap());
    }
}
