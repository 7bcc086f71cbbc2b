use super::{BoundRule, ParameterSpec, Rule, RuleParameters};

/// Limits runs of consecutive numbers.
///
/// Excludes a combination when the number of adjacent `+1` pairs exceeds
/// `MaxPairs`, or when the longest consecutive run reaches `MinRunLength`.
/// `MaxPairs = -1` disables the pair check; `MinRunLength < 2` disables the run check.
pub struct ConsecutiveNumberConstraint;

const SPECS: &[ParameterSpec] = &[
    ParameterSpec::new("MaxPairs", "Allowed consecutive pairs", "1"),
    ParameterSpec::new("MinRunLength", "Run length limit", "3"),
];

impl Rule for ConsecutiveNumberConstraint {
    fn key(&self) -> &'static str {
        "ConsecutiveNumberConstraint"
    }

    fn display_name(&self) -> &'static str {
        "Consecutive number constraint"
    }

    fn description(&self) -> &'static str {
        "Excludes combinations whose consecutive pairs or run length exceed the limits."
    }

    fn parameter_specs(&self) -> &'static [ParameterSpec] {
        SPECS
    }

    fn bind(&self, parameters: &RuleParameters) -> BoundRule {
        let max_pairs = parameters.clamped_int("MaxPairs", 1, -1, 5);
        let min_run_length = parameters.clamped_int("MinRunLength", 3, 0, 6);

        Box::new(move |combo| {
            let mut pairs = 0;
            let mut current_run = 1;
            let mut longest_run = 1;

            for w in combo.numbers().windows(2) {
                if w[1] == w[0] + 1 {
                    pairs += 1;
                    current_run += 1;
                    longest_run = longest_run.max(current_run);
                } else {
                    current_run = 1;
                }
            }

            (max_pairs >= 0 && pairs > max_pairs)
                || (min_run_length >= 2 && longest_run >= min_run_length)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &str, run: &str) -> RuleParameters {
        [("MaxPairs", pairs), ("MinRunLength", run)].into_iter().collect()
    }

    #[test]
    fn test_default_run_of_three_excluded() {
        let rule = ConsecutiveNumberConstraint;
        assert!(rule.evaluate(&[1, 2, 3, 10, 20, 30], &RuleParameters::new()).unwrap());
        assert!(!rule.evaluate(&[1, 5, 10, 15, 20, 25], &RuleParameters::new()).unwrap());
    }

    #[test]
    fn test_single_pair_allowed_by_default() {
        let rule = ConsecutiveNumberConstraint;
        assert!(!rule.evaluate(&[1, 2, 10, 20, 30, 40], &RuleParameters::new()).unwrap());
        // two separate pairs exceed MaxPairs = 1
        assert!(rule.evaluate(&[1, 2, 10, 11, 30, 40], &RuleParameters::new()).unwrap());
    }

    #[test]
    fn test_disabled_checks() {
        let rule = ConsecutiveNumberConstraint;
        let all_off = params("-1", "0");
        assert!(!rule.evaluate(&[1, 2, 3, 4, 5, 6], &all_off).unwrap());

        // clamped below -1 still means disabled
        let clamped = params("-10", "1");
        assert!(!rule.evaluate(&[1, 2, 3, 4, 5, 6], &clamped).unwrap());
    }

    #[test]
    fn test_run_length_only() {
        let rule = ConsecutiveNumberConstraint;
        let p = params("-1", "4");
        assert!(!rule.evaluate(&[1, 2, 3, 10, 11, 12], &p).unwrap());
        assert!(rule.evaluate(&[1, 2, 3, 4, 11, 20], &p).unwrap());
    }

    #[test]
    fn test_garbage_parameters_use_defaults() {
        let rule = ConsecutiveNumberConstraint;
        let p = params("lots", "");
        assert!(rule.evaluate(&[1, 2, 3, 10, 20, 30], &p).unwrap());
        assert!(!rule.evaluate(&[1, 2, 10, 20, 30, 40], &p).unwrap());
    }
}
