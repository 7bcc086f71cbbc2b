use super::{BoundRule, ParameterSpec, Rule, RuleParameters};

const DEFAULT_MIN: i32 = 90;
const DEFAULT_MAX: i32 = 210;

/// Excludes combinations whose sum falls outside `[MIN, MAX]`.
///
/// Missing, blank or unparsable bounds keep their defaults (90 and 210).
pub struct SumOutsideRange;

const SPECS: &[ParameterSpec] = &[
    ParameterSpec::new("MIN", "Minimum", "90"),
    ParameterSpec::new("MAX", "Maximum", "210"),
];

impl Rule for SumOutsideRange {
    fn key(&self) -> &'static str {
        "SumOutsideRange"
    }

    fn display_name(&self) -> &'static str {
        "Sum outside range (MIN, MAX)"
    }

    fn description(&self) -> &'static str {
        "Excludes combinations whose sum falls outside [MIN, MAX] (default: MIN=90, MAX=210)."
    }

    fn parameter_specs(&self) -> &'static [ParameterSpec] {
        SPECS
    }

    fn bind(&self, parameters: &RuleParameters) -> BoundRule {
        let min = parameters.int("MIN").unwrap_or(DEFAULT_MIN) as i64;
        let max = parameters.int("MAX").unwrap_or(DEFAULT_MAX) as i64;

        Box::new(move |combo| {
            let sum = combo.sum() as i64;
            sum < min || sum > max
        })
    }
}
