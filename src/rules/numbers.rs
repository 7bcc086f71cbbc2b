//! Number-list rules: `MustExclude` and `MustInclude`.
//!
//! Both read a `Numbers` list separated by commas, spaces, semicolons or tabs.
//! Values outside 1..=45 and duplicates are ignored; an empty list never excludes.

use super::{BoundRule, ParameterSpec, Rule, RuleParameters};

const SPECS: &[ParameterSpec] = &[ParameterSpec::new(
    "Numbers",
    "Numbers (comma separated)",
    "1,7",
)];

/// Excludes combinations containing any of the listed numbers.
pub struct MustExclude;

impl Rule for MustExclude {
    fn key(&self) -> &'static str {
        "MustExclude"
    }

    fn display_name(&self) -> &'static str {
        "Exclude when containing numbers"
    }

    fn description(&self) -> &'static str {
        "Excludes combinations that contain any of the listed numbers (e.g. 1,7)."
    }

    fn parameter_specs(&self) -> &'static [ParameterSpec] {
        SPECS
    }

    fn bind(&self, parameters: &RuleParameters) -> BoundRule {
        let forbidden = parameters.number_list("Numbers");
        Box::new(move |combo| forbidden.iter().any(|&n| combo.contains(n)))
    }
}

/// Excludes combinations missing any of the listed numbers.
pub struct MustInclude;

impl Rule for MustInclude {
    fn key(&self) -> &'static str {
        "MustInclude"
    }

    fn display_name(&self) -> &'static str {
        "Require all listed numbers"
    }

    fn description(&self) -> &'static str {
        "Excludes combinations that do not contain every listed number (e.g. 1,7)."
    }

    fn parameter_specs(&self) -> &'static [ParameterSpec] {
        SPECS
    }

    fn bind(&self, parameters: &RuleParameters) -> BoundRule {
        let required = parameters.number_list("Numbers");
        Box::new(move |combo| required.iter().any(|&n| !combo.contains(n)))
    }
}
