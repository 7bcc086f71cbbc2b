use super::{BoundRule, Rule, RuleParameters};

/// Excludes skewed ones-digit patterns: one digit appearing three or more times,
/// or three different digits each appearing exactly twice.
pub struct OnesDigitPattern;

impl Rule for OnesDigitPattern {
    fn key(&self) -> &'static str {
        "OnesDigitPattern"
    }

    fn display_name(&self) -> &'static str {
        "Ones-digit distribution limit"
    }

    fn description(&self) -> &'static str {
        "Excludes combinations where one ones digit appears 3+ times, or 3+ ones digits appear exactly twice."
    }

    fn bind(&self, _parameters: &RuleParameters) -> BoundRule {
        Box::new(|combo| {
            let mut digits = [0u8; 10];
            for &value in combo.numbers() {
                let digit = usize::from(value % 10);
                digits[digit] += 1;
                if digits[digit] >= 3 {
                    return true;
                }
            }
            digits.iter().filter(|&&count| count == 2).count() >= 3
        })
    }
}
