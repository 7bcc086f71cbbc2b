use crate::rules::{Rule, RuleParameters};
use std::fmt;
use std::sync::Arc;

/// A rule activated by the user, with its own parameter values.
///
/// Several instances may share the same registered [`Rule`]; the rule itself is
/// stateless, so edits to one instance never affect another.
#[derive(Clone)]
pub struct RuleInstance {
    pub rule: Arc<dyn Rule>,
    pub parameters: RuleParameters,
    pub enabled: bool,
}

impl RuleInstance {
    pub fn new(rule: Arc<dyn Rule>, parameters: RuleParameters) -> Self {
        Self {
            rule,
            parameters,
            enabled: true,
        }
    }

    pub fn key(&self) -> &'static str {
        self.rule.key()
    }

    pub fn name(&self) -> &'static str {
        self.rule.display_name()
    }

    /// `Name (k=v, ...)`, or just the name when there are no parameters.
    pub fn summary(&self) -> String {
        if self.parameters.is_empty() {
            return self.name().to_string();
        }
        let joined = self
            .parameters
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{} ({})", self.name(), joined)
    }
}

impl fmt::Debug for RuleInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleInstance")
            .field("rule", &self.key())
            .field("parameters", &self.parameters)
            .field("enabled", &self.enabled)
            .finish()
    }
}
