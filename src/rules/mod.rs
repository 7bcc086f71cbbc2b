//! Exclusion rules for 6-of-45 combinations.
//!
//! Every rule implements [`Rule`]: a stateless predicate over a combination and a
//! set of textual parameters. Rules never fail on bad parameter input; each parses
//! and clamps its own parameters, falling back to the documented default.
//!
//! # Components
//!
//! - [`Rule`]: the capability interface (metadata, `bind`, `evaluate`)
//! - [`RuleParameters`]: ordered, case-insensitive name → text mapping
//! - [`ParameterSpec`]: declared parameter with its default value
//! - [`RuleRegistry`]: explicit static list of every built-in rule
//!
//! # Binding
//!
//! A scan evaluates millions of candidates against the same parameters, so rules
//! parse their parameters once in [`Rule::bind`] and hand back a [`BoundRule`].
//! [`Rule::evaluate`] is bind-then-test, which keeps the two paths identical.

pub mod consecutive;
pub mod decade_cluster;
pub mod historical;
pub mod low_high;
pub mod numbers;
pub mod odd_even;
pub mod ones_digit;
pub mod registry;
pub mod sum_range;

pub use consecutive::ConsecutiveNumberConstraint;
pub use decade_cluster::DecadeClusterLimit;
pub use historical::HistoricalFirstPrizeExclude;
pub use low_high::LowHighImbalanceAtLeast;
pub use numbers::{MustExclude, MustInclude};
pub use odd_even::OddEvenRange;
pub use ones_digit::OnesDigitPattern;
pub use registry::RuleRegistry;
pub use sum_range::SumOutsideRange;

use crate::models::{Combination, MAX_NUMBER, MIN_NUMBER};
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::LazyLock;
use thiserror::Error;

/// Errors raised by rule evaluation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("Invalid combination: {0}")]
    InvalidCombination(String),
}

impl RuleError {
    pub(crate) fn out_of_range(value: u8) -> Self {
        Self::InvalidCombination(format!(
            "value {} is outside {}..={}",
            value, MIN_NUMBER, MAX_NUMBER
        ))
    }
}

/// A declared rule parameter. All values are textual, as entered by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub default_value: &'static str,
}

impl ParameterSpec {
    pub const fn new(name: &'static str, label: &'static str, default_value: &'static str) -> Self {
        Self {
            name,
            label,
            default_value,
        }
    }
}

/// Metadata returned by [`Rule::describe`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDescriptor {
    pub key: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    pub parameters: Vec<ParameterSpec>,
}

/// Parameter values for one rule instance.
///
/// Keeps insertion order for display; lookups ignore ASCII case so `min` and
/// `MIN` address the same parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RuleParameters(IndexMap<String, String>);

/// Config files may write `MIN: 100` unquoted; every scalar is kept as text.
#[derive(Deserialize)]
#[serde(untagged)]
enum ScalarText {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl<'de> Deserialize<'de> for RuleParameters {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = IndexMap::<String, ScalarText>::deserialize(deserializer)?;
        Ok(raw
            .into_iter()
            .map(|(name, value)| {
                let text = match value {
                    ScalarText::Text(s) => s,
                    ScalarText::Int(n) => n.to_string(),
                    ScalarText::Float(f) => f.to_string(),
                    ScalarText::Bool(b) => b.to_string(),
                };
                (name, text)
            })
            .collect())
    }
}

impl RuleParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parameters pre-filled with every declared default.
    pub fn from_specs(specs: &[ParameterSpec]) -> Self {
        let mut params = Self::new();
        for spec in specs {
            params.set(spec.name, spec.default_value);
        }
        params
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Set a value, replacing an existing entry regardless of its key's case.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(key, _)| key.eq_ignore_ascii_case(&name)) {
            Some((_, existing)) => *existing = value,
            None => {
                self.0.insert(name, value);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parsed integer value, or `None` when missing, blank or unparsable.
    pub fn int(&self, name: &str) -> Option<i32> {
        self.get(name)
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .and_then(|raw| raw.parse().ok())
    }

    /// Integer value with fallback, clamped to `min..=max`.
    pub fn clamped_int(&self, name: &str, fallback: i32, min: i32, max: i32) -> i32 {
        self.int(name).unwrap_or(fallback).max(min).min(max)
    }

    /// Distinct numbers in 1..=45 from a comma/space/semicolon/tab separated list,
    /// in first-seen order. Anything else is ignored.
    pub fn number_list(&self, name: &str) -> Vec<u8> {
        static SEPARATORS: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"[,; \t]+").expect("Invalid separator regex"));

        let mut result = Vec::new();
        let Some(text) = self.get(name) else {
            return result;
        };

        for part in SEPARATORS.split(text.trim()) {
            if let Ok(n) = part.parse::<i32>() {
                if (MIN_NUMBER as i32..=MAX_NUMBER as i32).contains(&n) && !result.contains(&(n as u8)) {
                    result.push(n as u8);
                }
            }
        }
        result
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RuleParameters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (name, value) in iter {
            params.set(name, value);
        }
        params
    }
}

/// A rule with its parameters already parsed: `true` means "exclude".
pub type BoundRule = Box<dyn Fn(&Combination) -> bool + Send + Sync>;

/// Capability implemented by every exclusion rule.
///
/// Implementations hold no mutable state, so one registered rule can back any
/// number of rule instances and be evaluated from a worker thread while the
/// condition list is edited elsewhere.
pub trait Rule: Send + Sync {
    /// Stable identifier used in configuration files
    fn key(&self) -> &'static str;

    fn display_name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn parameter_specs(&self) -> &'static [ParameterSpec] {
        &[]
    }

    /// Parse and clamp `parameters` once, returning the predicate to run per candidate.
    fn bind(&self, parameters: &RuleParameters) -> BoundRule;

    fn describe(&self) -> RuleDescriptor {
        RuleDescriptor {
            key: self.key(),
            display_name: self.display_name(),
            description: self.description(),
            parameters: self.parameter_specs().to_vec(),
        }
    }

    /// Evaluate a raw combination. Fails when the input is not six distinct
    /// numbers in 1..=45; the check is the same for every rule.
    fn evaluate(&self, combo: &[u8], parameters: &RuleParameters) -> Result<bool, RuleError> {
        let combo = Combination::from_slice(combo)?;
        Ok(self.bind(parameters)(&combo))
    }
}
