use super::{BoundRule, Rule, RuleParameters};
use crate::services::history::DrawHistory;
use std::sync::Arc;

/// Excludes combinations that already won a first prize.
///
/// The lookup is delegated to the injected [`DrawHistory`], which is loaded
/// before any scan and only read afterwards. An empty history never excludes.
pub struct HistoricalFirstPrizeExclude {
    history: Arc<dyn DrawHistory>,
}

impl HistoricalFirstPrizeExclude {
    pub fn new(history: Arc<dyn DrawHistory>) -> Self {
        Self { history }
    }
}

impl Rule for HistoricalFirstPrizeExclude {
    fn key(&self) -> &'static str {
        "HistoricalFirstPrizeExclude"
    }

    fn display_name(&self) -> &'static str {
        "Exclude past first-prize draws"
    }

    fn description(&self) -> &'static str {
        "Excludes combinations identical to a historical first-prize draw."
    }

    fn bind(&self, _parameters: &RuleParameters) -> BoundRule {
        let history = Arc::clone(&self.history);
        Box::new(move |combo| history.contains_combination(combo))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::history::WinningHistory;

    #[test]
    fn test_matches_recorded_draw() {
        let mut history = WinningHistory::empty();
        history.append(1, [10, 23, 29, 33, 37, 40]).unwrap();
        let rule = HistoricalFirstPrizeExclude::new(Arc::new(history));

        let params = RuleParameters::new();
        assert!(rule.evaluate(&[40, 37, 33, 29, 23, 10], &params).unwrap());
        assert!(!rule.evaluate(&[10, 23, 29, 33, 37, 41], &params).unwrap());
    }

    #[test]
    fn test_empty_history_never_excludes() {
        let rule = HistoricalFirstPrizeExclude::new(Arc::new(WinningHistory::empty()));
        assert!(!rule.evaluate(&[1, 2, 3, 4, 5, 6], &RuleParameters::new()).unwrap());
    }
}
