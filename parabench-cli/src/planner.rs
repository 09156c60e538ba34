//! Scenario Planner
//!
//! Builds the execution plan by filtering scenarios with a regex over their ids.
//!
//! Ordering: scenarios always run in the fixed suite order (cpu, io, mixed,
//! scalability), whatever order the filter names them in.

use crate::suite::ScenarioKind;

/// Execution plan for the suite
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPlan {
    /// Ordered list of scenarios to run
    pub scenarios: Vec<ScenarioKind>,
}

impl ExecutionPlan {
    /// Whether the filter matched nothing
    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}

/// Build execution plan, keeping scenarios whose id matches `filter`
pub fn build_plan(filter: Option<&regex::Regex>) -> ExecutionPlan {
    let scenarios = ScenarioKind::ALL
        .into_iter()
        .filter(|kind| filter.is_none_or(|re| re.is_match(kind.id())))
        .collect();

    ExecutionPlan { scenarios }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    #[test]
    fn test_no_filter() {
        let plan = build_plan(None);
        assert_eq!(plan.scenarios, ScenarioKind::ALL.to_vec());
    }

    #[test]
    fn test_match_all_pattern() {
        let re = Regex::new(".*").unwrap();
        assert_eq!(build_plan(Some(&re)).scenarios.len(), 4);
    }

    #[test]
    fn test_alternation_keeps_suite_order() {
        let re = Regex::new("^(scalability|cpu)$").unwrap();
        let plan = build_plan(Some(&re));
        assert_eq!(
            plan.scenarios,
            vec![ScenarioKind::Cpu, ScenarioKind::Scalability]
        );
    }

    #[test]
    fn test_no_match() {
        let re = Regex::new("^gpu$").unwrap();
        assert!(build_plan(Some(&re)).is_empty());
    }
}
