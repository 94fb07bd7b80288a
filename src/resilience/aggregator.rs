use serde::{Deserialize, Serialize};

use crate::resilience::{
    enumerator::{enumerate, singletons},
    error::{EngineError, invalid_bandwidth, too_many_operators},
    evaluator::{admits_high, admits_low, admits_medium},
    types::{CombinationSet, Operator, Requirement, Tier},
};

fn default_max_operators() -> usize {
    20
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatorConfig {
    /// Upper bound on operators per request. Enumeration is exponential in
    /// this number.
    #[serde(default = "default_max_operators")]
    pub max_operators: usize,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            max_operators: default_max_operators(),
        }
    }
}

/// Builds tier result sets by widening: Medium starts from the High set and
/// Low starts from the Medium set.
#[derive(Debug, Clone, Default)]
pub struct TierAggregator {
    config: AggregatorConfig,
}

impl TierAggregator {
    pub fn new(config: AggregatorConfig) -> Self {
        Self { config }
    }

    pub fn max_operators(&self) -> usize {
        self.config.max_operators
    }

    pub fn resolve(
        &self,
        operators: &[Operator],
        requirement: &Requirement,
    ) -> Result<CombinationSet, EngineError> {
        self.check_inputs(operators, requirement)?;
        let minimum = requirement.minimum_bandwidth;
        let count = operators.len();

        let mut result: CombinationSet = enumerate(count)
            .filter(|combination| admits_high(combination, operators, minimum))
            .collect();
        let high_count = result.len();

        if requirement.tier == Tier::High {
            self.trace_resolution(count, requirement, &[high_count]);
            return Ok(result);
        }

        let medium_added = result.union_with(
            enumerate(count)
                .filter(|combination| admits_medium(combination, operators, minimum))
                .collect(),
        );

        if requirement.tier == Tier::Medium {
            self.trace_resolution(count, requirement, &[high_count, medium_added]);
            return Ok(result);
        }

        let low_added = result.union_with(
            singletons(count)
                .chain(enumerate(count))
                .filter(|combination| admits_low(combination, operators, minimum))
                .collect(),
        );

        self.trace_resolution(count, requirement, &[high_count, medium_added, low_added]);
        Ok(result)
    }

    fn check_inputs(
        &self,
        operators: &[Operator],
        requirement: &Requirement,
    ) -> Result<(), EngineError> {
        if operators.len() > self.config.max_operators {
            return Err(too_many_operators(
                operators.len(),
                self.config.max_operators,
            ));
        }

        if !requirement.minimum_bandwidth.is_finite() {
            return Err(invalid_bandwidth(format!(
                "minimum bandwidth {} is not a finite number",
                requirement.minimum_bandwidth
            )));
        }

        if let Some(operator) = operators
            .iter()
            .find(|operator| !operator.bandwidth.is_finite())
        {
            return Err(invalid_bandwidth(format!(
                "operator '{}' has non-finite bandwidth {}",
                operator.name, operator.bandwidth
            )));
        }

        Ok(())
    }

    fn trace_resolution(&self, operator_count: usize, requirement: &Requirement, added: &[usize]) {
        tracing::debug!(
            target: "resilience",
            operators = operator_count,
            minimum_bandwidth = requirement.minimum_bandwidth,
            tier = ?requirement.tier,
            added_per_tier = ?added,
            total = added.iter().sum::<usize>(),
            "tiers_resolved"
        );
    }
}
