mod properties;

use resc::resilience::{CombinationSet, Operator, Requirement, Tier, TierAggregator};

pub fn operators(bandwidths: &[f64]) -> Vec<Operator> {
    bandwidths
        .iter()
        .enumerate()
        .map(|(index, bandwidth)| Operator::new(format!("op{index}"), *bandwidth))
        .collect()
}

pub fn resolve(operators: &[Operator], minimum: f64, tier: Tier) -> CombinationSet {
    TierAggregator::default()
        .resolve(operators, &Requirement::new(minimum, tier))
        .expect("resolution should succeed")
}

pub fn index_lists(set: &CombinationSet) -> Vec<Vec<usize>> {
    set.iter()
        .map(|combination| combination.indices().to_vec())
        .collect()
}
