//! Tier admission rules. Each predicate is self-contained; none defers to
//! another, and only bandwidth is consulted.

use crate::resilience::types::{Combination, Operator, Tier};

/// Member counts of a candidate relative to the minimum bandwidth.
#[derive(Debug, Clone, Copy, PartialEq)]
struct BandwidthSplit {
    meeting: usize,
    failing: usize,
    total: f64,
}

impl BandwidthSplit {
    fn of(combination: &Combination, operators: &[Operator], minimum_bandwidth: f64) -> Self {
        let mut split = BandwidthSplit {
            meeting: 0,
            failing: 0,
            total: 0.0,
        };
        for operator in combination.members(operators) {
            if operator.meets(minimum_bandwidth) {
                split.meeting += 1;
            } else {
                split.failing += 1;
            }
            split.total += operator.bandwidth;
        }
        split
    }
}

/// Full redundancy: every member could carry the demand alone.
pub fn admits_high(combination: &Combination, operators: &[Operator], minimum_bandwidth: f64) -> bool {
    combination.len() >= 2
        && combination
            .members(operators)
            .all(|operator| operator.meets(minimum_bandwidth))
}

/// Partial redundancy, or a pool of weak links that survives losing one
/// specific member. Only single-member removal is considered.
pub fn admits_medium(
    combination: &Combination,
    operators: &[Operator],
    minimum_bandwidth: f64,
) -> bool {
    if combination.len() < 2 {
        return false;
    }

    let split = BandwidthSplit::of(combination, operators, minimum_bandwidth);
    if split.meeting >= 2 && split.failing >= 1 {
        return true;
    }
    if split.failing < 2 {
        return false;
    }

    combination
        .members(operators)
        .any(|removed| split.total - removed.bandwidth >= minimum_bandwidth)
}

/// A lone sufficient link, pure capacity pooling, or exactly one sufficient
/// anchor with helpers.
pub fn admits_low(combination: &Combination, operators: &[Operator], minimum_bandwidth: f64) -> bool {
    match combination.len() {
        0 => false,
        1 => combination
            .members(operators)
            .all(|operator| operator.meets(minimum_bandwidth)),
        _ => {
            let split = BandwidthSplit::of(combination, operators, minimum_bandwidth);
            let pooled = split.meeting == 0 && split.total >= minimum_bandwidth;
            let anchored = split.meeting == 1;
            pooled || anchored
        }
    }
}

pub fn admits(
    tier: Tier,
    combination: &Combination,
    operators: &[Operator],
    minimum_bandwidth: f64,
) -> bool {
    match tier {
        Tier::High => admits_high(combination, operators, minimum_bandwidth),
        Tier::Medium => admits_medium(combination, operators, minimum_bandwidth),
        Tier::Low => admits_low(combination, operators, minimum_bandwidth),
    }
}
