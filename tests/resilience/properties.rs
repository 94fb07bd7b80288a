use std::collections::BTreeSet;

use resc::resilience::{
    Combination, Operator, Tier, admits, admits_high, enumerate, singletons,
};

use super::{index_lists, operators, resolve};

const BANDWIDTHS: [f64; 5] = [2.0, 5.0, 8.0, 10.0, 15.0];
const MINIMUMS: [f64; 2] = [5.0, 10.0];

/// Every operator list of length 1..=4 drawn from `BANDWIDTHS`.
fn operator_grid() -> Vec<Vec<Operator>> {
    let mut grid = Vec::new();
    let mut frontier: Vec<Vec<f64>> = vec![Vec::new()];
    for _ in 0..4 {
        let mut next = Vec::new();
        for prefix in &frontier {
            for bandwidth in BANDWIDTHS {
                let mut extended = prefix.clone();
                extended.push(bandwidth);
                grid.push(operators(&extended));
                next.push(extended);
            }
        }
        frontier = next;
    }
    grid
}

fn tiers_up_to(tier: Tier) -> Vec<Tier> {
    [Tier::High, Tier::Medium, Tier::Low]
        .into_iter()
        .filter(|candidate| *candidate >= tier)
        .collect()
}

#[test]
fn looser_tiers_contain_stricter_tiers() {
    for ops in operator_grid() {
        for minimum in MINIMUMS {
            let high = resolve(&ops, minimum, Tier::High);
            let medium = resolve(&ops, minimum, Tier::Medium);
            let low = resolve(&ops, minimum, Tier::Low);
            assert!(high.is_subset(&medium), "high ⊄ medium for {ops:?} @ {minimum}");
            assert!(medium.is_subset(&low), "medium ⊄ low for {ops:?} @ {minimum}");
        }
    }
}

#[test]
fn high_results_are_multi_member_and_all_sufficient() {
    for ops in operator_grid() {
        for minimum in MINIMUMS {
            for combination in &resolve(&ops, minimum, Tier::High) {
                assert!(combination.len() >= 2);
                assert!(combination.members(&ops).all(|op| op.bandwidth >= minimum));
            }
        }
    }
}

#[test]
fn results_never_repeat_a_combination() {
    for ops in operator_grid() {
        for minimum in MINIMUMS {
            for tier in [Tier::High, Tier::Medium, Tier::Low] {
                let lists = index_lists(&resolve(&ops, minimum, tier));
                let unique: BTreeSet<Vec<usize>> = lists.iter().cloned().collect();
                assert_eq!(unique.len(), lists.len(), "duplicates for {ops:?} @ {minimum}");
                assert!(lists.iter().all(|indices| indices.windows(2).all(|w| w[0] < w[1])));
            }
        }
    }
}

#[test]
fn repeated_resolution_is_identical() {
    for ops in operator_grid() {
        for minimum in MINIMUMS {
            for tier in [Tier::High, Tier::Medium, Tier::Low] {
                assert_eq!(
                    index_lists(&resolve(&ops, minimum, tier)),
                    index_lists(&resolve(&ops, minimum, tier))
                );
            }
        }
    }
}

#[test]
fn result_is_exactly_the_union_of_admitting_predicates() {
    for ops in operator_grid() {
        for minimum in MINIMUMS {
            for tier in [Tier::High, Tier::Medium, Tier::Low] {
                let candidates: Vec<Combination> =
                    singletons(ops.len()).chain(enumerate(ops.len())).collect();
                let expected: BTreeSet<Vec<usize>> = candidates
                    .iter()
                    .filter(|combination| {
                        tiers_up_to(tier)
                            .into_iter()
                            .any(|admitting| admits(admitting, combination, &ops, minimum))
                    })
                    .map(|combination| combination.indices().to_vec())
                    .collect();

                let actual: BTreeSet<Vec<usize>> =
                    index_lists(&resolve(&ops, minimum, tier)).into_iter().collect();
                assert_eq!(actual, expected, "{tier:?} for {ops:?} @ {minimum}");
            }
        }
    }
}

#[test]
fn enumeration_is_stable_across_calls() {
    let first: Vec<Combination> = enumerate(6).collect();
    let second: Vec<Combination> = enumerate(6).collect();
    assert_eq!(first, second);
    assert_eq!(first.len(), 64 - 6 - 1);
}

#[test]
fn high_predicate_matches_pairwise_definition() {
    let ops = operators(&[10.0, 12.0, 9.0]);
    let admitted: Vec<Vec<usize>> = enumerate(ops.len())
        .filter(|combination| admits_high(combination, &ops, 10.0))
        .map(|combination| combination.indices().to_vec())
        .collect();
    assert_eq!(admitted, vec![vec![0, 1]]);
}
