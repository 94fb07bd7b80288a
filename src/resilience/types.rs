use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

pub type OperatorIndex = usize;

/// One candidate access link. `delay` and `packet_loss` travel with the
/// operator but no admission rule reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operator {
    pub name: String,
    #[serde(rename = "BW", alias = "bandwidth")]
    pub bandwidth: f64,
    #[serde(default)]
    pub delay: f64,
    #[serde(default)]
    pub packet_loss: f64,
}

impl Operator {
    pub fn new(name: impl Into<String>, bandwidth: f64) -> Self {
        Self {
            name: name.into(),
            bandwidth,
            delay: 0.0,
            packet_loss: 0.0,
        }
    }

    pub fn with_delay(mut self, delay: f64) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_packet_loss(mut self, packet_loss: f64) -> Self {
        self.packet_loss = packet_loss;
        self
    }

    pub fn meets(&self, minimum_bandwidth: f64) -> bool {
        self.bandwidth >= minimum_bandwidth
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Low,
    Medium,
    High,
}

impl Tier {
    /// Maps a wire resiliency level onto a tier. Anything outside 1..=3 is
    /// treated as Low.
    pub fn from_level(level: i64) -> Self {
        match level {
            3 => Tier::High,
            2 => Tier::Medium,
            _ => Tier::Low,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Requirement {
    pub minimum_bandwidth: f64,
    pub tier: Tier,
}

impl Requirement {
    pub fn new(minimum_bandwidth: f64, tier: Tier) -> Self {
        Self {
            minimum_bandwidth,
            tier,
        }
    }
}

/// Strictly increasing member indices into the operator slice the
/// combination was enumerated from. Equality and ordering are structural, so
/// two operators with identical fields stay distinct members.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Combination(Vec<OperatorIndex>);

impl Combination {
    pub(crate) fn from_sorted(indices: Vec<OperatorIndex>) -> Self {
        debug_assert!(indices.windows(2).all(|pair| pair[0] < pair[1]));
        Self(indices)
    }

    pub fn indices(&self) -> &[OperatorIndex] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn members<'a>(&'a self, operators: &'a [Operator]) -> impl Iterator<Item = &'a Operator> {
        self.0.iter().map(move |&index| &operators[index])
    }

    pub fn names(&self, operators: &[Operator]) -> Vec<String> {
        self.members(operators)
            .map(|operator| operator.name.clone())
            .collect()
    }
}

/// Deduplicated combinations in first-insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CombinationSet {
    entries: Vec<Combination>,
    seen: BTreeSet<Combination>,
}

impl CombinationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when an identical combination is already present.
    pub fn insert(&mut self, combination: Combination) -> bool {
        if self.seen.contains(&combination) {
            return false;
        }
        self.seen.insert(combination.clone());
        self.entries.push(combination);
        true
    }

    pub fn union_with(&mut self, other: CombinationSet) -> usize {
        let mut added = 0usize;
        for combination in other.entries {
            if self.insert(combination) {
                added += 1;
            }
        }
        added
    }

    pub fn is_subset(&self, other: &CombinationSet) -> bool {
        self.seen.is_subset(&other.seen)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Combination> {
        self.entries.iter()
    }

    /// Resolves every combination back to owned operator records.
    pub fn materialize(&self, operators: &[Operator]) -> Vec<Vec<Operator>> {
        self.entries
            .iter()
            .map(|combination| combination.members(operators).cloned().collect())
            .collect()
    }
}

impl<'a> IntoIterator for &'a CombinationSet {
    type Item = &'a Combination;
    type IntoIter = std::slice::Iter<'a, Combination>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<Combination> for CombinationSet {
    fn from_iter<T: IntoIterator<Item = Combination>>(iter: T) -> Self {
        let mut set = CombinationSet::new();
        for combination in iter {
            set.insert(combination);
        }
        set
    }
}
