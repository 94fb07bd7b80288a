//! Order-preserving subset enumeration.
//!
//! The walk is exhaustive: `n` operators yield `2^n - n - 1` multi-member
//! combinations and nothing is pruned. Callers bound `n` before enumerating.

use crate::resilience::types::{Combination, OperatorIndex};

/// Every subset of size `2..=operator_count`, grouped by size, each size in
/// lexicographic index order.
pub fn enumerate(operator_count: usize) -> Combinations {
    Combinations::new(operator_count, 2)
}

/// Each operator on its own, in input order.
pub fn singletons(operator_count: usize) -> impl Iterator<Item = Combination> {
    (0..operator_count).map(|index| Combination::from_sorted(vec![index]))
}

#[derive(Debug, Clone)]
pub struct Combinations {
    operator_count: usize,
    size: usize,
    cursor: Option<Vec<OperatorIndex>>,
}

impl Combinations {
    fn new(operator_count: usize, min_size: usize) -> Self {
        let size = min_size.max(1);
        Self {
            operator_count,
            size,
            cursor: first_of_size(operator_count, size),
        }
    }

    /// Moves `indices` to the next size-k subset in lexicographic order, or
    /// returns false when `indices` was the last one.
    fn advance(indices: &mut [OperatorIndex], operator_count: usize) -> bool {
        let size = indices.len();
        let Some(pivot) = (0..size)
            .rev()
            .find(|&position| indices[position] < operator_count - size + position)
        else {
            return false;
        };

        indices[pivot] += 1;
        for position in pivot + 1..size {
            indices[position] = indices[position - 1] + 1;
        }
        true
    }
}

fn first_of_size(operator_count: usize, size: usize) -> Option<Vec<OperatorIndex>> {
    (size <= operator_count).then(|| (0..size).collect())
}

impl Iterator for Combinations {
    type Item = Combination;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.cursor.take()?;

        let mut next = current.clone();
        self.cursor = if Self::advance(&mut next, self.operator_count) {
            Some(next)
        } else {
            self.size += 1;
            first_of_size(self.operator_count, self.size)
        };

        Some(Combination::from_sorted(current))
    }
}
