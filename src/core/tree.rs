//! Cumulative-rate tree over a fixed set of events.
//!
//! [`EventRateTree`] is the indexed aggregate behind rejection-free
//! selection: a complete binary tree whose leaves hold per-event rates
//! and whose internal nodes hold subtree sums. It supports an O(1) total,
//! O(log N) point updates, and an O(log N) inverse-CDF query that maps a
//! value in `[0, total)` to the event whose cumulative interval contains
//! it.
//!
//! The tree's topology is fixed at construction: events are never
//! inserted or removed, only their rates change. Leaves are stored in a
//! flat array of `2·M − 1` nodes, where `M` is the smallest power of two
//! at or above the event count; surplus leaves are pinned to rate 0 and
//! carry no event.
//!
//! # Numerical regime
//!
//! `update_rate` recomputes every ancestor as the sum of its two children
//! while walking to the root, rather than adding a delta to each ancestor.
//! Repeated updates therefore cannot accumulate drift: each internal node
//! always equals the exact floating-point sum of its children.

use std::collections::HashMap;
use std::hash::Hash;

use crate::core::error::SelectorError;
use crate::core::validate_rate;

/// A fixed-topology cumulative-rate binary tree keyed by event ID.
#[derive(Debug, Clone)]
pub struct EventRateTree<E> {
    /// Event occupying each leaf slot, in construction order.
    order: Vec<E>,
    /// Leaf slot for each event; a bijection with `0..order.len()`.
    position: HashMap<E, usize>,
    /// Subtree rates: node 0 is the root, children of `v` are `2v+1` and
    /// `2v+2`, leaves start at `leaf_base`.
    nodes: Vec<f64>,
    /// Index of the first leaf slot in `nodes`.
    leaf_base: usize,
}

impl<E: Copy + Eq + Hash> EventRateTree<E> {
    /// Build a tree from parallel event-ID and rate sequences.
    ///
    /// Leaf slot `i` is assigned `ids[i]` with rate `rates[i]`.
    ///
    /// # Errors
    ///
    /// - [`SelectorError::EmptyEventSet`] if `ids` is empty.
    /// - [`SelectorError::InvalidRate`] if any rate is negative, NaN, or
    ///   infinite.
    /// - [`SelectorError::DuplicateEvent`] if `ids` contains a repeated ID.
    ///
    /// # Panics
    ///
    /// Panics if `ids` and `rates` have different lengths; the selector
    /// always builds the rate vector from the ID list, so a mismatch is
    /// an internal bug rather than a caller input.
    pub fn new(ids: Vec<E>, rates: Vec<f64>) -> Result<Self, SelectorError> {
        assert_eq!(ids.len(), rates.len(), "one rate per event ID required");
        if ids.is_empty() {
            return Err(SelectorError::EmptyEventSet);
        }
        for &rate in &rates {
            validate_rate(rate)?;
        }

        let n = ids.len();
        let leaf_count = n.next_power_of_two();
        let leaf_base = leaf_count - 1;

        let mut position = HashMap::with_capacity(n);
        for (slot, &id) in ids.iter().enumerate() {
            if position.insert(id, slot).is_some() {
                return Err(SelectorError::DuplicateEvent { position: slot });
            }
        }

        // Surplus leaves stay pinned at rate 0 for the tree's lifetime.
        let mut nodes = vec![0.0; 2 * leaf_count - 1];
        nodes[leaf_base..leaf_base + n].copy_from_slice(&rates);
        for v in (0..leaf_base).rev() {
            nodes[v] = nodes[2 * v + 1] + nodes[2 * v + 2];
        }

        Ok(Self {
            order: ids,
            position,
            nodes,
            leaf_base,
        })
    }

    /// The number of events in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the tree holds no events. Always false after construction,
    /// which rejects empty event sets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// The events in leaf order.
    #[must_use]
    pub fn events(&self) -> &[E] {
        &self.order
    }

    /// Whether `event` is part of the tree's fixed event set.
    #[must_use]
    pub fn contains(&self, event: &E) -> bool {
        self.position.contains_key(event)
    }

    /// The sum of all current leaf rates.
    #[must_use]
    pub fn total_rate(&self) -> f64 {
        self.nodes[0]
    }

    /// The current rate of `event`.
    ///
    /// # Errors
    ///
    /// [`SelectorError::UnknownEvent`] if `event` is not in the tree.
    pub fn get_rate(&self, event: &E) -> Result<f64, SelectorError> {
        let slot = self.slot(event)?;
        Ok(self.nodes[self.leaf_base + slot])
    }

    /// Set the rate of `event` and restore every ancestor sum.
    ///
    /// Ancestors are recomputed from their children (see the module-level
    /// numerical regime note). On error the tree is unchanged.
    ///
    /// # Errors
    ///
    /// - [`SelectorError::UnknownEvent`] if `event` is not in the tree.
    /// - [`SelectorError::InvalidRate`] if `rate` is negative, NaN, or
    ///   infinite.
    pub fn update_rate(&mut self, event: &E, rate: f64) -> Result<(), SelectorError> {
        validate_rate(rate)?;
        let slot = self.slot(event)?;

        let mut v = self.leaf_base + slot;
        self.nodes[v] = rate;
        while v > 0 {
            v = (v - 1) / 2;
            self.nodes[v] = self.nodes[2 * v + 1] + self.nodes[2 * v + 2];
        }
        Ok(())
    }

    /// Inverse-CDF query: the event whose cumulative rate interval
    /// contains `query_value`.
    ///
    /// For `query_value` in `[0, total_rate())` this is the unique event
    /// `e` with `Σ rates before e <= query_value < Σ rates through e`
    /// under leaf order. The caller must ensure `total_rate() > 0`.
    ///
    /// If rounding during the descent carries the remaining value to or
    /// past the right edge of a subtree, the descent falls back to the
    /// nearest positive-rate sibling, so the result is always an event
    /// with positive rate (the rightmost one, when the value overshoots
    /// the final interval). Zero-pinned padding leaves are unreachable.
    #[must_use]
    pub fn query(&self, query_value: f64) -> E {
        debug_assert!(self.total_rate() > 0.0, "query on a zero-rate tree");
        debug_assert!(query_value >= 0.0, "query value must be non-negative");

        let mut q = query_value;
        let mut v = 0;
        while v < self.leaf_base {
            let left = 2 * v + 1;
            let right = left + 1;
            if q < self.nodes[left] {
                v = left;
            } else if self.nodes[right] > 0.0 {
                q -= self.nodes[left];
                v = right;
            } else {
                // q was rounded to or past this subtree's total; every
                // remaining candidate lies in the left child.
                v = left;
            }
        }
        self.order[v - self.leaf_base]
    }

    fn slot(&self, event: &E) -> Result<usize, SelectorError> {
        self.position
            .get(event)
            .copied()
            .ok_or(SelectorError::UnknownEvent)
    }
}

#[cfg(any(test, feature = "inspect"))]
impl<E: Copy + Eq + Hash> EventRateTree<E> {
    /// Verify the structural and numerical invariants of the tree.
    ///
    /// Checks that `position` and `order` form a bijection, that every
    /// node is non-negative, that every internal node equals the exact
    /// sum of its children (the recompute regime makes this an equality,
    /// not a tolerance), and that the root agrees with an independent
    /// left-to-right leaf sum to within `ε · N` relative error.
    #[must_use]
    pub fn check_invariants(&self) -> bool {
        let n = self.order.len();
        let bijective = self.position.len() == n
            && self
                .order
                .iter()
                .enumerate()
                .all(|(slot, id)| self.position.get(id) == Some(&slot));

        let non_negative = self.nodes.iter().all(|&r| r >= 0.0);

        let sums_exact = (0..self.leaf_base)
            .all(|v| self.nodes[v] == self.nodes[2 * v + 1] + self.nodes[2 * v + 2]);

        let leaf_sum: f64 = self.nodes[self.leaf_base..].iter().sum();
        let tolerance = f64::EPSILON * n as f64 * leaf_sum.max(1.0);
        let total_consistent = (self.total_rate() - leaf_sum).abs() <= tolerance;

        bijective && non_negative && sums_exact && total_consistent
    }
}
