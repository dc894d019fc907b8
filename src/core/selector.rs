//! Rejection-free event selection.
//!
//! [`RejectionFreeSelector`] drives one KMC step at a time: refresh the
//! rates invalidated by the previously selected event, read the total
//! rate, draw an exponential time step, and pick the next event by an
//! inverse-CDF query on the [`EventRateTree`]. Every step is accepted;
//! there are no rejected trial moves.
//!
//! The selector only selects events, it does not process them. The rates
//! impacted by a selection can therefore not be recomputed until the
//! following call, which makes [`RejectionFreeSelector::total_rate`] and
//! [`RejectionFreeSelector::get_rate`] intentionally stale between steps
//! (they reflect the state as of the last completed step).

use std::collections::HashMap;
use std::hash::Hash;
use std::rc::Rc;

use log::{debug, trace};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::core::error::SelectorError;
use crate::core::random::{RandomSource, SharedRandomSource};
use crate::core::tree::EventRateTree;
use crate::core::validate_rate;

/// Computes the instantaneous rate of an event.
///
/// Implementations may consult external mutable state that the caller
/// updates between steps; within one step the selector assumes the rates
/// it reads are consistent. Returned rates must be finite and
/// non-negative or the selector fails with
/// [`SelectorError::InvalidRate`].
pub trait RateCalculator<E> {
    /// The current rate of `event`.
    fn rate(&self, event: &E) -> f64;
}

impl<E, F> RateCalculator<E> for F
where
    F: Fn(&E) -> f64,
{
    fn rate(&self, event: &E) -> f64 {
        self(event)
    }
}

/// Maps an accepted event to the events whose rates it may have changed.
///
/// The returned list may be empty, may contain the accepted event itself
/// (self-impact), and may contain duplicates (applied as given; leaf
/// updates commute).
pub trait ImpactOracle<E> {
    /// The events impacted by accepting `event`.
    fn impacted(&self, event: &E) -> Vec<E>;
}

impl<E, F> ImpactOracle<E> for F
where
    F: Fn(&E) -> Vec<E>,
{
    fn impacted(&self, event: &E) -> Vec<E> {
        self(event)
    }
}

/// A table-backed [`ImpactOracle`].
///
/// Built by the selector from a user-supplied map, completed so that
/// every event in the selector's event set has an entry; hot-path
/// lookups are total by that invariant.
#[derive(Debug, Clone, Default)]
pub struct ImpactTable<E> {
    table: HashMap<E, Vec<E>>,
}

impl<E: Copy + Eq + Hash> ImpactTable<E> {
    /// Wrap a map as-is.
    #[must_use]
    pub fn new(table: HashMap<E, Vec<E>>) -> Self {
        Self { table }
    }

    /// Complete `table` against `ids`: every ID without an entry gets an
    /// empty impact list. The user's map is consumed; the completed
    /// table is owned by the caller (normally the selector).
    #[must_use]
    pub fn completed(mut table: HashMap<E, Vec<E>>, ids: &[E]) -> Self {
        for &id in ids {
            table.entry(id).or_default();
        }
        Self { table }
    }

    /// The impact list for `event`; empty for IDs without an entry.
    #[must_use]
    pub fn get(&self, event: &E) -> &[E] {
        self.table.get(event).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl<E: Copy + Eq + Hash> ImpactOracle<E> for ImpactTable<E> {
    fn impacted(&self, event: &E) -> Vec<E> {
        self.get(event).to_vec()
    }
}

/// An event selector implementing the rejection-free KMC algorithm
/// (n-fold way).
///
/// Generic over the event ID type `E`, the rate calculator `C`, the
/// impact oracle `O` (table-backed by default), and the random engine
/// `G` (`ChaCha8Rng` by default).
///
/// The calculator is shared through `Rc` and the random source through a
/// [`SharedRandomSource`] handle, so both can be shared with other
/// selectors or kept accessible by the caller. All stepping is
/// single-threaded and non-reentrant.
pub struct RejectionFreeSelector<E, C, O = ImpactTable<E>, G = ChaCha8Rng> {
    /// Computes per-event rates on demand.
    calculator: Rc<C>,
    /// Cumulative-rate aggregate over the fixed event set.
    tree: EventRateTree<E>,
    /// Maps an accepted event to the events whose rates it invalidates.
    oracle: O,
    /// Source for the time-step and event draws.
    random: SharedRandomSource<G>,
    /// Events invalidated by the previous selection, not yet recomputed.
    /// Kept in the oracle's stated order.
    pending: Vec<E>,
}

impl<E, C, O, G> std::fmt::Debug for RejectionFreeSelector<E, C, O, G>
where
    E: std::fmt::Debug,
    O: std::fmt::Debug,
    G: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RejectionFreeSelector")
            .field("tree", &self.tree)
            .field("oracle", &self.oracle)
            .field("random", &self.random)
            .field("pending", &self.pending)
            .finish()
    }
}

impl<E, C, G> RejectionFreeSelector<E, C, ImpactTable<E>, G>
where
    E: Copy + Eq + Hash,
    C: RateCalculator<E>,
    G: RngCore + SeedableRng,
{
    /// Construct a selector from an impact map.
    ///
    /// The map is completed with empty entries for every event ID it is
    /// missing. A fresh entropy-seeded random source is created when
    /// `random` is `None`.
    ///
    /// # Errors
    ///
    /// - [`SelectorError::EmptyEventSet`] if `event_ids` is empty (the
    ///   calculator is never invoked in that case).
    /// - [`SelectorError::InvalidRate`] if the calculator returns a
    ///   negative or non-finite initial rate.
    /// - [`SelectorError::DuplicateEvent`] if `event_ids` repeats an ID.
    pub fn with_impact_table(
        calculator: Rc<C>,
        event_ids: &[E],
        impact_table: HashMap<E, Vec<E>>,
        random: Option<SharedRandomSource<G>>,
    ) -> Result<Self, SelectorError> {
        let oracle = ImpactTable::completed(impact_table, event_ids);
        Self::with_oracle(calculator, event_ids, oracle, random)
    }
}

impl<E, C, O, G> RejectionFreeSelector<E, C, O, G>
where
    E: Copy + Eq + Hash,
    C: RateCalculator<E>,
    O: ImpactOracle<E>,
    G: RngCore + SeedableRng,
{
    /// Construct a selector from an arbitrary impact oracle.
    ///
    /// The oracle is trusted to return only IDs from `event_ids`; an
    /// unknown ID surfaces as [`SelectorError::UnknownEvent`] on the
    /// refresh that follows the offending selection.
    ///
    /// # Errors
    ///
    /// Same as [`RejectionFreeSelector::with_impact_table`].
    pub fn with_oracle(
        calculator: Rc<C>,
        event_ids: &[E],
        oracle: O,
        random: Option<SharedRandomSource<G>>,
    ) -> Result<Self, SelectorError> {
        if event_ids.is_empty() {
            return Err(SelectorError::EmptyEventSet);
        }

        // One calculator call per event, in the order given.
        let rates: Vec<f64> = event_ids.iter().map(|id| calculator.rate(id)).collect();
        let tree = EventRateTree::new(event_ids.to_vec(), rates)?;
        let random = random.unwrap_or_else(|| RandomSource::new().into_shared());

        debug!(
            "selector initialized: {} events, total rate {}",
            tree.len(),
            tree.total_rate()
        );
        Ok(Self {
            calculator,
            tree,
            oracle,
            random,
            pending: Vec::new(),
        })
    }
}

impl<E, C, O, G> RejectionFreeSelector<E, C, O, G>
where
    E: Copy + Eq + Hash,
    C: RateCalculator<E>,
    O: ImpactOracle<E>,
    G: RngCore,
{
    /// Select one event and return it with the elapsed time step.
    ///
    /// Performs the deferred rate refresh for the events impacted by the
    /// previous selection, then draws the time step from the exponential
    /// distribution with mean `1 / total_rate` and the event in
    /// proportion to its rate. The time step is drawn before the event;
    /// the draw order is part of the determinism contract.
    ///
    /// # Errors
    ///
    /// - [`SelectorError::ExhaustedRates`] if the refreshed total rate is
    ///   not positive; no randomness is consumed.
    /// - [`SelectorError::InvalidRate`] / [`SelectorError::UnknownEvent`]
    ///   if the refresh fails; the tree and the pending set are left
    ///   untouched and the next call retries the refresh.
    pub fn select_event(&mut self) -> Result<(E, f64), SelectorError> {
        // Selection does not process events, so rates impacted by the
        // previous selection could not be recomputed until now.
        self.refresh_impacted_rates()?;

        let total_rate = self.tree.total_rate();
        if total_rate <= 0.0 {
            return Err(SelectorError::ExhaustedRates);
        }

        let time_step = -self.random.borrow_mut().open_unit_interval().ln() / total_rate;
        let query_value = self.random.borrow_mut().unit_interval() * total_rate;
        let selected = self.tree.query(query_value);

        self.pending = self.oracle.impacted(&selected);
        trace!(
            "step: total rate {total_rate}, time step {time_step}, {} impacted",
            self.pending.len()
        );
        Ok((selected, time_step))
    }

    /// The total event rate as of the last completed step.
    ///
    /// Does not perform the deferred refresh: rates invalidated by the
    /// previous selection are not yet reflected here.
    #[must_use]
    pub fn total_rate(&self) -> f64 {
        self.tree.total_rate()
    }

    /// The rate of `event` as of the last completed step.
    ///
    /// Stale in the same sense as [`RejectionFreeSelector::total_rate`].
    ///
    /// # Errors
    ///
    /// [`SelectorError::UnknownEvent`] if `event` is not in the event set.
    pub fn get_rate(&self, event: &E) -> Result<f64, SelectorError> {
        self.tree.get_rate(event)
    }

    /// A handle to the selector's random source, for reseeding or
    /// sharing with another selector.
    #[must_use]
    pub fn random_source(&self) -> SharedRandomSource<G> {
        Rc::clone(&self.random)
    }

    /// Recompute the rates of all pending impacted events.
    ///
    /// All recomputed rates are validated before the first tree write, so
    /// a failure leaves the tree and the pending set untouched; the next
    /// call retries the whole refresh.
    fn refresh_impacted_rates(&mut self) -> Result<(), SelectorError> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let mut updates = Vec::with_capacity(self.pending.len());
        for event in &self.pending {
            if !self.tree.contains(event) {
                return Err(SelectorError::UnknownEvent);
            }
            let rate = self.calculator.rate(event);
            validate_rate(rate)?;
            updates.push((*event, rate));
        }
        for (event, rate) in updates {
            self.tree.update_rate(&event, rate)?;
        }

        trace!("refreshed {} impacted rates", self.pending.len());
        self.pending.clear();
        Ok(())
    }
}

#[cfg(any(test, feature = "inspect"))]
impl<E, C, O, G> RejectionFreeSelector<E, C, O, G>
where
    E: Copy + Eq + Hash,
{
    /// The events whose rates are stale pending the next step's refresh.
    #[must_use]
    pub fn pending_impacts(&self) -> &[E] {
        &self.pending
    }

    /// Verify the rate tree's structural and numerical invariants.
    #[must_use]
    pub fn check_invariants(&self) -> bool {
        self.tree.check_invariants()
    }
}
