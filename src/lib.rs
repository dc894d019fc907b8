//! Rejection-free kinetic Monte Carlo event selection (the n-fold way).
//!
//! At each step a [`RejectionFreeSelector`](core::RejectionFreeSelector)
//! picks one event from a fixed population with probability proportional
//! to that event's instantaneous rate and draws an exponentially
//! distributed time increment from the total rate. Every step is
//! accepted; there are no rejected trial moves. A cumulative-rate binary
//! tree keeps both the weighted draw and a single-event rate update at
//! O(log N), and an impact oracle limits each step's rate refresh to the
//! events the previous selection actually touched.
//!
//! ```
//! use std::collections::HashMap;
//! use std::rc::Rc;
//!
//! use nfold::core::RejectionFreeSelector;
//! use nfold::core::{RandomSource, SharedRandomSource};
//!
//! // Hop rates for three sites; firing A invalidates B's rate.
//! let calculator = Rc::new(|site: &char| match site {
//!     'B' => 2.0,
//!     _ => 1.0,
//! });
//! let impacts = HashMap::from([('A', vec!['B'])]);
//! let random: SharedRandomSource = RandomSource::seeded(42).into_shared();
//!
//! let mut selector = RejectionFreeSelector::with_impact_table(
//!     calculator,
//!     &['A', 'B', 'C'],
//!     impacts,
//!     Some(random),
//! )
//! .unwrap();
//!
//! let mut time = 0.0;
//! for _ in 0..10 {
//!     let (site, dt) = selector.select_event().unwrap();
//!     assert!("ABC".contains(site));
//!     time += dt;
//! }
//! assert!(time > 0.0);
//! ```

pub mod core;

pub use crate::core::{
    EventRateTree, ImpactOracle, ImpactTable, RandomSource, RateCalculator,
    RejectionFreeSelector, SelectorError, SharedRandomSource,
};
