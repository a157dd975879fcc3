//! TallyStore - shared running totals keyed by source
//!
//! Many independent sources push increments into one [`Aggregator`]. The
//! aggregator keeps a [`CounterEntry`] per source identifier, recomputes the
//! grand total on demand, and notifies every subscriber synchronously after
//! each mutation.
//!
//! # Architecture
//!
//! ```text
//!   Tracker "red"    Tracker "blue"    ...
//!        │ add/reset       │ add/reset
//!        ▼                 ▼
//! ┌─────────────────────────────────────┐
//! │              AGGREGATOR             │
//! │   id → CounterEntry (insert order)  │
//! └─────────────────────────────────────┘
//!        │ publish(totals) after every add / reset / delete
//!        ▼
//!   subscribers (totals display, ...)
//! ```
//!
//! # Example
//!
//! ```
//! use tallystore::Aggregator;
//!
//! let agg = Aggregator::new();
//! let _sub = agg.subscribe(|totals| println!("{totals}"));
//!
//! let red = agg.add("red", 5.0).get("red");
//! assert_eq!(red.changed, 1);
//! assert_eq!(agg.totals().value, 5.0);
//! ```
//!
//! Absent identifiers are never an error: reading or resetting one
//! materializes a zeroed entry.

mod aggregator;
mod entry;

pub use aggregator::{Aggregator, Subscriber, Subscription};
pub use entry::{CounterEntry, NEVER_UPDATED};
