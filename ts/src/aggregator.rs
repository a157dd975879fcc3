//! Aggregator - per-source counters with publish/subscribe
//!
//! The Aggregator is the only mutator of counter state. Every `add`, `reset`
//! and `delete` recomputes the totals snapshot and hands it to each
//! subscriber, in registration order, before the call returns.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use chrono::Local;
use tracing::debug;

use crate::entry::CounterEntry;

/// Callback invoked with the totals snapshot after every mutation
pub type Subscriber = Arc<dyn Fn(&CounterEntry) + Send + Sync>;

/// Insertion-ordered id → entry map
#[derive(Default)]
struct Ledger {
    order: Vec<String>,
    entries: HashMap<String, CounterEntry>,
}

impl Ledger {
    /// Entry for `id`, created zeroed on first access
    fn entry_mut(&mut self, id: &str) -> &mut CounterEntry {
        if !self.entries.contains_key(id) {
            debug!(%id, "Ledger::entry_mut: creating entry");
            self.order.push(id.to_string());
        }
        self.entries.entry(id.to_string()).or_default()
    }

    fn remove(&mut self, id: &str) -> bool {
        if self.entries.remove(id).is_some() {
            self.order.retain(|k| k != id);
            true
        } else {
            false
        }
    }

    fn totals(&self) -> CounterEntry {
        // Insertion order keeps the float sum identical to summing `entries()`
        let mut totals = self
            .order
            .iter()
            .filter_map(|id| self.entries.get(id))
            .fold(CounterEntry::zeroed(), |mut acc, entry| {
                acc.changed += entry.changed;
                acc.value += entry.value;
                acc
            });
        totals.updated = Some(Local::now());
        totals
    }
}

struct Shared {
    ledger: Mutex<Ledger>,
    subscribers: Mutex<Vec<(u64, Subscriber)>>,
    next_subscriber: AtomicU64,
}

// State is plain data and every mutation completes before unlock, so a
// poisoned lock still guards a consistent value.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Shared running totals keyed by source identifier
///
/// Cheap to clone; clones share the same counters and subscribers.
#[derive(Clone)]
pub struct Aggregator {
    shared: Arc<Shared>,
}

impl Aggregator {
    /// Create an empty aggregator with no subscribers
    pub fn new() -> Self {
        debug!("Aggregator::new: called");
        Self {
            shared: Arc::new(Shared {
                ledger: Mutex::new(Ledger::default()),
                subscribers: Mutex::new(Vec::new()),
                next_subscriber: AtomicU64::new(0),
            }),
        }
    }

    /// Copy of the entry for `id`, creating a zeroed one if absent
    ///
    /// Never publishes.
    pub fn get(&self, id: &str) -> CounterEntry {
        debug!(%id, "Aggregator::get: called");
        *lock(&self.shared.ledger).entry_mut(id)
    }

    /// Count one change of `amount` against `id`, then publish
    pub fn add(&self, id: &str, amount: f64) -> &Self {
        debug!(%id, amount, "Aggregator::add: called");
        {
            let mut ledger = lock(&self.shared.ledger);
            let entry = ledger.entry_mut(id);
            entry.changed += 1;
            entry.value += amount;
            entry.updated = Some(Local::now());
        }
        self.publish()
    }

    /// Zero the counters for `id`, creating the entry if absent, then publish
    pub fn reset(&self, id: &str) -> &Self {
        debug!(%id, "Aggregator::reset: called");
        {
            let mut ledger = lock(&self.shared.ledger);
            let entry = ledger.entry_mut(id);
            entry.changed = 0;
            entry.value = 0.0;
            entry.updated = Some(Local::now());
        }
        self.publish()
    }

    /// Remove the entry for `id` if present, then publish
    pub fn delete(&self, id: &str) -> &Self {
        let removed = lock(&self.shared.ledger).remove(id);
        debug!(%id, removed, "Aggregator::delete: called");
        self.publish()
    }

    /// Sum of `changed` and `value` over all current entries, stamped now
    pub fn totals(&self) -> CounterEntry {
        lock(&self.shared.ledger).totals()
    }

    /// Number of entries currently held
    pub fn len(&self) -> usize {
        lock(&self.shared.ledger).order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `id` has an entry, without creating one
    pub fn contains(&self, id: &str) -> bool {
        lock(&self.shared.ledger).entries.contains_key(id)
    }

    /// Identifiers in insertion order
    pub fn ids(&self) -> Vec<String> {
        lock(&self.shared.ledger).order.clone()
    }

    /// Copies of all entries in insertion order
    pub fn entries(&self) -> Vec<(String, CounterEntry)> {
        let ledger = lock(&self.shared.ledger);
        ledger
            .order
            .iter()
            .filter_map(|id| ledger.entries.get(id).map(|entry| (id.clone(), *entry)))
            .collect()
    }

    /// Register `callback` for every future publish
    ///
    /// The callback stays registered until the returned [`Subscription`] is
    /// dropped or explicitly unsubscribed.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&CounterEntry) + Send + Sync + 'static,
    {
        let id = self.shared.next_subscriber.fetch_add(1, Ordering::Relaxed);
        lock(&self.shared.subscribers).push((id, Arc::new(callback)));
        debug!(subscription_id = id, "Aggregator::subscribe: new subscriber");
        Subscription {
            id,
            shared: Arc::downgrade(&self.shared),
        }
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        lock(&self.shared.subscribers).len()
    }

    fn publish(&self) -> &Self {
        let totals = self.totals();
        // Snapshot the list so callbacks run without any lock held and may
        // read back into the aggregator.
        let subscribers: Vec<Subscriber> = lock(&self.shared.subscribers)
            .iter()
            .map(|(_, sub)| Arc::clone(sub))
            .collect();
        debug!(
            changed = totals.changed,
            value = totals.value,
            subscribers = subscribers.len(),
            "Aggregator::publish"
        );
        for sub in &subscribers {
            sub(&totals);
        }
        self
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Aggregator")
            .field("entries", &self.len())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Registration token returned by [`Aggregator::subscribe`]
///
/// Dropping it deregisters the callback.
#[must_use = "dropping a Subscription deregisters its callback"]
pub struct Subscription {
    id: u64,
    shared: Weak<Shared>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Deregister now
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.upgrade() {
            lock(&shared.subscribers).retain(|(id, _)| *id != self.id);
            debug!(subscription_id = self.id, "Subscription::drop: deregistered");
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
