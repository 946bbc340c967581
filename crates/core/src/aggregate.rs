//! Command/event aggregates.
//!
//! Decisions happen in `handle`, which only reads state; `apply` is the single place
//! state changes. A rejected command therefore leaves nothing half-done.

/// Identity and version of an aggregate.
pub trait AggregateRoot {
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;

    /// Number of events applied so far.
    fn version(&self) -> u64;
}

pub trait Aggregate: AggregateRoot {
    type Command: Clone + core::fmt::Debug;
    type Event: Clone + core::fmt::Debug;
    type Error: core::fmt::Debug;

    /// Evolve state from one committed event, bumping `version()` by one.
    fn apply(&mut self, event: &Self::Event);

    /// Validate `command` against current state and return the events it produces.
    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error>;

    /// Rebuild state by applying a recorded history in order.
    fn replay<'a>(&mut self, history: impl IntoIterator<Item = &'a Self::Event>)
    where
        Self::Event: 'a,
    {
        for event in history {
            self.apply(event);
        }
    }
}
