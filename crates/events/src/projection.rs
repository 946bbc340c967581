use crate::{Event, EventEnvelope};

/// A read model fed from one event stream.
///
/// Drop it and replay the stream to rebuild. Feed it through a
/// [`ProjectionRunner`](crate::ProjectionRunner), which guarantees each envelope
/// arrives once and in sequence.
pub trait Projection {
    type Ev: Event;

    /// Fold one envelope into the read model.
    fn apply(&mut self, envelope: &EventEnvelope<Self::Ev>);
}
