use splitledger_core::Aggregate;

/// Decide, then commit: run `handle` and apply whatever events it returns.
///
/// On error the aggregate is untouched.
pub fn execute<A: Aggregate>(
    aggregate: &mut A,
    command: &A::Command,
) -> Result<Vec<A::Event>, A::Error> {
    let events = aggregate.handle(command)?;
    aggregate.replay(&events);
    Ok(events)
}
