use uuid::Uuid;

// ============================================================================
// Aggregate Root Pattern
// ============================================================================
//
// Commands are validated against current state and turned into events;
// events are the only thing that mutates state.
//
// ============================================================================

/// Generic Aggregate trait - all command-driven aggregates implement this
///
/// Type Parameters:
/// - `Event`: The domain event type for this aggregate
/// - `Command`: The command type for this aggregate
/// - `Error`: The error type for business rule violations
pub trait Aggregate: Sized + Send + Sync {
    type Event;
    type Command;
    type Error;

    /// Apply an event to update state
    fn apply_event(&mut self, event: &Self::Event) -> Result<(), Self::Error>;

    /// Handle command and emit events (business logic)
    fn handle_command(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error>;

    /// Get aggregate ID
    fn aggregate_id(&self) -> Uuid;

    /// Get current version (number of applied events)
    fn version(&self) -> i64;

    /// Handle a command and apply the resulting events in one step
    fn execute(&mut self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        let events = self.handle_command(command)?;
        for event in &events {
            self.apply_event(event)?;
        }
        Ok(events)
    }
}
