// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// The Order aggregate and the command/event plumbing around it. Lookups,
// pricing and persistence live outside this module and are reached through
// the command handler.
//
// ============================================================================

mod aggregate;
pub mod order;

pub use aggregate::Aggregate;
