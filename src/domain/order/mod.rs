// ============================================================================
// Order Domain - the intake form as an aggregate
// ============================================================================
//
// - Value objects (sizes, methods, header, decoration, grid lines)
// - Commands (one per form interaction)
// - Events (what each interaction changed)
// - Errors (OrderError enum)
// - Aggregate (Order with the form's business rules)
// - Command Handler (lookup enrichment, drafts, submission)
//
// ============================================================================

pub mod value_objects;
pub mod events;
pub mod commands;
pub mod errors;
pub mod aggregate;
pub mod command_handler;

// Re-export for convenience
pub use value_objects::*;
pub use events::*;
pub use commands::*;
pub use errors::*;
pub use aggregate::*;
pub use command_handler::*;
