// ============================================================================
// Apparel Order Intake
// ============================================================================
//
// Sales reps fill in a decorated-apparel order; the crate prices it against
// the product catalog, validates it, issues a submission number, exports the
// size grid as a production CSV and records the order and an activity trail.
//
// ============================================================================

pub mod activity;
pub mod catalog;
pub mod config;
pub mod directory;
pub mod domain;
pub mod export;
pub mod lookup;
pub mod metrics;
pub mod pricing;
pub mod store;
pub mod utils;
pub mod validation;
