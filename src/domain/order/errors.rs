use rust_decimal::Decimal;

use super::value_objects::{DecorationMethod, Size};
use crate::export::ExportError;
use crate::store::StoreError;
use crate::validation::ValidationReport;

// ============================================================================
// Order Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Order is already submitted")]
    AlreadySubmitted,

    #[error("Design number must be numeric (decimals allowed, e.g., 78542.02): {0}")]
    InvalidDesignNumber(String),

    #[error("Art setup hours must be a non-negative multiple of 0.5, got {0}")]
    InvalidArtSetupHours(Decimal),

    #[error("Freight must be non-negative, got {0}")]
    NegativeFreight(Decimal),

    #[error("{option} is not available for {}", .method.map_or("an unset decoration method", DecorationMethod::label))]
    OptionNotAvailable {
        option: &'static str,
        method: Option<DecorationMethod>,
    },

    #[error("Second design fields require a second Screenprint design")]
    SecondDesignInactive,

    #[error("Billing address follows shipping while 'same as shipping' is set")]
    BillingFollowsShipping,

    #[error("Grid row {0} does not exist")]
    RowOutOfRange(usize),

    #[error("{reason}")]
    SkuNotAllowed { sku: String, reason: String },

    #[error("Size {size} is not offered for SKU {sku}")]
    SizeUnavailable { sku: String, size: Size },

    #[error("Order has {} blocking validation error(s)", .0.errors.len())]
    ValidationFailed(ValidationReport),

    #[error("Order not found: {0}")]
    NotFound(uuid::Uuid),

    #[error("Order could not be persisted, retry submission: {0}")]
    Persistence(#[from] StoreError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

impl OrderError {
    /// Persistence failures may succeed on a later attempt; everything else is final
    pub fn is_retryable(&self) -> bool {
        matches!(self, OrderError::Persistence(_))
    }
}
