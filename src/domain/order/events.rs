use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::commands::{DesignChange, HeaderChange};
use super::value_objects::{
    Address, DecorationMethod, DesignSlotId, DesignType, Size, SubmissionNumber,
};

// ============================================================================
// Order Events - Facts recorded against the Order aggregate
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    SalesRepSelected(SalesRepSelected),
    CustomerSelected(CustomerSelected),
    HeaderEdited(HeaderChange),
    DesignTypeChanged(DesignType),
    ReferenceOrderNumberChanged(String),
    DecorationMethodChanged(DecorationMethodChanged),
    DesignEdited {
        slot: DesignSlotId,
        change: DesignChange,
    },
    UpchargesChanged(UpchargeFlags),
    ArtSetupHoursChanged(Decimal),
    LineAdded,
    LineRemoved {
        row: usize,
    },
    SkuSelected(SkuSelected),
    ColorChanged {
        row: usize,
        color: String,
    },
    QuantityChanged {
        row: usize,
        size: Size,
        quantity: u32,
    },
    Submitted(OrderSubmitted),
}

impl OrderEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::SalesRepSelected(_) => "SalesRepSelected",
            OrderEvent::CustomerSelected(_) => "CustomerSelected",
            OrderEvent::HeaderEdited(_) => "HeaderEdited",
            OrderEvent::DesignTypeChanged(_) => "DesignTypeChanged",
            OrderEvent::ReferenceOrderNumberChanged(_) => "ReferenceOrderNumberChanged",
            OrderEvent::DecorationMethodChanged(_) => "DecorationMethodChanged",
            OrderEvent::DesignEdited { .. } => "DesignEdited",
            OrderEvent::UpchargesChanged(_) => "UpchargesChanged",
            OrderEvent::ArtSetupHoursChanged(_) => "ArtSetupHoursChanged",
            OrderEvent::LineAdded => "LineAdded",
            OrderEvent::LineRemoved { .. } => "LineRemoved",
            OrderEvent::SkuSelected(_) => "SkuSelected",
            OrderEvent::ColorChanged { .. } => "ColorChanged",
            OrderEvent::QuantityChanged { .. } => "QuantityChanged",
            OrderEvent::Submitted(_) => "OrderSubmitted",
        }
    }
}

// ============================================================================
// Event Payloads
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SalesRepSelected {
    pub sales_rep: Option<String>,
    pub customer_cleared: bool,
}

/// `shipping` is `None` when the customer was cleared and the address is left as is
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CustomerSelected {
    pub customer: Option<String>,
    pub shipping: Option<Address>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DecorationMethodChanged {
    pub method: DecorationMethod,
    pub cleared_rows: Vec<usize>,
}

/// Snapshot of every per-unit upcharge flag after a change
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct UpchargeFlags {
    pub confetti: bool,
    pub premium_4color: bool,
    pub has_second_design: bool,
    pub design2_premium_4color: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SkuSelected {
    pub row: usize,
    pub sku: String,
    pub brand: String,
    pub description: String,
    pub keep_color: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrderSubmitted {
    pub submission_number: SubmissionNumber,
    pub submitted_at: DateTime<Utc>,
}
