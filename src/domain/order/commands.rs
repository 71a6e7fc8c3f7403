use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::value_objects::{
    Address, ColorMode, DecorationMethod, DesignSlotId, DesignType, Size, SubmissionNumber,
    TaxStatus,
};

// ============================================================================
// Order Commands - Represent user intent
// ============================================================================

/// A single header field edit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HeaderChange {
    OrderDate(NaiveDate),
    ShipDate(Option<NaiveDate>),
    DropDeadDate(Option<NaiveDate>),
    PoNumber(String),
    TaxStatus(TaxStatus),
    Tags(bool),
    DeliveryMethod(String),
    Freight(Decimal),
    Notes(String),
    ShippingAddress(Address),
    BillingAddress(Address),
    BillingSameAsShipping(bool),
}

/// A single design-slot field edit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DesignChange {
    Number(String),
    Location(String),
    Description(String),
    Colors(String),
    ColorMode(ColorMode),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OrderCommand {
    SelectSalesRep {
        sales_rep: Option<String>,
        /// Whether the current customer is assigned to the new rep
        keeps_customer: bool,
    },
    SelectCustomer {
        customer: Option<String>,
        /// Directory address when the customer is known; `None` clears shipping
        address: Option<Address>,
    },
    EditHeader(HeaderChange),
    SetDesignType(DesignType),
    SetReferenceOrderNumber(String),
    SetDecorationMethod {
        method: DecorationMethod,
        /// Rows whose SKU is not sold under the new method
        invalid_rows: Vec<usize>,
    },
    EditDesign {
        slot: DesignSlotId,
        change: DesignChange,
    },
    SetConfetti(bool),
    SetPremiumFourColor {
        slot: DesignSlotId,
        enabled: bool,
    },
    SetSecondDesign(bool),
    SetArtSetupHours(Decimal),
    AddLine,
    RemoveLine {
        row: usize,
    },
    SelectSku {
        row: usize,
        sku: String,
        brand: String,
        description: String,
        /// Colors the catalog offers for the SKU
        offered_colors: Vec<String>,
    },
    SetColor {
        row: usize,
        color: String,
    },
    SetQuantity {
        row: usize,
        size: Size,
        quantity: u32,
    },
    Submit {
        submission_number: SubmissionNumber,
    },
}
