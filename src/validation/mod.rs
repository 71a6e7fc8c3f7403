// ============================================================================
// Validation Engine - submission gate
// ============================================================================
//
// Every rule runs on every call; nothing short-circuits. Errors block
// submission, warnings are informational.
//
// ============================================================================

use std::fmt;

use serde::Serialize;

use crate::domain::order::{Decoration, DesignType, Order, MAX_ART_SETUP_HOURS};

/// A single field-labelled finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub field: &'static str,
    pub message: String,
}

impl ValidationIssue {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// No blocking errors; warnings may still be present
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    fn error(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(ValidationIssue::new(field, message));
    }

    fn warning(&mut self, field: &'static str, message: impl Into<String>) {
        self.warnings.push(ValidationIssue::new(field, message));
    }
}

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Check an order before submission
pub fn validate(order: &Order) -> ValidationReport {
    let mut report = ValidationReport::default();
    let header = &order.header;

    // Header
    if blank(&header.po_number) {
        report.error("PO Number", "PO number is required");
    }
    if header.customer.as_deref().map_or(true, blank) {
        report.error("Customer", "Customer is required");
    }

    // Shipping address
    let shipping = &header.shipping;
    if blank(&shipping.line1) {
        report.error("Shipping Address", "Shipping address line 1 is required");
    }
    if blank(&shipping.city) {
        report.error("Shipping City", "Shipping city is required");
    }
    if blank(&shipping.state) || blank(&shipping.zip) {
        report.error("Shipping State/ZIP", "Shipping state and ZIP are required");
    }

    // Products
    let has_product = order.priced_lines().next().is_some();
    if !has_product {
        report.error("Products", "At least one product is required");
    } else if order.total_units() == 0 {
        report.error("Quantities", "Enter a quantity for at least one size");
    }

    // Decoration
    if order.decoration.design_type == DesignType::NewDesign && order.decoration.method.is_none() {
        report.error("Decoration Method", "Decoration method is required for a new design");
    }
    if !Decoration::is_valid_art_setup_hours(order.decoration.art_setup_hours) {
        report.error(
            "Art Setup Hours",
            format!("Art setup hours must be in half-hour steps between 0 and {MAX_ART_SETUP_HOURS}"),
        );
    }

    // Dates
    match header.ship_date {
        Some(ship) if ship < header.order_date => {
            report.error("Ship Date", "Ship date cannot be before the order date");
        }
        Some(_) => {}
        None => report.warning("Ship Date", "Ship date is not set"),
    }
    match header.drop_dead_date {
        Some(drop_dead) => {
            if drop_dead < header.order_date {
                report.error("Drop Dead Date", "Drop dead date cannot be before the order date");
            }
            if header.ship_date.is_some_and(|ship| drop_dead < ship) {
                report.error("Drop Dead Date", "Drop dead date cannot be before the ship date");
            }
        }
        None => report.warning("Drop Dead Date", "Drop dead date is not set"),
    }

    report
}
