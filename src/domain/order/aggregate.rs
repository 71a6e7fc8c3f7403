use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::commands::{DesignChange, HeaderChange, OrderCommand};
use super::errors::OrderError;
use super::events::*;
use super::value_objects::{
    Decoration, DecorationMethod, DesignSlot, DesignSlotId, OrderHeader, OrderStatus,
    ProductLine, SubmissionNumber,
};
use crate::domain::Aggregate;

static DESIGN_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+(\.[0-9]+)?$").expect("design number pattern"));

/// Empty input is allowed; anything else must look like `78542` or `78542.02`
pub fn is_valid_design_number(input: &str) -> bool {
    input.is_empty() || DESIGN_NUMBER.is_match(input)
}

// ============================================================================
// Order Aggregate - Domain Logic
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    // Identity
    pub id: Uuid,
    pub version: i64,

    // Lifecycle
    pub status: OrderStatus,
    pub submission_number: Option<SubmissionNumber>,
    pub submitted_at: Option<DateTime<Utc>>,

    // Form state
    pub header: OrderHeader,
    pub decoration: Decoration,
    pub grid: Vec<ProductLine>,
}

impl Order {
    /// A fresh order: defaults everywhere and a single placeholder row
    pub fn new(id: Uuid, order_date: NaiveDate) -> Self {
        Self {
            id,
            version: 0,
            status: OrderStatus::Draft,
            submission_number: None,
            submitted_at: None,
            header: OrderHeader::new(order_date),
            decoration: Decoration::default(),
            grid: vec![ProductLine::default()],
        }
    }

    pub fn is_submitted(&self) -> bool {
        self.status == OrderStatus::Submitted
    }

    /// Lines that carry a SKU
    pub fn priced_lines(&self) -> impl Iterator<Item = &ProductLine> {
        self.grid.iter().filter(|line| !line.is_placeholder())
    }

    pub fn total_units(&self) -> u64 {
        self.priced_lines().map(ProductLine::row_total).sum()
    }

    /// Re-check rules that commands enforce, for orders read back from a document or store
    pub fn check_document(&self) -> Result<(), OrderError> {
        let hours = self.decoration.art_setup_hours;
        if !Decoration::is_valid_art_setup_hours(hours) {
            return Err(OrderError::InvalidArtSetupHours(hours));
        }
        if self.header.freight < Decimal::ZERO {
            return Err(OrderError::NegativeFreight(self.header.freight));
        }
        Ok(())
    }

    fn check_row(&self, row: usize) -> Result<(), OrderError> {
        if row < self.grid.len() {
            Ok(())
        } else {
            Err(OrderError::RowOutOfRange(row))
        }
    }

    fn flags(&self) -> UpchargeFlags {
        UpchargeFlags {
            confetti: self.decoration.confetti,
            premium_4color: self.decoration.premium_4color,
            has_second_design: self.decoration.has_second_design,
            design2_premium_4color: self.decoration.design2_premium_4color,
        }
    }

    fn slot_mut(&mut self, slot: DesignSlotId) -> &mut DesignSlot {
        match slot {
            DesignSlotId::First => &mut self.decoration.design1,
            DesignSlotId::Second => &mut self.decoration.design2,
        }
    }

    fn require_method(&self, option: &'static str, method: DecorationMethod) -> Result<(), OrderError> {
        if self.decoration.method == Some(method) {
            Ok(())
        } else {
            Err(OrderError::OptionNotAvailable {
                option,
                method: self.decoration.method,
            })
        }
    }

    fn validate_header_change(&self, change: &HeaderChange) -> Result<(), OrderError> {
        match change {
            HeaderChange::Freight(freight) if *freight < Decimal::ZERO => {
                Err(OrderError::NegativeFreight(*freight))
            }
            HeaderChange::BillingAddress(_) if self.header.billing_same_as_shipping => {
                Err(OrderError::BillingFollowsShipping)
            }
            _ => Ok(()),
        }
    }

    fn apply_header_change(&mut self, change: &HeaderChange) {
        let header = &mut self.header;
        match change {
            HeaderChange::OrderDate(date) => header.order_date = *date,
            HeaderChange::ShipDate(date) => header.ship_date = *date,
            HeaderChange::DropDeadDate(date) => header.drop_dead_date = *date,
            HeaderChange::PoNumber(po) => header.po_number = po.clone(),
            HeaderChange::TaxStatus(status) => header.tax_status = *status,
            HeaderChange::Tags(tags) => header.tags = *tags,
            HeaderChange::DeliveryMethod(method) => header.delivery_method = method.clone(),
            HeaderChange::Freight(freight) => header.freight = *freight,
            HeaderChange::Notes(notes) => header.notes = notes.clone(),
            HeaderChange::ShippingAddress(address) => {
                header.shipping = address.clone();
                if header.billing_same_as_shipping {
                    header.billing = address.clone();
                }
            }
            HeaderChange::BillingAddress(address) => header.billing = address.clone(),
            HeaderChange::BillingSameAsShipping(same) => {
                header.billing_same_as_shipping = *same;
                // Overwrites whatever was typed into billing; nothing is cached
                if *same {
                    header.billing = header.shipping.clone();
                }
            }
        }
    }
}

// ============================================================================
// Aggregate Trait Implementation
// ============================================================================

impl Aggregate for Order {
    type Event = OrderEvent;
    type Command = OrderCommand;
    type Error = OrderError;

    fn apply_event(&mut self, event: &Self::Event) -> Result<(), Self::Error> {
        match event {
            OrderEvent::SalesRepSelected(e) => {
                self.header.sales_rep = e.sales_rep.clone();
                if e.customer_cleared {
                    self.header.customer = None;
                }
            }
            OrderEvent::CustomerSelected(e) => {
                self.header.customer = e.customer.clone();
                if let Some(address) = &e.shipping {
                    self.apply_header_change(&HeaderChange::ShippingAddress(address.clone()));
                }
            }
            OrderEvent::HeaderEdited(change) => self.apply_header_change(change),
            OrderEvent::DesignTypeChanged(design_type) => {
                self.decoration.design_type = *design_type;
            }
            OrderEvent::ReferenceOrderNumberChanged(reference) => {
                self.decoration.reference_order_number = reference.clone();
            }
            OrderEvent::DecorationMethodChanged(e) => {
                let decoration = &mut self.decoration;
                decoration.method = Some(e.method);
                match e.method {
                    DecorationMethod::Embroidery => decoration.premium_4color = false,
                    DecorationMethod::Screenprint => decoration.confetti = false,
                    _ => {
                        decoration.confetti = false;
                        decoration.premium_4color = false;
                    }
                }
                for &row in &e.cleared_rows {
                    if let Some(line) = self.grid.get_mut(row) {
                        line.sku.clear();
                        line.brand.clear();
                        line.description.clear();
                        line.color.clear();
                    }
                }
            }
            OrderEvent::DesignEdited { slot, change } => {
                let design = self.slot_mut(*slot);
                match change {
                    DesignChange::Number(number) => design.number = number.clone(),
                    DesignChange::Location(location) => design.location = location.clone(),
                    DesignChange::Description(text) => design.description = text.clone(),
                    DesignChange::Colors(colors) => design.colors.set_text(colors.clone()),
                    DesignChange::ColorMode(mode) => design.colors.set_mode(*mode),
                }
            }
            OrderEvent::UpchargesChanged(flags) => {
                self.decoration.confetti = flags.confetti;
                self.decoration.premium_4color = flags.premium_4color;
                self.decoration.has_second_design = flags.has_second_design;
                self.decoration.design2_premium_4color = flags.design2_premium_4color;
            }
            OrderEvent::ArtSetupHoursChanged(hours) => {
                self.decoration.art_setup_hours = *hours;
            }
            OrderEvent::LineAdded => self.grid.push(ProductLine::default()),
            OrderEvent::LineRemoved { row } => {
                if *row < self.grid.len() {
                    self.grid.remove(*row);
                }
            }
            OrderEvent::SkuSelected(e) => {
                if let Some(line) = self.grid.get_mut(e.row) {
                    line.sku = e.sku.clone();
                    line.brand = e.brand.clone();
                    line.description = e.description.clone();
                    if !e.keep_color {
                        line.color.clear();
                    }
                }
            }
            OrderEvent::ColorChanged { row, color } => {
                if let Some(line) = self.grid.get_mut(*row) {
                    line.color = color.clone();
                }
            }
            OrderEvent::QuantityChanged { row, size, quantity } => {
                if let Some(line) = self.grid.get_mut(*row) {
                    line.set_quantity(*size, *quantity);
                }
            }
            OrderEvent::Submitted(e) => {
                self.status = OrderStatus::Submitted;
                self.submission_number = Some(e.submission_number);
                self.submitted_at = Some(e.submitted_at);
            }
        }

        self.version += 1;
        Ok(())
    }

    fn handle_command(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        if self.is_submitted() {
            return Err(OrderError::AlreadySubmitted);
        }

        match command {
            OrderCommand::SelectSalesRep { sales_rep, keeps_customer } => {
                let sales_rep = sales_rep
                    .as_deref()
                    .map(str::trim)
                    .filter(|rep| !rep.is_empty())
                    .map(str::to_string);

                Ok(vec![OrderEvent::SalesRepSelected(SalesRepSelected {
                    customer_cleared: !keeps_customer && self.header.customer.is_some(),
                    sales_rep,
                })])
            }

            OrderCommand::SelectCustomer { customer, address } => {
                let customer = customer
                    .as_deref()
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string);

                if customer == self.header.customer {
                    return Ok(vec![]);
                }

                // A new (unlisted) customer starts from a blank shipping address
                let shipping = customer
                    .as_ref()
                    .map(|_| address.clone().unwrap_or_default());

                Ok(vec![OrderEvent::CustomerSelected(CustomerSelected { customer, shipping })])
            }

            OrderCommand::EditHeader(change) => {
                self.validate_header_change(change)?;
                Ok(vec![OrderEvent::HeaderEdited(change.clone())])
            }

            OrderCommand::SetDesignType(design_type) => {
                Ok(vec![OrderEvent::DesignTypeChanged(*design_type)])
            }

            OrderCommand::SetReferenceOrderNumber(reference) => {
                Ok(vec![OrderEvent::ReferenceOrderNumberChanged(reference.trim().to_string())])
            }

            OrderCommand::SetDecorationMethod { method, invalid_rows } => {
                for &row in invalid_rows {
                    self.check_row(row)?;
                }

                Ok(vec![OrderEvent::DecorationMethodChanged(DecorationMethodChanged {
                    method: *method,
                    cleared_rows: invalid_rows.clone(),
                })])
            }

            OrderCommand::EditDesign { slot, change } => {
                if *slot == DesignSlotId::Second && !self.decoration.second_design_active() {
                    return Err(OrderError::SecondDesignInactive);
                }
                if let DesignChange::Number(number) = change {
                    if !is_valid_design_number(number) {
                        return Err(OrderError::InvalidDesignNumber(number.clone()));
                    }
                }

                Ok(vec![OrderEvent::DesignEdited {
                    slot: *slot,
                    change: change.clone(),
                }])
            }

            OrderCommand::SetConfetti(enabled) => {
                if *enabled {
                    self.require_method("Confetti", DecorationMethod::Embroidery)?;
                }

                let mut flags = self.flags();
                flags.confetti = *enabled;
                Ok(vec![OrderEvent::UpchargesChanged(flags)])
            }

            OrderCommand::SetPremiumFourColor { slot, enabled } => {
                let mut flags = self.flags();
                match slot {
                    DesignSlotId::First => {
                        if *enabled {
                            self.require_method("Premium 4-Color", DecorationMethod::Screenprint)?;
                        }
                        flags.premium_4color = *enabled;
                    }
                    DesignSlotId::Second => {
                        if *enabled && !self.decoration.second_design_active() {
                            return Err(OrderError::SecondDesignInactive);
                        }
                        flags.design2_premium_4color = *enabled;
                    }
                }
                Ok(vec![OrderEvent::UpchargesChanged(flags)])
            }

            OrderCommand::SetSecondDesign(enabled) => {
                if *enabled {
                    self.require_method("Second design", DecorationMethod::Screenprint)?;
                }

                let mut flags = self.flags();
                flags.has_second_design = *enabled;
                Ok(vec![OrderEvent::UpchargesChanged(flags)])
            }

            OrderCommand::SetArtSetupHours(hours) => {
                if !Decoration::is_valid_art_setup_hours(*hours) {
                    return Err(OrderError::InvalidArtSetupHours(*hours));
                }
                Ok(vec![OrderEvent::ArtSetupHoursChanged(*hours)])
            }

            OrderCommand::AddLine => Ok(vec![OrderEvent::LineAdded]),

            OrderCommand::RemoveLine { row } => {
                self.check_row(*row)?;
                Ok(vec![OrderEvent::LineRemoved { row: *row }])
            }

            OrderCommand::SelectSku { row, sku, brand, description, offered_colors } => {
                self.check_row(*row)?;
                let current_color = &self.grid[*row].color;

                Ok(vec![OrderEvent::SkuSelected(SkuSelected {
                    row: *row,
                    sku: sku.trim().to_string(),
                    brand: brand.clone(),
                    description: description.clone(),
                    keep_color: !current_color.is_empty() && offered_colors.contains(current_color),
                })])
            }

            OrderCommand::SetColor { row, color } => {
                self.check_row(*row)?;
                Ok(vec![OrderEvent::ColorChanged {
                    row: *row,
                    color: color.trim().to_string(),
                }])
            }

            OrderCommand::SetQuantity { row, size, quantity } => {
                self.check_row(*row)?;
                Ok(vec![OrderEvent::QuantityChanged {
                    row: *row,
                    size: *size,
                    quantity: *quantity,
                }])
            }

            OrderCommand::Submit { submission_number } => {
                Ok(vec![OrderEvent::Submitted(OrderSubmitted {
                    submission_number: *submission_number,
                    submitted_at: Utc::now(),
                })])
            }
        }
    }

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::value_objects::{Address, ColorMode, Size, DESIGNER_PICK_SENTINEL};

    fn order() -> Order {
        Order::new(Uuid::new_v4(), NaiveDate::from_ymd_opt(2026, 3, 2).unwrap())
    }

    fn address(city: &str) -> Address {
        Address {
            line1: "1 Gulf Blvd".into(),
            city: city.into(),
            state: "FL".into(),
            zip: "32541".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_new_order_defaults() {
        let order = order();
        assert_eq!(order.status, OrderStatus::Draft);
        assert_eq!(order.grid.len(), 1);
        assert!(order.grid[0].is_placeholder());
        assert_eq!(order.decoration.method, Some(DecorationMethod::Screenprint));
        assert_eq!(order.total_units(), 0);
    }

    #[test]
    fn test_execute_bumps_version() {
        let mut order = order();
        order.execute(&OrderCommand::AddLine).unwrap();
        order.execute(&OrderCommand::AddLine).unwrap();
        assert_eq!(order.version(), 2);
        assert_eq!(order.grid.len(), 3);
    }

    #[test]
    fn test_design_number_format() {
        assert!(is_valid_design_number(""));
        assert!(is_valid_design_number("78542"));
        assert!(is_valid_design_number("78542.02"));
        assert!(!is_valid_design_number("78542."));
        assert!(!is_valid_design_number("A-100"));
    }

    #[test]
    fn test_invalid_design_number_keeps_prior_value() {
        let mut order = order();
        order
            .execute(&OrderCommand::EditDesign {
                slot: DesignSlotId::First,
                change: DesignChange::Number("1200".into()),
            })
            .unwrap();

        let result = order.execute(&OrderCommand::EditDesign {
            slot: DesignSlotId::First,
            change: DesignChange::Number("12ab".into()),
        });

        assert!(matches!(result, Err(OrderError::InvalidDesignNumber(_))));
        assert_eq!(order.decoration.design1.number, "1200");
    }

    #[test]
    fn test_method_change_resets_exclusive_upcharges() {
        let mut order = order();
        order
            .execute(&OrderCommand::SetPremiumFourColor { slot: DesignSlotId::First, enabled: true })
            .unwrap();
        assert!(order.decoration.premium_4color);

        order
            .execute(&OrderCommand::SetDecorationMethod {
                method: DecorationMethod::Embroidery,
                invalid_rows: vec![],
            })
            .unwrap();
        assert!(!order.decoration.premium_4color);

        order.execute(&OrderCommand::SetConfetti(true)).unwrap();
        assert!(order.decoration.confetti);

        order
            .execute(&OrderCommand::SetDecorationMethod {
                method: DecorationMethod::Applique,
                invalid_rows: vec![],
            })
            .unwrap();
        assert!(!order.decoration.confetti);
        assert!(!order.decoration.premium_4color);
    }

    #[test]
    fn test_confetti_rejected_outside_embroidery() {
        let mut order = order();
        let result = order.execute(&OrderCommand::SetConfetti(true));
        assert!(matches!(result, Err(OrderError::OptionNotAvailable { .. })));
        assert!(!order.decoration.confetti);
    }

    #[test]
    fn test_second_design_fields_require_second_design() {
        let mut order = order();
        let result = order.execute(&OrderCommand::EditDesign {
            slot: DesignSlotId::Second,
            change: DesignChange::Location("Back".into()),
        });
        assert!(matches!(result, Err(OrderError::SecondDesignInactive)));

        order.execute(&OrderCommand::SetSecondDesign(true)).unwrap();
        order
            .execute(&OrderCommand::SetPremiumFourColor { slot: DesignSlotId::Second, enabled: true })
            .unwrap();
        assert!(order.decoration.design2_premium_4color);
    }

    #[test]
    fn test_method_change_clears_illegal_skus_but_keeps_quantities() {
        let mut order = order();
        order
            .execute(&OrderCommand::SelectSku {
                row: 0,
                sku: "TS100".into(),
                brand: "Gildan".into(),
                description: "Tee".into(),
                offered_colors: vec!["Navy".into()],
            })
            .unwrap();
        order.execute(&OrderCommand::SetColor { row: 0, color: "Navy".into() }).unwrap();
        order
            .execute(&OrderCommand::SetQuantity { row: 0, size: Size::M, quantity: 12 })
            .unwrap();

        order
            .execute(&OrderCommand::SetDecorationMethod {
                method: DecorationMethod::LeatherPatches,
                invalid_rows: vec![0],
            })
            .unwrap();

        let line = &order.grid[0];
        assert!(line.is_placeholder());
        assert!(line.color.is_empty());
        assert_eq!(line.quantity(Size::M), 12);
    }

    #[test]
    fn test_sku_change_resets_unoffered_color() {
        let mut order = order();
        order.execute(&OrderCommand::SetColor { row: 0, color: "Navy".into() }).unwrap();
        order
            .execute(&OrderCommand::SelectSku {
                row: 0,
                sku: " TS200 ".into(),
                brand: String::new(),
                description: String::new(),
                offered_colors: vec!["White".into()],
            })
            .unwrap();
        assert_eq!(order.grid[0].sku, "TS200");
        assert_eq!(order.grid[0].color, "");
    }

    #[test]
    fn test_art_setup_hours_must_be_half_hour_steps() {
        let mut order = order();
        assert!(order.execute(&OrderCommand::SetArtSetupHours(Decimal::new(15, 1))).is_ok());
        assert!(matches!(
            order.execute(&OrderCommand::SetArtSetupHours(Decimal::new(125, 2))),
            Err(OrderError::InvalidArtSetupHours(_))
        ));
        assert!(matches!(
            order.execute(&OrderCommand::SetArtSetupHours(Decimal::new(-5, 1))),
            Err(OrderError::InvalidArtSetupHours(_))
        ));
        assert!(matches!(
            order.execute(&OrderCommand::SetArtSetupHours(Decimal::from(1_000_000))),
            Err(OrderError::InvalidArtSetupHours(_))
        ));
        assert_eq!(order.decoration.art_setup_hours, Decimal::new(15, 1));
    }

    #[test]
    fn test_check_document_rejects_out_of_range_art_hours() {
        let mut order = order();
        assert!(order.check_document().is_ok());

        order.decoration.art_setup_hours = Decimal::new(-103, 1);
        assert!(matches!(order.check_document(), Err(OrderError::InvalidArtSetupHours(_))));

        order.decoration.art_setup_hours = Decimal::MAX;
        assert!(matches!(order.check_document(), Err(OrderError::InvalidArtSetupHours(_))));

        order.decoration.art_setup_hours = Decimal::ZERO;
        order.header.freight = Decimal::new(-5, 0);
        assert!(matches!(order.check_document(), Err(OrderError::NegativeFreight(_))));
    }

    #[test]
    fn test_billing_same_as_shipping_overwrites_without_cache() {
        let mut order = order();
        order
            .execute(&OrderCommand::EditHeader(HeaderChange::BillingAddress(address("Mobile"))))
            .unwrap();
        order
            .execute(&OrderCommand::EditHeader(HeaderChange::ShippingAddress(address("Destin"))))
            .unwrap();
        order
            .execute(&OrderCommand::EditHeader(HeaderChange::BillingSameAsShipping(true)))
            .unwrap();
        assert_eq!(order.header.billing.city, "Destin");

        let locked = order.execute(&OrderCommand::EditHeader(HeaderChange::BillingAddress(address("Mobile"))));
        assert!(matches!(locked, Err(OrderError::BillingFollowsShipping)));

        order
            .execute(&OrderCommand::EditHeader(HeaderChange::ShippingAddress(address("Navarre"))))
            .unwrap();
        assert_eq!(order.header.billing.city, "Navarre");

        order
            .execute(&OrderCommand::EditHeader(HeaderChange::BillingSameAsShipping(false)))
            .unwrap();
        assert_eq!(order.header.billing.city, "Navarre");
    }

    #[test]
    fn test_customer_selection_fills_or_clears_shipping() {
        let mut order = order();
        order
            .execute(&OrderCommand::SelectCustomer {
                customer: Some("Beach Club".into()),
                address: Some(address("Destin")),
            })
            .unwrap();
        assert_eq!(order.header.shipping.city, "Destin");

        order
            .execute(&OrderCommand::SelectCustomer {
                customer: Some("Walk-in".into()),
                address: None,
            })
            .unwrap();
        assert_eq!(order.header.customer.as_deref(), Some("Walk-in"));
        assert_eq!(order.header.shipping, Address::default());
    }

    #[test]
    fn test_sales_rep_change_clears_unassigned_customer() {
        let mut order = order();
        order
            .execute(&OrderCommand::SelectCustomer { customer: Some("Beach Club".into()), address: None })
            .unwrap();
        order
            .execute(&OrderCommand::SelectSalesRep { sales_rep: Some("Dana".into()), keeps_customer: false })
            .unwrap();
        assert_eq!(order.header.sales_rep.as_deref(), Some("Dana"));
        assert!(order.header.customer.is_none());
    }

    #[test]
    fn test_designer_pick_through_commands() {
        let mut order = order();
        order
            .execute(&OrderCommand::EditDesign {
                slot: DesignSlotId::First,
                change: DesignChange::ColorMode(ColorMode::DesignerPick),
            })
            .unwrap();
        assert_eq!(order.decoration.design1.colors.text, DESIGNER_PICK_SENTINEL);
    }

    #[test]
    fn test_submitted_order_is_immutable() {
        let mut order = order();
        order
            .execute(&OrderCommand::Submit { submission_number: SubmissionNumber(1001) })
            .unwrap();
        assert!(order.is_submitted());
        assert_eq!(order.submission_number, Some(SubmissionNumber(1001)));
        assert!(matches!(order.execute(&OrderCommand::AddLine), Err(OrderError::AlreadySubmitted)));
    }

    #[test]
    fn test_remove_line_out_of_range() {
        let mut order = order();
        assert!(matches!(
            order.execute(&OrderCommand::RemoveLine { row: 3 }),
            Err(OrderError::RowOutOfRange(3))
        ));
        order.execute(&OrderCommand::RemoveLine { row: 0 }).unwrap();
        assert!(order.grid.is_empty());
    }
}
